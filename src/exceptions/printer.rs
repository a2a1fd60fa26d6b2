//! Rich rendering of schema errors.
//!
//! Diagnostics are composed as markdown and rendered with `termimad`.
//! Composition is separate from rendering so the text can be checked
//! without styling.

use std::io::Write;
use std::panic::Location;

use termimad::MadSkin;

use super::SchemaError;

/// Compose the markdown diagnostic for `error`.
///
/// `location` is where the error surfaced, typically the panic site.
#[must_use]
pub fn compose(error: &SchemaError, location: Option<&Location<'_>>) -> String {
    let mut text = format!("**error**: {error}\n\n");
    if let Some(location) = location {
        text.push_str(&format!(
            "*at {}:{}:{}*\n\n",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    text.push_str(&format!(
        "* `{}` {}\n\n",
        error.subject(),
        error.annotation_message()
    ));
    text.push_str(&error.suggestion());
    text.push_str(&format!("\n\nerror code: `{}`\n", error.code()));
    text
}

/// Renders [`SchemaError`]s with a `termimad` skin.
#[derive(Default)]
pub struct ErrorPrinter {
    skin: MadSkin,
}

impl ErrorPrinter {
    /// Use `skin` instead of the default styling.
    #[must_use]
    pub fn new(skin: MadSkin) -> Self {
        Self { skin }
    }

    /// Write the rendered diagnostic for `error` to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error when writing to `out` fails.
    pub fn write_error<W: Write>(
        &self,
        mut out: W,
        error: &SchemaError,
        location: Option<&Location<'_>>,
    ) -> anyhow::Result<()> {
        let text = compose(error, location);
        self.skin
            .write_text_on(&mut out, &text)
            .map_err(anyhow::Error::from)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}

/// Print `error` to stderr with the default skin.
///
/// # Errors
///
/// Returns an error when stderr cannot be written.
pub fn print_error(error: &SchemaError, location: Option<&Location<'_>>) -> anyhow::Result<()> {
    ErrorPrinter::default().write_error(std::io::stderr().lock(), error, location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::strip_ansi_codes;

    #[test]
    fn compose_includes_location_and_suggestion() {
        let err = SchemaError::missing_field_annotation("abc", "Query");
        let text = compose(&err, Some(Location::caller()));
        assert!(text.starts_with("**error**: Unable to determine the type of field `abc`"));
        assert!(text.contains("*at src/exceptions/printer.rs:"));
        assert!(text.contains("`Query.abc` field missing annotation"));
        assert!(text.contains("like so `abc: String`"));
        assert!(text.ends_with("error code: `missing-field-annotation`\n"));
    }

    #[test]
    fn compose_without_location() {
        let err = SchemaError::missing_return_annotation("name", "resolve_name");
        let text = compose(&err, None);
        assert!(!text.contains("*at "));
    }

    #[test]
    fn write_error_renders_markdown() {
        let err = SchemaError::missing_field_annotation("abc", "Query");
        let mut buf = Vec::new();
        ErrorPrinter::default()
            .write_error(&mut buf, &err, None)
            .expect("render error");
        let out = strip_ansi_codes(&String::from_utf8(buf).expect("utf8"));
        assert!(out.contains("error"));
        assert!(!out.contains("**error**"));
        assert!(out.contains("missing-field-annotation"));
        assert!(out.contains("Query.abc"));
    }

    #[test]
    fn unstyled_skin_writes_plain_text() {
        let err = SchemaError::missing_return_annotation("name", "resolve_name");
        let mut buf = Vec::new();
        ErrorPrinter::new(MadSkin::no_style())
            .write_error(&mut buf, &err, Some(Location::caller()))
            .expect("render error");
        let out = String::from_utf8(buf).expect("utf8");
        assert_eq!(strip_ansi_codes(&out), out);
        assert!(out.contains("resolve_name"));
        assert!(out.contains("src/exceptions/printer.rs"));
    }

    #[test]
    fn print_error_writes_to_stderr() {
        let err = SchemaError::missing_field_annotation("abc", "Query");
        assert!(print_error(&err, None).is_ok());
    }
}
