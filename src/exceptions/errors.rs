//! Known schema-definition error kinds.

use std::borrow::Cow;
use thiserror::Error;

/// Errors raised while turning type definitions into a GraphQL schema.
///
/// These are the error kinds the panic hook recognises and renders as rich
/// diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error(
        "Unable to determine the type of field `{field_name}` on `{type_name}`. \
         Either annotate it directly, or provide a resolver."
    )]
    MissingFieldAnnotation {
        field_name: Box<str>,
        type_name: Box<str>,
    },
    #[error("Return annotation missing for field `{field_name}`, did you forget to add it?")]
    MissingReturnAnnotation {
        field_name: Box<str>,
        resolver_name: Box<str>,
    },
    #[error(
        "Missing annotation for {} in field `{field_name}`, did you forget to add it?",
        describe_arguments(.arguments)
    )]
    MissingArgumentsAnnotations {
        field_name: Box<str>,
        arguments: Vec<Box<str>>,
    },
}

impl SchemaError {
    /// A field on `type_name` has neither a type annotation nor a resolver.
    pub fn missing_field_annotation(
        field_name: impl Into<Box<str>>,
        type_name: impl Into<Box<str>>,
    ) -> Self {
        Self::MissingFieldAnnotation {
            field_name: field_name.into(),
            type_name: type_name.into(),
        }
    }

    /// The resolver backing `field_name` declares no return type.
    pub fn missing_return_annotation(
        field_name: impl Into<Box<str>>,
        resolver_name: impl Into<Box<str>>,
    ) -> Self {
        Self::MissingReturnAnnotation {
            field_name: field_name.into(),
            resolver_name: resolver_name.into(),
        }
    }

    /// Some resolver arguments of `field_name` are untyped.
    pub fn missing_arguments_annotations<I, S>(field_name: impl Into<Box<str>>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        Self::MissingArgumentsAnnotations {
            field_name: field_name.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Stable identifier for this error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingFieldAnnotation { .. } => "missing-field-annotation",
            Self::MissingReturnAnnotation { .. } => "missing-return-annotation",
            Self::MissingArgumentsAnnotations { .. } => "missing-arguments-annotations",
        }
    }

    /// The definition the error points at, e.g. `Query.abc`.
    #[must_use]
    pub fn subject(&self) -> Cow<'_, str> {
        match self {
            Self::MissingFieldAnnotation {
                field_name,
                type_name,
            } => Cow::Owned(format!("{type_name}.{field_name}")),
            Self::MissingReturnAnnotation { resolver_name, .. } => {
                Cow::Owned(format!("fn {resolver_name}"))
            }
            Self::MissingArgumentsAnnotations { field_name, .. } => Cow::Borrowed(&**field_name),
        }
    }

    /// Short label shown next to the subject.
    #[must_use]
    pub const fn annotation_message(&self) -> &'static str {
        match self {
            Self::MissingFieldAnnotation { .. } => "field missing annotation",
            Self::MissingReturnAnnotation { .. } => "resolver missing return type",
            Self::MissingArgumentsAnnotations { .. } => "arguments missing annotation",
        }
    }

    /// How to fix the definition.
    #[must_use]
    pub fn suggestion(&self) -> String {
        match self {
            Self::MissingFieldAnnotation { field_name, .. } => format!(
                "To fix this error you can add an annotation, like so `{field_name}: String`"
            ),
            Self::MissingReturnAnnotation { resolver_name, .. } => format!(
                "To fix this error you can add a return type, like so `fn {resolver_name}(...) -> String`"
            ),
            Self::MissingArgumentsAnnotations { arguments, .. } => {
                let example = arguments.first().map_or("value", |arg| &**arg);
                format!(
                    "To fix this error you can add an annotation to the {}, like so `{example}: String`",
                    if arguments.len() == 1 {
                        "argument"
                    } else {
                        "arguments"
                    }
                )
            }
        }
    }
}

fn describe_arguments(arguments: &[Box<str>]) -> String {
    match arguments {
        [] => "arguments".to_string(),
        [single] => format!("argument `{single}`"),
        [head @ .., last] => {
            let head = head
                .iter()
                .map(|arg| format!("`{arg}`"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("arguments {head} and `{last}`")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SchemaError;
    use rstest::rstest;

    #[test]
    fn missing_field_annotation_message() {
        let err = SchemaError::missing_field_annotation("abc", "Query");
        assert_eq!(
            err.to_string(),
            "Unable to determine the type of field `abc` on `Query`. \
             Either annotate it directly, or provide a resolver."
        );
        assert_eq!(err.subject(), "Query.abc");
        assert_eq!(err.code(), "missing-field-annotation");
    }

    #[rstest]
    #[case(vec!["a"], "Missing annotation for argument `a` in field `search`")]
    #[case(vec!["a", "b"], "Missing annotation for arguments `a` and `b` in field `search`")]
    #[case(
        vec!["a", "b", "c"],
        "Missing annotation for arguments `a`, `b` and `c` in field `search`"
    )]
    fn missing_arguments_lists_names(#[case] arguments: Vec<&str>, #[case] expected: &str) {
        let err = SchemaError::missing_arguments_annotations("search", arguments);
        assert!(err.to_string().starts_with(expected), "{err}");
    }

    #[test]
    fn suggestion_names_resolver() {
        let err = SchemaError::missing_return_annotation("name", "resolve_name");
        assert!(err.suggestion().contains("fn resolve_name(...) -> String"));
        assert_eq!(err.subject(), "fn resolve_name");
    }
}
