//! Test utilities used across integration and unit tests.
//!
//! Rendered diagnostics carry terminal styling, and the panic hook reads
//! its disable flag from the process environment. These helpers normalise
//! the former and scope changes to the latter.

use std::ffi::{OsStr, OsString};

use crate::environment;

/// Remove ANSI escape sequences from a string.
///
/// # Examples
///
/// ```
/// use berry::test_utils::strip_ansi_codes;
/// let coloured = "\x1b[1merror\x1b[0m: boom";
/// assert_eq!(strip_ansi_codes(coloured), "error: boom");
/// ```
#[must_use]
pub fn strip_ansi_codes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\x1b' {
            out.push(ch);
            continue;
        }
        // CSI sequences end with a byte in `@`..=`~`.
        if chars.next() == Some('[') {
            chars.by_ref().find(|c| ('@'..='~').contains(c));
        }
    }
    out
}

/// Set an environment variable through the shared environment lock.
pub fn set_var<K: AsRef<OsStr>, V: AsRef<OsStr>>(key: K, value: V) {
    environment::set_var(key, value);
}

/// Remove an environment variable through the shared environment lock.
pub fn remove_var<K: AsRef<OsStr>>(key: K) {
    environment::remove_var(key);
}

/// Sets an environment variable for the guard's lifetime.
///
/// The previous value (or its absence) is restored on drop. Tests using the
/// guard must still run `#[serial]`, since the environment is process-wide.
pub struct ScopedEnv {
    key: OsString,
    previous: Option<OsString>,
}

impl ScopedEnv {
    /// Set `key` to `value`, remembering the prior state.
    pub fn set(key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        let key = key.as_ref().to_os_string();
        let previous = environment::with_lock(|| std::env::var_os(&key));
        set_var(&key, value);
        Self { key, previous }
    }

    /// Remove `key`, remembering the prior state.
    pub fn unset(key: impl AsRef<OsStr>) -> Self {
        let key = key.as_ref().to_os_string();
        let previous = environment::with_lock(|| std::env::var_os(&key));
        remove_var(&key);
        Self { key, previous }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => set_var(&self.key, value),
            None => remove_var(&self.key),
        }
    }
}
