//! Process-wide environment helpers.
//!
//! The panic hook consults `BERRY_DISABLE_RICH_ERRORS` every time it runs
//! while tests flip that variable, so reads and writes are serialised
//! through a shared mutex.

use std::env;
use std::ffi::OsStr;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError, TryLockError};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

// A poisoned lock still guards nothing but `()`.
fn lock() -> MutexGuard<'static, ()> {
    env_lock().lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read an environment variable without waiting for the global lock.
///
/// When the lock is busy the value is read unguarded. The panic hook uses
/// this: a panic raised while the lock is held, on this thread or another,
/// must not block the report of that panic.
#[must_use]
pub fn var_nonblocking<K: AsRef<OsStr>>(key: K) -> Option<String> {
    let _guard = match env_lock().try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    };
    env::var(key).ok()
}

/// Set an environment variable while holding the global lock.
pub fn set_var<K: AsRef<OsStr>, V: AsRef<OsStr>>(key: K, value: V) {
    let _guard = lock();
    // SAFETY: the mutex serialises access to the unsynchronised std env calls.
    unsafe { env::set_var(key, value) };
}

/// Remove an environment variable while holding the global lock.
pub fn remove_var<K: AsRef<OsStr>>(key: K) {
    let _guard = lock();
    // SAFETY: the mutex serialises access to the unsynchronised std env calls.
    unsafe { env::remove_var(key) };
}

/// Read an environment variable while holding the global lock.
///
/// # Errors
///
/// Returns [`env::VarError`] when the variable is unset or contains invalid
/// Unicode.
pub fn var<K: AsRef<OsStr>>(key: K) -> Result<String, env::VarError> {
    let _guard = lock();
    env::var(key)
}

/// Run `op` while the environment mutex is held.
pub fn with_lock<T, F>(op: F) -> T
where
    F: FnOnce() -> T,
{
    let _guard = lock();
    op()
}

/// Interpret a boolean-like environment value.
///
/// `1`, `true`, `yes` and `on` are truthy, ignoring case and surrounding
/// whitespace. Everything else, including the empty string, is falsy.
///
/// # Examples
///
/// ```
/// use berry::environment::is_truthy;
/// assert!(is_truthy(" TRUE "));
/// assert!(!is_truthy("0"));
/// ```
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Return `true` when `key` is set to a truthy value.
///
/// Never blocks; see [`var_nonblocking`].
#[must_use]
pub fn flag_enabled<K: AsRef<OsStr>>(key: K) -> bool {
    var_nonblocking(key).is_some_and(|value| is_truthy(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serial_test::serial;

    #[rstest]
    #[case("1", true)]
    #[case("true", true)]
    #[case("True", true)]
    #[case(" yes\n", true)]
    #[case("on", true)]
    #[case("0", false)]
    #[case("false", false)]
    #[case("", false)]
    #[case("enabled", false)]
    fn truthy_values(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_truthy(value), expected);
    }

    #[test]
    #[serial]
    fn flag_enabled_reads_current_value() {
        let key = "BERRY_ENV_FLAG_TEST";
        set_var(key, "yes");
        assert!(flag_enabled(key));
        set_var(key, "no");
        assert!(!flag_enabled(key));
        remove_var(key);
        assert!(!flag_enabled(key));
    }

    #[test]
    #[serial]
    fn flag_enabled_does_not_wait_for_held_lock() {
        let key = "BERRY_ENV_HELD_LOCK_TEST";
        set_var(key, "on");
        let seen = with_lock(|| flag_enabled(key));
        assert!(seen);
        remove_var(key);
    }

    #[test]
    #[serial]
    fn poisoned_lock_is_still_usable() {
        let result = std::panic::catch_unwind(|| with_lock::<(), _>(|| panic!("poison the lock")));
        assert!(result.is_err());
        let key = "BERRY_ENV_POISON_TEST";
        set_var(key, "1");
        assert!(flag_enabled(key));
        remove_var(key);
    }

    #[test]
    #[serial]
    fn with_lock_allows_scoped_access() {
        let key = "BERRY_ENV_HELPER_LOCK_TEST";
        let snapshot = with_lock(|| {
            // SAFETY: `with_lock` holds the guard for this closure.
            unsafe { env::set_var(key, "locked") };
            env::var(key).ok()
        });
        assert_eq!(snapshot.as_deref(), Some("locked"));
        remove_var(key);
    }
}
