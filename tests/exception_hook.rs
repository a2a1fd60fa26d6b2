//! Behavioural tests for the installed panic hook.
//!
//! A recording hook stands in for the default one so each test can observe
//! whether a panic was rendered by berry or delegated. The hook is
//! process-wide, hence `#[serial]`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use berry::SchemaError;
use berry::environment;
use berry::exceptions::{DISABLE_RICH_ERRORS_ENV, HookSettings, install, install_with};
use berry::test_utils::ScopedEnv;
use rstest::rstest;
use serial_test::serial;

static DELEGATED: AtomicUsize = AtomicUsize::new(0);

/// Install a hook counting the panics it receives, returning a reset guard.
struct RecordingHook;

impl RecordingHook {
    fn install() -> Self {
        DELEGATED.store(0, Ordering::SeqCst);
        panic::set_hook(Box::new(|_| {
            DELEGATED.fetch_add(1, Ordering::SeqCst);
        }));
        Self
    }

    fn delegated(&self) -> usize {
        DELEGATED.load(Ordering::SeqCst)
    }
}

impl Drop for RecordingHook {
    fn drop(&mut self) {
        drop(panic::take_hook());
    }
}

fn raise<P: Send + 'static>(payload: P) {
    let result = panic::catch_unwind::<_, ()>(AssertUnwindSafe(move || panic::panic_any(payload)));
    assert!(result.is_err());
}

fn settings(rich_available: bool, rich_disabled: bool) -> HookSettings {
    HookSettings {
        rich_available,
        rich_disabled,
    }
}

#[cfg(feature = "rich")]
#[test]
#[serial]
fn schema_errors_are_rendered() {
    let recorder = RecordingHook::install();
    let guard = install_with(|| settings(true, false));
    raise(SchemaError::missing_field_annotation("abc", "Query"));
    raise(SchemaError::missing_return_annotation("abc", "resolver"));
    drop(guard);
    assert_eq!(recorder.delegated(), 0);
}

#[test]
#[serial]
fn other_panics_reach_previous_hook() {
    let recorder = RecordingHook::install();
    let guard = install_with(|| settings(true, false));
    raise("plain message");
    raise(String::from("formatted message"));
    raise(std::io::Error::other("abc"));
    drop(guard);
    assert_eq!(recorder.delegated(), 3);
}

#[test]
#[serial]
fn schema_errors_are_delegated_without_renderer() {
    let recorder = RecordingHook::install();
    let guard = install_with(|| settings(false, false));
    raise(SchemaError::missing_field_annotation("abc", "Query"));
    drop(guard);
    assert_eq!(recorder.delegated(), 1);
}

#[rstest]
#[case("1")]
#[case("true")]
#[case(" On ")]
#[serial]
fn env_var_disables_rendering(#[case] value: &str) {
    let _env = ScopedEnv::set(DISABLE_RICH_ERRORS_ENV, value);
    let recorder = RecordingHook::install();
    let guard = install();
    raise(SchemaError::missing_arguments_annotations("add", ["a", "b"]));
    drop(guard);
    assert_eq!(recorder.delegated(), 1);
}

#[test]
#[serial]
fn dropping_guard_restores_previous_hook() {
    let recorder = RecordingHook::install();
    drop(install_with(|| settings(true, false)));
    raise(SchemaError::missing_field_annotation("abc", "Query"));
    assert_eq!(recorder.delegated(), 1);
}

#[test]
#[serial]
fn panic_while_env_lock_is_held_is_reported() {
    let recorder = RecordingHook::install();
    let guard = install();
    let (done, finished) = mpsc::channel();
    thread::spawn(move || {
        let result = panic::catch_unwind(|| {
            environment::with_lock::<(), _>(|| panic!("env lock held"));
        });
        let _ = done.send(result.is_err());
    });
    let panicked = finished
        .recv_timeout(Duration::from_secs(10))
        .expect("hook returned while the env lock was held");
    assert!(panicked);
    drop(guard);
    assert_eq!(recorder.delegated(), 1);
}

#[cfg(feature = "rich")]
#[test]
#[serial]
fn guards_dropped_out_of_order_leave_newer_hook_in_place() {
    let recorder = RecordingHook::install();
    let older = install_with(|| settings(true, false));
    let newer = install_with(|| settings(true, false));

    drop(older);
    raise(SchemaError::missing_field_annotation("abc", "Query"));
    assert_eq!(recorder.delegated(), 0);

    drop(newer);
    raise(SchemaError::missing_field_annotation("abc", "Query"));
    assert_eq!(recorder.delegated(), 1);
}

#[cfg(feature = "rich")]
#[test]
#[serial]
fn guards_dropped_in_order_restore_each_previous_hook() {
    let recorder = RecordingHook::install();
    let older = install_with(|| settings(true, false));
    let newer = install_with(|| settings(true, false));

    drop(newer);
    raise(SchemaError::missing_field_annotation("abc", "Query"));
    assert_eq!(recorder.delegated(), 0);

    drop(older);
    raise(SchemaError::missing_field_annotation("abc", "Query"));
    assert_eq!(recorder.delegated(), 1);
}
