//! Process-wide panic hook rendering schema errors.
//!
//! The hook inspects each panic payload. A [`SchemaError`] is rendered as a
//! rich diagnostic when the renderer is compiled in and
//! `BERRY_DISABLE_RICH_ERRORS` is not truthy; every other panic is handed,
//! untouched, to the hook that was installed before.
//!
//! Settings are passed explicitly to [`handle_payload`], so each branch can
//! be exercised without touching global state. [`install`] reads them from
//! the environment every time a panic is reported.

use std::any::Any;
use std::io::{self, Write};
use std::panic::{self, Location, PanicHookInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::warn;

use super::SchemaError;
use crate::environment;

/// Environment variable disabling rich rendering when set to a truthy value.
pub const DISABLE_RICH_ERRORS_ENV: &str = "BERRY_DISABLE_RICH_ERRORS";

/// Whether the rich renderer was compiled in (the `rich` feature).
pub const RICH_AVAILABLE: bool = cfg!(feature = "rich");

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

// Identifies berry hooks; `TOP_HOOK` is the id of the most recent one still
// installed, 0 when none is.
static NEXT_HOOK_ID: AtomicU64 = AtomicU64::new(1);
static TOP_HOOK: AtomicU64 = AtomicU64::new(0);

/// Conditions consulted each time the hook runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HookSettings {
    /// The rich renderer can be used.
    pub rich_available: bool,
    /// Rich rendering was switched off by the user.
    pub rich_disabled: bool,
}

impl HookSettings {
    /// Snapshot the current process configuration.
    ///
    /// Never waits for the environment lock, so it is safe to call from the
    /// hook while that lock is held.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            rich_available: RICH_AVAILABLE,
            rich_disabled: environment::flag_enabled(DISABLE_RICH_ERRORS_ENV),
        }
    }

    #[must_use]
    pub const fn pretty_enabled(self) -> bool {
        self.rich_available && !self.rich_disabled
    }
}

impl Default for HookSettings {
    fn default() -> Self {
        Self {
            rich_available: RICH_AVAILABLE,
            rich_disabled: false,
        }
    }
}

/// Which path the hook takes for a payload.
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch<'a> {
    Pretty(&'a SchemaError),
    Fallback,
}

/// What the hook did with a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookOutcome {
    /// The rich diagnostic was written.
    Rendered,
    /// The previous hook was called.
    Delegated,
}

/// Decide how a panic payload is reported.
#[must_use]
pub fn dispatch(payload: &(dyn Any + Send), settings: HookSettings) -> Dispatch<'_> {
    match payload.downcast_ref::<SchemaError>() {
        Some(error) if settings.pretty_enabled() => Dispatch::Pretty(error),
        _ => Dispatch::Fallback,
    }
}

/// Report a panic payload, writing rich output to `out` or calling
/// `fallback`.
///
/// `fallback` runs at most once. A rendering failure is logged and falls
/// back as well.
pub fn handle_payload<W, F>(
    payload: &(dyn Any + Send),
    location: Option<&Location<'_>>,
    settings: HookSettings,
    out: W,
    fallback: F,
) -> HookOutcome
where
    W: Write,
    F: FnOnce(),
{
    match dispatch(payload, settings) {
        Dispatch::Pretty(error) => match render(out, error, location) {
            Ok(()) => HookOutcome::Rendered,
            Err(e) => {
                warn!("failed to render {} diagnostic: {e}", error.code());
                fallback();
                HookOutcome::Delegated
            }
        },
        Dispatch::Fallback => {
            fallback();
            HookOutcome::Delegated
        }
    }
}

#[cfg(feature = "rich")]
fn render<W: Write>(
    out: W,
    error: &SchemaError,
    location: Option<&Location<'_>>,
) -> anyhow::Result<()> {
    super::printer::ErrorPrinter::default().write_error(out, error, location)
}

#[cfg(not(feature = "rich"))]
fn render<W: Write>(
    _out: W,
    _error: &SchemaError,
    _location: Option<&Location<'_>>,
) -> anyhow::Result<()> {
    anyhow::bail!("rich rendering is not compiled in")
}

/// Keeps the berry hook installed; dropping it reinstates the previous hook.
///
/// Guards may be dropped in any order. A guard dropped while a newer berry
/// hook sits on top only switches its own hook to plain delegation; the
/// newer guard later restores it, and it then forwards every panic to the
/// hook below.
#[must_use = "dropping the guard uninstalls the hook"]
pub struct HookGuard {
    previous: Arc<PanicHook>,
    active: Arc<AtomicBool>,
    id: u64,
    below: u64,
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        // The hook cannot be swapped from a panicking thread.
        if std::thread::panicking() {
            return;
        }
        if TOP_HOOK
            .compare_exchange(self.id, self.below, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let previous = Arc::clone(&self.previous);
        drop(panic::take_hook());
        panic::set_hook(Box::new(move |info| previous(info)));
    }
}

/// Install the hook, reading [`HookSettings::from_env`] on every panic.
pub fn install() -> HookGuard {
    install_with(HookSettings::from_env)
}

/// Install the hook with a custom settings source.
///
/// The source is called each time a panic is reported. Rich output goes to
/// stderr; all other panics reach the hook that was installed before.
pub fn install_with<S>(settings: S) -> HookGuard
where
    S: Fn() -> HookSettings + Send + Sync + 'static,
{
    let previous: Arc<PanicHook> = Arc::new(panic::take_hook());
    let fallback = Arc::clone(&previous);
    let active = Arc::new(AtomicBool::new(true));
    let enabled = Arc::clone(&active);
    panic::set_hook(Box::new(move |info| {
        if !enabled.load(Ordering::SeqCst) {
            fallback(info);
            return;
        }
        handle_payload(
            info.payload(),
            info.location(),
            settings(),
            io::stderr().lock(),
            || fallback(info),
        );
    }));
    let id = NEXT_HOOK_ID.fetch_add(1, Ordering::SeqCst);
    let below = TOP_HOOK.swap(id, Ordering::SeqCst);
    HookGuard {
        previous,
        active,
        id,
        below,
    }
}
