//! Schema errors and the panic hook that reports them.

mod errors;
pub mod handler;
#[cfg(feature = "rich")]
pub mod printer;

pub use errors::SchemaError;
pub use handler::{
    DISABLE_RICH_ERRORS_ENV, Dispatch, HookGuard, HookOutcome, HookSettings, dispatch,
    handle_payload, install, install_with,
};
