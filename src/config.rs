//! Configuration loading for `berry serve`.

use log::debug;
use ortho_config::load_and_merge_subcommand_for;

use crate::BerryError;
use crate::cli_args::ServeArgs;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "BERRY_CONFIG_PATH";

/// Merge `cli` with the `[cmds.serve]` configuration section and the
/// `BERRYCMDS_SERVE_*` environment variables. Command-line values win.
///
/// # Errors
///
/// Returns [`BerryError::Config`] when a configuration source cannot be read
/// or does not match [`ServeArgs`].
pub fn load_serve_args(cli: &ServeArgs) -> Result<ServeArgs, BerryError> {
    let merged = load_and_merge_subcommand_for::<ServeArgs>(cli)?;
    debug!("serve configuration: {merged:?}");
    Ok(merged)
}
