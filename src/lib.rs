pub mod applicator;
pub mod bootstrap;
pub mod catalog;
pub mod cli;
pub mod color;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod resolver;
pub use error::{AppError, AppResult};

/// Entrypoint used by the `campus-theme` binary.
pub fn run(cli: cli::Cli) -> AppResult<()> {
    logging::init();
    tracing::debug!(command = ?cli.command, "starting campus-theme");
    cli::run(cli)
}
