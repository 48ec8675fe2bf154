//! Command handlers.

pub mod config_cmd;
pub mod relationship;
pub mod session;

use melodex_core::RelationshipEngine;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a network-backed command to its handler.
pub async fn dispatch(
    cmd: Command,
    engine: &RelationshipEngine,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => relationship::status(engine, &args, global).await,
        Command::Toggle(args) => relationship::toggle(engine, &args, global).await,
        Command::Set(args) => relationship::set(engine, &args, global).await,
        Command::Config(_) | Command::Login(_) | Command::Logout | Command::Completions(_) => {
            Err(CliError::Internal("command does not use the engine".into()))
        }
    }
}
