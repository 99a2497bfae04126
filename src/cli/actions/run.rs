use crate::cli::actions::{redirect, register, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Redirect(args) => redirect::execute(args).await,
        Action::Register(args) => register::execute(args).await,
    }
}
