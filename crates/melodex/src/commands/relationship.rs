//! `status`, `toggle` and `set` handlers.

use melodex_core::{
    ControllerState, IgnoreReason, RelationshipEngine, RelationshipKey, ToggleAction,
    ToggleController, ToggleOutcome,
};

use crate::cli::{GlobalOpts, SetArgs, TargetArgs};
use crate::error::CliError;
use crate::output::{self, StatusReport};

fn key_of(args: &TargetArgs) -> RelationshipKey {
    RelationshipKey::new(args.kind, args.id.as_str())
}

/// Wait for the attach-time check and return the known status.
async fn settled_status(controller: &ToggleController) -> Result<bool, CliError> {
    match controller.wait_settled().await {
        ControllerState::Ready { status } => Ok(status),
        ControllerState::SignedOut => Err(CliError::SignedOut),
        ControllerState::Error { message } => Err(CliError::CheckFailed {
            key: controller.key().to_string(),
            message,
        }),
        other => Err(CliError::Internal(format!(
            "controller stuck in {} state",
            other.label()
        ))),
    }
}

fn report(key: RelationshipKey, outcome: ToggleOutcome) -> Result<StatusReport, CliError> {
    match outcome {
        ToggleOutcome::Committed { status } => Ok(StatusReport {
            action: Some(ToggleAction::for_status(key.kind, status)),
            key,
            status,
            already: false,
        }),
        ToggleOutcome::AlreadySettled { status } => Ok(StatusReport {
            key,
            status,
            action: None,
            already: true,
        }),
        ToggleOutcome::RolledBack { error, .. } => Err(error.into()),
        ToggleOutcome::Ignored(IgnoreReason::SignedOut) => Err(CliError::SignedOut),
        ToggleOutcome::Ignored(reason) => {
            Err(CliError::Internal(format!("toggle ignored: {reason}")))
        }
    }
}

pub async fn status(
    engine: &RelationshipEngine,
    args: &TargetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let key = key_of(args);
    let controller = engine.attach(key.clone());
    let status = settled_status(&controller).await?;

    let out = output::render_status(
        global,
        &StatusReport {
            key,
            status,
            action: None,
            already: false,
        },
    )?;
    output::print_output(&out);
    Ok(())
}

pub async fn toggle(
    engine: &RelationshipEngine,
    args: &TargetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let key = key_of(args);
    let controller = engine.attach(key.clone());
    settled_status(&controller).await?;

    let outcome = controller.toggle().await;
    tracing::info!(%key, ?outcome, "toggle finished");

    let out = output::render_status(global, &report(key, outcome)?)?;
    output::print_output(&out);
    Ok(())
}

pub async fn set(
    engine: &RelationshipEngine,
    args: &SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let key = key_of(&args.target);
    let controller = engine.attach(key.clone());
    settled_status(&controller).await?;

    let outcome = controller.set(args.state.is_on()).await;
    tracing::info!(%key, ?outcome, "set finished");

    let out = output::render_status(global, &report(key, outcome)?)?;
    output::print_output(&out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use melodex_core::CoreError;

    #[test]
    fn committed_follow_reports_followed() {
        let key = RelationshipKey::follow("daft-punk");
        let report = report(key, ToggleOutcome::Committed { status: true });
        assert!(matches!(
            report,
            Ok(StatusReport {
                action: Some(ToggleAction::Followed),
                status: true,
                already: false,
                ..
            })
        ));
    }

    #[test]
    fn rollback_surfaces_the_error() {
        let key = RelationshipKey::favorite(1_u64);
        let outcome = ToggleOutcome::RolledBack {
            status: false,
            error: CoreError::AuthRequired {
                message: "expired".into(),
            },
        };
        assert!(matches!(
            report(key, outcome),
            Err(CliError::AuthFailed { .. })
        ));
    }
}
