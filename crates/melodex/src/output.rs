//! Output formatting: plain text or JSON.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;

use melodex_core::{RelationshipKey, ToggleAction};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// One relationship's status, as printed by every relationship command.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub key: RelationshipKey,
    pub status: bool,
    /// What the command did; absent for `status`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ToggleAction>,
    /// `true` when the server already held the requested state.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already: bool,
}

impl StatusReport {
    fn plain(&self, color: bool) -> String {
        let noun = self.key.kind.entity_noun();
        let state = if self.status { "on" } else { "off" };
        let state = match (color, self.status) {
            (false, _) => state.to_string(),
            (true, true) => state.green().bold().to_string(),
            (true, false) => state.dimmed().to_string(),
        };

        let mut line = format!("{} {noun} {}: {state}", self.key.kind, self.key.id);
        if let Some(action) = self.action {
            line.push_str(&format!(" ({action})"));
        }
        if self.already {
            line.push_str(" (already set)");
        }
        line
    }
}

/// Render `report` in the selected format.
pub fn render_status(global: &GlobalOpts, report: &StatusReport) -> Result<String, CliError> {
    match global.output {
        OutputFormat::Plain => Ok(report.plain(should_color(global.color))),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// Render any serializable value; `plain` supplies the text form.
pub fn render_value<T: Serialize>(
    global: &GlobalOpts,
    value: &T,
    plain: impl FnOnce(&T) -> String,
) -> Result<String, CliError> {
    match global.output {
        OutputFormat::Plain => Ok(plain(value)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
    }
}

/// Print rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_report_without_color() {
        let report = StatusReport {
            key: RelationshipKey::follow(3_u64),
            status: true,
            action: Some(ToggleAction::Followed),
            already: false,
        };
        assert_eq!(report.plain(false), "follow artist 3: on (followed)");
    }

    #[test]
    fn json_report_skips_empty_fields() {
        let report = StatusReport {
            key: RelationshipKey::like(9_u64),
            status: false,
            action: None,
            already: false,
        };
        let json = serde_json::to_value(&report).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({ "key": { "kind": "like", "id": 9 }, "status": false })
        );
    }
}
