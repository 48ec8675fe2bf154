//! `login` and `logout` handlers.

use std::io::{self, BufRead, IsTerminal};

use secrecy::SecretString;
use serde::Serialize;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct SessionReport {
    signed_in: bool,
    path: String,
}

/// Token from `--token`, else the first line of stdin.
fn read_token(args: &LoginArgs) -> Result<String, CliError> {
    let token = if let Some(ref token) = args.token {
        token.clone()
    } else {
        if io::stdin().is_terminal() {
            eprintln!("Paste your session token and press Enter:");
        }
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line
    };

    let token = token.trim();
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(token.to_owned())
}

pub fn login(args: &LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let token = SecretString::from(read_token(args)?);
    let path = melodex_config::session_path();
    melodex_config::save_token(&path, &token)?;
    tracing::info!(path = %path.display(), "session token stored");

    let report = SessionReport {
        signed_in: true,
        path: path.display().to_string(),
    };
    let out = output::render_value(global, &report, |r| format!("Signed in ({})", r.path))?;
    output::print_output(&out);
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let path = melodex_config::session_path();
    let removed = melodex_config::clear_token(&path)?;

    let report = SessionReport {
        signed_in: false,
        path: path.display().to_string(),
    };
    let out = output::render_value(global, &report, |_| {
        if removed {
            "Signed out".to_string()
        } else {
            "No stored session".to_string()
        }
    })?;
    output::print_output(&out);

    if std::env::var_os(melodex_config::TOKEN_ENV).is_some() {
        eprintln!(
            "note: {} is still set and will keep you signed in",
            melodex_config::TOKEN_ENV
        );
    }
    Ok(())
}
