// ── Persisted session token ──
//
// `session.toml` in the platform data dir holds the bearer token between
// runs. `MELODEX_TOKEN` takes precedence and is never written to disk.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ConfigError, home_fallback, project_dirs};

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV: &str = "MELODEX_TOKEN";

#[derive(Debug, Default, Deserialize, Serialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Where the session token is stored.
pub fn session_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share").join("session.toml"),
        |dirs| dirs.data_dir().join("session.toml"),
    )
}

/// Token from `MELODEX_TOKEN`, else from the session file at `path`.
pub fn resolve_token(path: &Path) -> Result<Option<SecretString>, ConfigError> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            debug!("using session token from {TOKEN_ENV}");
            return Ok(Some(SecretString::from(token)));
        }
    }
    load_token(path)
}

/// Token stored at `path`, if any.
pub fn load_token(path: &Path) -> Result<Option<SecretString>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let file: SessionFile = toml::from_str(&contents)?;
    Ok(file
        .token
        .filter(|t| !t.trim().is_empty())
        .map(SecretString::from))
}

/// Store `token` at `path`, readable only by the current user on unix.
pub fn save_token(path: &Path, token: &SecretString) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = SessionFile {
        token: Some(token.expose_secret().to_owned()),
    };
    std::fs::write(path, toml::to_string_pretty(&file)?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Remove the session file. Returns `false` if there was none.
pub fn clear_token(path: &Path) -> Result<bool, ConfigError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("session.toml");

        assert!(load_token(&path).unwrap().is_none());
        save_token(&path, &SecretString::from("abc123".to_string())).unwrap();
        assert_eq!(
            load_token(&path).unwrap().unwrap().expose_secret(),
            "abc123"
        );

        assert!(clear_token(&path).unwrap());
        assert!(!clear_token(&path).unwrap());
        assert!(load_token(&path).unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        save_token(&path, &SecretString::from("abc".to_string())).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn blank_token_counts_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "token = \"  \"\n").unwrap();
        assert!(load_token(&path).unwrap().is_none());
    }
}
