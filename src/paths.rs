//! Path resolution for regsync
//!
//! # Environment Variables
//!
//! - `REGSYNC_STATE_DIR` - Override state directory
//!
//! # Path Resolution Priority
//!
//! For state_dir():
//! 1. `REGSYNC_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/regsync` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\regsync`
//!    - macOS/Linux: `~/.local/state/regsync`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "regsync";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "REGSYNC_STATE_DIR";

/// State file name inside the state directory
pub const STATE_FILE: &str = "state.toml";

/// Get the regsync state directory path
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_NAME);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            let path = local_app_data.join(APP_NAME);
            log::debug!("Using Windows state dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join(APP_NAME);
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Full path of the state file
pub fn state_file() -> Result<PathBuf> {
    Ok(state_dir()?.join(STATE_FILE))
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with `key` set to `value`, restoring the previous value after.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    /// Run `f` with `key` unset, restoring the previous value after.
    fn without_env_var<F, R>(key: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::remove_var(key) };
        let result = f();
        if let Some(v) = original {
            // SAFETY: Tests run in isolation
            unsafe { env::set_var(key, v) };
        }
        result
    }

    #[test]
    fn test_state_dir_env_override() {
        with_env_var(ENV_STATE_DIR, "/custom/regsync/state", || {
            assert_eq!(state_dir().unwrap(), PathBuf::from("/custom/regsync/state"));
            assert_eq!(
                state_file().unwrap(),
                PathBuf::from("/custom/regsync/state/state.toml")
            );
        });
    }

    #[test]
    fn test_state_dir_env_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        with_env_var(ENV_STATE_DIR, "~/regsync-tilde-test", || {
            assert_eq!(state_dir().unwrap(), home.join("regsync-tilde-test"));
        });
    }

    #[test]
    fn test_xdg_state_home() {
        without_env_var(ENV_STATE_DIR, || {
            with_env_var("XDG_STATE_HOME", "/tmp/xdg-state-regsync", || {
                assert_eq!(
                    state_dir().unwrap(),
                    PathBuf::from("/tmp/xdg-state-regsync/regsync")
                );
            });
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand("~/regsync.toml"), home.join("regsync.toml"));
    }

    #[test]
    fn test_expand_with_env_var() {
        with_env_var("REGSYNC_TEST_VAR", "team", || {
            assert_eq!(
                expand("/etc/$REGSYNC_TEST_VAR/regsync.toml"),
                PathBuf::from("/etc/team/regsync.toml")
            );
        });
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        assert_eq!(
            expand("/path/$REGSYNC_UNSET_VAR_12345/file"),
            PathBuf::from("/path/$REGSYNC_UNSET_VAR_12345/file")
        );
    }
}
