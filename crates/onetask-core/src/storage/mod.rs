pub mod task_db;

pub use task_db::TaskDb;

use std::path::PathBuf;

use crate::error::{CoreError, StoreError};

/// Returns `~/.config/onetask[-dev]/` based on ONETASK_ENV.
///
/// Set ONETASK_ENV=dev to use a development data directory, or
/// ONETASK_DATA_DIR to an explicit path to bypass the convention entirely
/// (used by the E2E tests to isolate their database).
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let dir = if let Some(dir) = std::env::var_os("ONETASK_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");

        let env = std::env::var("ONETASK_ENV").unwrap_or_else(|_| "production".to_string());

        if env == "dev" {
            base_dir.join("onetask-dev")
        } else {
            base_dir.join("onetask")
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| {
        CoreError::Store(StoreError::QueryFailed(format!(
            "cannot create data directory {}: {e}",
            dir.display()
        )))
    })?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_data_dir_overrides_convention() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("isolated");

        std::env::set_var("ONETASK_DATA_DIR", &target);
        let resolved = data_dir();
        std::env::remove_var("ONETASK_DATA_DIR");

        assert_eq!(resolved.unwrap(), target);
        assert!(target.is_dir());
    }
}
