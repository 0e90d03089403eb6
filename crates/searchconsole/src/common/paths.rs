//! Path Utilities
//!
//! Default locations under `~/.searchconsole/`.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Base directory (`~/.searchconsole/`)
pub fn searchconsole_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config("could not determine home directory".to_string()))?;
    Ok(home.join(".searchconsole"))
}

/// A path within the base directory
pub fn searchconsole_path(relative_path: &str) -> Result<PathBuf> {
    Ok(searchconsole_dir()?.join(relative_path))
}

/// Settings file
pub fn config_path() -> Result<PathBuf> {
    searchconsole_path("config.json")
}

/// Default location for serialized user credentials
pub fn credentials_path() -> Result<PathBuf> {
    searchconsole_path("credentials.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_base_dir() {
        let base = searchconsole_dir().unwrap();
        assert!(base.ends_with(".searchconsole"));
        assert_eq!(config_path().unwrap(), base.join("config.json"));
        assert_eq!(credentials_path().unwrap().parent(), Some(base.as_path()));
    }
}
