pub mod cf;
pub mod error;

pub use cf::CfConfig;
pub use error::*;

use std::path::{Path, PathBuf};

/// Environment variable pointing directly at a definition file
pub const ENV_DEFINITION_FILE: &str = "CFINFRA_FILE";

/// Project-local directory holding state and (optionally) definitions
pub const PROJECT_DIR: &str = ".cfinfra";

const CANDIDATES: [&str; 4] = [
    "infra.local.kdl",
    ".infra.local.kdl",
    "infra.kdl",
    ".infra.kdl",
];

/// Find the KDL definition file for a project
///
/// Search order:
/// 1. `CFINFRA_FILE` (explicit path)
/// 2. project root: infra.local.kdl, .infra.local.kdl, infra.kdl, .infra.kdl
/// 3. `<project root>/.cfinfra/` with the same order
pub fn find_definition_file(project_root: &Path) -> Result<PathBuf> {
    if let Ok(path) = std::env::var(ENV_DEFINITION_FILE) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points at missing file {}", ENV_DEFINITION_FILE, path.display());
    }

    for dir in [project_root.to_path_buf(), project_root.join(PROJECT_DIR)] {
        if !dir.is_dir() {
            continue;
        }
        for filename in &CANDIDATES {
            let path = dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    Err(ConfigError::DefinitionNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_find_definition_in_project_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("infra.kdl"), "// test").unwrap();

        temp_env::with_var_unset(ENV_DEFINITION_FILE, || {
            let found = find_definition_file(temp_dir.path()).unwrap();
            assert!(found.ends_with("infra.kdl"));
        });
    }

    #[test]
    #[serial]
    fn test_find_definition_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("infra.kdl"), "// shared").unwrap();
        fs::write(temp_dir.path().join("infra.local.kdl"), "// local").unwrap();

        temp_env::with_var_unset(ENV_DEFINITION_FILE, || {
            let found = find_definition_file(temp_dir.path()).unwrap();
            assert!(found.ends_with("infra.local.kdl"));
        });
    }

    #[test]
    #[serial]
    fn test_find_definition_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_dir = temp_dir.path().join(PROJECT_DIR);
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("infra.kdl"), "// nested").unwrap();

        temp_env::with_var_unset(ENV_DEFINITION_FILE, || {
            let found = find_definition_file(temp_dir.path()).unwrap();
            assert!(found.ends_with(".cfinfra/infra.kdl"));
        });
    }

    #[test]
    #[serial]
    fn test_find_definition_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom = temp_dir.path().join("custom.kdl");
        fs::write(&custom, "// custom").unwrap();

        temp_env::with_var(ENV_DEFINITION_FILE, Some(custom.to_str().unwrap()), || {
            let found = find_definition_file(Path::new("/nonexistent")).unwrap();
            assert_eq!(found, custom);
        });
    }

    #[test]
    #[serial]
    fn test_find_definition_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();

        temp_env::with_var_unset(ENV_DEFINITION_FILE, || {
            let result = find_definition_file(temp_dir.path());
            assert!(matches!(result, Err(ConfigError::DefinitionNotFound)));
        });
    }
}
