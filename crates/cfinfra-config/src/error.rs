use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("home directory not found")]
    HomeDirNotFound,

    #[error(
        "Cloud Foundry config not found at {0}\n\
        Run `cf login` first, or point CF_HOME at a directory containing .cf/config.json"
    )]
    CfConfigNotFound(PathBuf),

    #[error(
        "definition file not found. Looked for:\n\
        - project root: infra.local.kdl, .infra.local.kdl, infra.kdl, .infra.kdl\n\
        - ./.cfinfra/ directory\n\
        or set CFINFRA_FILE to an explicit path"
    )]
    DefinitionNotFound,

    #[error("invalid Cloud Foundry config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
