use crate::parser;
use cfinfra_cloud::{GlobalState, ProviderState, ResourceSet, StateLock, StateManager};
use cfinfra_cloudfoundry::{CloudFoundryProvider, PROVIDER_NAME};
use cfinfra_config::CfConfig;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Definitions and state location of one project directory
pub struct Project {
    pub root: PathBuf,
    pub definition_file: PathBuf,
    pub resources: ResourceSet,
}

impl Project {
    /// Locate and parse the definition file
    ///
    /// `file` wins over discovery in `root`.
    pub fn load(root: &Path, file: Option<&Path>) -> anyhow::Result<Self> {
        let definition_file = match file {
            Some(path) => path.to_path_buf(),
            None => cfinfra_config::find_definition_file(root)?,
        };
        tracing::debug!("Loading definitions from {}", definition_file.display());

        let resources = parser::parse_definition_file(&definition_file)?;
        Ok(Self {
            root: root.to_path_buf(),
            definition_file,
            resources,
        })
    }

    pub fn state_manager(&self) -> StateManager {
        StateManager::new(&self.root)
    }

    pub fn print_header(&self) {
        println!(
            "Definitions: {}",
            self.definition_file.display().to_string().cyan()
        );
    }
}

/// Provider connected with the cf CLI credentials
pub fn connect() -> anyhow::Result<CloudFoundryProvider> {
    let config = CfConfig::load()?;
    if !config.has_token() {
        anyhow::bail!("no access token found, run `cf login` or set CF_ACCESS_TOKEN");
    }
    Ok(CloudFoundryProvider::from_config(&config)?)
}

/// Locked state plus this provider's slice of it
pub struct LockedState {
    pub manager: StateManager,
    pub global: GlobalState,
    pub provider: ProviderState,
    lock: StateLock,
}

impl LockedState {
    pub async fn acquire(manager: StateManager) -> anyhow::Result<Self> {
        let lock = manager.acquire_lock().await?;
        let global = manager.load().await?;
        let provider = global.provider_state(PROVIDER_NAME);
        Ok(Self {
            manager,
            global,
            provider,
            lock,
        })
    }

    /// Write the provider slice back if it changed and release the lock
    pub async fn save(mut self) -> anyhow::Result<()> {
        if self
            .global
            .set_provider_state(PROVIDER_NAME, &self.provider)
        {
            self.manager.save(&self.global).await?;
        } else {
            tracing::debug!("State unchanged, keeping serial {}", self.global.serial);
        }
        self.lock.release().await?;
        Ok(())
    }
}
