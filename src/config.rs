use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::admin::DEFAULT_LIST_PER_PAGE;
use crate::storage::{DeletePolicy, StoreOptions};

/// Contents of `learning-records.toml`; every key is optional
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RecordsConfig {
    pub database: Option<String>,
    pub delete_policy: Option<DeletePolicy>,
    pub enforce_batch_dependency: Option<bool>,
    pub list_per_page: Option<usize>,
}

impl RecordsConfig {
    /// The config `init` writes: every key spelled out with its default
    pub fn with_defaults(database: &Path) -> Self {
        let options = StoreOptions::default();
        Self {
            database: Some(database.display().to_string()),
            delete_policy: Some(options.delete_policy),
            enforce_batch_dependency: Some(options.enforce_batch_dependency),
            list_per_page: Some(DEFAULT_LIST_PER_PAGE),
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        let defaults = StoreOptions::default();
        StoreOptions {
            delete_policy: self.delete_policy.unwrap_or(defaults.delete_policy),
            enforce_batch_dependency: self
                .enforce_batch_dependency
                .unwrap_or(defaults.enforce_batch_dependency),
        }
    }

    pub fn list_per_page(&self) -> usize {
        self.list_per_page.unwrap_or(DEFAULT_LIST_PER_PAGE).max(1)
    }

    /// Database path, relative paths resolved against `base`
    pub fn database_path(&self, base: &Path) -> PathBuf {
        match &self.database {
            Some(db) => {
                let path = PathBuf::from(db);
                if path.is_absolute() {
                    path
                } else {
                    base.join(path)
                }
            }
            None => default_database_path_in(base),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("learning-records.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".learning-records").join("records.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RecordsConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RecordsConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RecordsConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
