//! Application service — configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::BerthConfig;

/// Load configuration and check every setting.
///
/// # Errors
///
/// Returns an error if the stored file cannot be read or parsed, or holds a
/// value `config set` would reject.
pub fn load_config(store: &impl ConfigStore) -> Result<BerthConfig> {
    let config = store.load()?;
    if let Err(err) = config.validate() {
        let path = store.path()?;
        return Err(err.context(format!("invalid configuration in {}", path.display())));
    }
    Ok(config)
}

/// Save configuration.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_config(store: &impl ConfigStore, config: &BerthConfig) -> Result<()> {
    store.save(config)
}

/// Validate and persist one setting, returning the updated configuration.
///
/// # Errors
///
/// Returns an error if the key or value is invalid, or persistence fails.
/// Nothing is written when validation fails.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<BerthConfig> {
    let mut config = store.load()?;
    config.set(key, value)?;
    save_config(store, &config)?;
    Ok(config)
}
