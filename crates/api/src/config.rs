//! Types for use when configuring response cache modules.

use crate::*;

/// helper transcode function
fn tc<S: serde::Serialize, D: serde::de::DeserializeOwned>(
    s: &S,
) -> CacheResult<D> {
    serde_json::from_str(
        &serde_json::to_string(s)
            .map_err(|e| CacheError::config_json("encode", e))?,
    )
    .map_err(|e| CacheError::config_json("decode", e))
}

/// Denotes a type used to configure a specific module.
///
/// A module config is expected to be an object with a single top-level
/// property named after the module, for example:
///
/// ```json
/// { "coreResponseCache": { "retentionS": 60 } }
/// ```
///
/// so that multiple modules can share one [Config] without conflicts.
pub trait ModConfig:
    'static
    + Sized
    + Default
    + std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
{
}

impl<T> ModConfig for T where
    T: 'static
        + Sized
        + Default
        + std::fmt::Debug
        + serde::Serialize
        + serde::de::DeserializeOwned
        + Send
        + Sync
{
}

/// Response cache configuration.
///
/// This is a loosely typed json object. Factories write their defaults
/// into it with [Config::set_module_config] and read their settings back
/// out with [Config::get_module_config].
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config(serde_json::Map<String, serde_json::Value>);

impl Config {
    /// Merge the top-level properties of a module config into this config.
    ///
    /// Refuses to overwrite a property that is already set, so two modules
    /// cannot silently claim the same name.
    pub fn set_module_config<M: ModConfig>(
        &mut self,
        module_config: &M,
    ) -> CacheResult<()> {
        let map: serde_json::Map<String, serde_json::Value> =
            tc(module_config)?;
        for (name, value) in map {
            if self.0.contains_key(&name) {
                return Err(CacheError::ConfigConflict { name });
            }
            self.0.insert(name, value);
        }
        Ok(())
    }

    /// Extract a module config.
    ///
    /// This config may have been loaded from disk and edited by humans,
    /// so the module config types should use `#[serde(default)]` to be
    /// tolerant of missing properties. Extraneous properties are ignored.
    pub fn get_module_config<M: ModConfig>(&self) -> CacheResult<M> {
        tc(&self.0)
    }

    /// Load a config from a json string.
    pub fn from_json(json: &str) -> CacheResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CacheError::config_json("parse", e))
    }

    /// Render this config as pretty-printed json.
    pub fn to_json_pretty(&self) -> CacheResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CacheError::config_json("render", e))
    }
}
