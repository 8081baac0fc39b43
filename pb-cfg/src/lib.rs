//! Configuration knobs for `pb` itself.
//!
//! These tune how the build system behaves, e.g. how a command line gets split into flags. They
//! are _not_ the build settings that rules declare, those live in `pb-settings`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use compact_str::CompactString;
use pb_ore::assert_none;

/// A single configuration knob.
pub struct Config<V: ConfigDefault> {
    name: &'static str,
    desc: &'static str,
    default: V,
}

impl<V: ConfigDefault> Config<V> {
    /// Define a new [`Config`] with a default value.
    pub const fn new(name: &'static str, desc: &'static str, default: V) -> Self {
        Config {
            name,
            desc,
            default,
        }
    }

    /// Name this [`Config`] is registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Read the value of this [`Config`] from the provided [`ConfigSet`].
    ///
    /// # Panics
    /// * If this [`Config`] was never registered with the [`ConfigSetBuilder`].
    pub fn read(&self, set: &ConfigSet) -> V::Stored {
        let Some(entry) = set.configs.get(self.name) else {
            panic!("tried to read unregistered config {}", self.name);
        };
        let value = entry.value.read().expect("config lock poisoned");
        V::from_value(&value)
    }
}

/// A thread-safe shareable set of [`Config`]s.
///
/// Clones share values, so an update through one clone is visible from all of them.
#[derive(Clone, Debug)]
pub struct ConfigSet {
    configs: Arc<BTreeMap<CompactString, ConfigSetEntry>>,
}

impl ConfigSet {
    /// Returns a new [`ConfigSetBuilder`].
    pub fn builder() -> ConfigSetBuilder {
        ConfigSetBuilder::default()
    }

    /// Update [`Config`] in this [`ConfigSet`] with the specified value.
    ///
    /// # Panics
    /// * If [`Config`] was not previously registered with the original [`ConfigSetBuilder`].
    pub fn update<V: ConfigDefault>(&self, config: &'static Config<V>, value: V) {
        let entry = self
            .configs
            .get(config.name)
            .unwrap_or_else(|| panic!("tried to update unregistered config {}", config.name));
        *entry.value.write().expect("config lock poisoned") = value.to_value();
    }

    /// Update the [`Config`] in this [`ConfigSet`] with `name` to `value`.
    ///
    /// # Errors
    ///
    /// * If no config named `name` exists in this set.
    /// * If the config specified by `name` cannot parse `value`.
    pub fn try_update(&self, name: &str, value: &str) -> Result<(), anyhow::Error> {
        let entry = self
            .configs
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("no config named '{name}' found"))?;
        let mut current = entry.value.write().expect("config lock poisoned");
        let parsed = current
            .parse_same_kind(value)
            .map_err(|err| anyhow::anyhow!("config '{name}': {err}"))?;
        *current = parsed;
        Ok(())
    }

    /// Apply overrides from environment variables named `{prefix}{NAME}`, e.g.
    /// `PB_CFG_FLAG_PREFIX=++`. Returns the number of configs that were updated.
    ///
    /// # Errors
    ///
    /// * If a variable with `prefix` names a config that does not exist, or has an invalid value.
    pub fn apply_env(&self, prefix: &str) -> Result<usize, anyhow::Error> {
        let mut applied = 0;
        for (name, value) in pb_ore::env::prefixed_vars(prefix) {
            self.try_update(&name, &value)?;
            applied += 1;
        }
        Ok(applied)
    }
}

impl fmt::Display for ConfigSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, entry) in &*self.configs {
            let value = entry.value.read().expect("config lock poisoned");
            writeln!(f, "{} => {}\n\t└─ '{}'", name, *value, entry.desc)?;
        }
        Ok(())
    }
}

/// Single entry within a [`ConfigSet`].
#[derive(Debug)]
struct ConfigSetEntry {
    value: RwLock<ConfigValue>,
    desc: &'static str,
}

/// A builder for a [`ConfigSet`].
#[derive(Default, Debug)]
pub struct ConfigSetBuilder {
    configs: BTreeMap<CompactString, (ConfigValue, &'static str)>,
}

impl ConfigSetBuilder {
    /// Register a [`Config`] into this [`ConfigSetBuilder`] with the default value.
    ///
    /// # Panics
    /// * If a [`Config`] with the same name was already registered.
    pub fn register<V: ConfigDefault>(&mut self, config: &'static Config<V>) -> &mut Self {
        let value = config.default.to_value();
        let prev = self
            .configs
            .insert(CompactString::const_new(config.name), (value, config.desc));
        assert_none!(prev, "config '{}' registered more than once", config.name);
        self
    }

    /// Consumes this [`ConfigSetBuilder`] constructing a [`ConfigSet`].
    pub fn build(self) -> ConfigSet {
        let configs = self
            .configs
            .into_iter()
            .map(|(name, (value, desc))| {
                let entry = ConfigSetEntry {
                    value: RwLock::new(value),
                    desc,
                };
                (name, entry)
            })
            .collect();
        ConfigSet {
            configs: Arc::new(configs),
        }
    }
}

/// Types that can be provided as a default to a [`Config`].
pub trait ConfigDefault {
    /// The type handed back when reading a [`Config`].
    type Stored;

    fn to_value(&self) -> ConfigValue;
    fn from_value(val: &ConfigValue) -> Self::Stored;
}

impl ConfigDefault for bool {
    type Stored = bool;

    fn to_value(&self) -> ConfigValue {
        ConfigValue::Bool(*self)
    }

    fn from_value(val: &ConfigValue) -> Self::Stored {
        let ConfigValue::Bool(val) = val else {
            panic!("programming error, found {val:?} for bool")
        };
        *val
    }
}

impl ConfigDefault for i64 {
    type Stored = i64;

    fn to_value(&self) -> ConfigValue {
        ConfigValue::I64(*self)
    }

    fn from_value(val: &ConfigValue) -> Self::Stored {
        let ConfigValue::I64(val) = val else {
            panic!("programming error, found {val:?} for i64")
        };
        *val
    }
}

impl ConfigDefault for &str {
    type Stored = CompactString;

    fn to_value(&self) -> ConfigValue {
        ConfigValue::String(CompactString::new(self))
    }

    fn from_value(val: &ConfigValue) -> Self::Stored {
        let ConfigValue::String(val) = val else {
            panic!("programming error, found {val:?} for string")
        };
        val.clone()
    }
}

/// "Type erased" configuration values.
///
/// We prefer an enum as opposed to something like `Box<dyn Value>` because enums offer better
/// performance and are easier to reason about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Bool(bool),
    I64(i64),
    String(CompactString),
}

impl ConfigValue {
    /// Parse `text` into a [`ConfigValue`] of the same kind as `self`.
    fn parse_same_kind(&self, text: &str) -> Result<ConfigValue, anyhow::Error> {
        let value = match self {
            ConfigValue::Bool(_) => ConfigValue::Bool(text.parse()?),
            ConfigValue::I64(_) => ConfigValue::I64(text.parse()?),
            ConfigValue::String(_) => ConfigValue::String(CompactString::new(text)),
        };
        Ok(value)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(val) => write!(f, "{val}"),
            ConfigValue::I64(val) => write!(f, "{val}"),
            ConfigValue::String(val) => write!(f, "{val:?}"),
        }
    }
}
