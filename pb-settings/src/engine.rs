//! Entry point to the build setting engine.

use std::sync::Arc;

use compact_str::CompactString;
use derivative::Derivative;
use pb_cfg::ConfigSet;
use pb_types::Label;

use crate::cfgs::{ALLOW_BOOL_NEGATION, FLAG_PREFIX, STRING_LIST_DELIMITER};
use crate::codec::ValueCodec;
use crate::configuration::ConfigurationKey;
use crate::descriptor::{BuildSettingDescriptor, DeclaringScope};
use crate::flags::{CommandLine, FlagBindingTable, FlagSyntax, ParsedFlags};
use crate::graph::DependencyGraph;
use crate::store::{EvaluationContext, Lookup, SettingValueStore};
use crate::Error;

/// Configuration for creating an [`Engine`].
pub struct EngineConfig {
    /// Dynamic configs for the engine, see [`crate::cfgs`].
    pub configs: ConfigSet,
    /// The host's dependency graph that label settings resolve against.
    pub graph: Arc<dyn DependencyGraph>,
}

/// Owns everything needed to declare build settings, parse a command line, and read setting
/// values per configuration.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Engine {
    /// Dynamic configs for the engine.
    configs: ConfigSet,
    /// Codec used for every setting value.
    codec: ValueCodec,
    /// Flags callable from the command line.
    flags: FlagBindingTable,
    /// Values of settings, per configuration.
    #[derivative(Debug = "ignore")]
    store: SettingValueStore,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, anyhow::Error> {
        let EngineConfig { configs, graph } = config;

        let delimiter = STRING_LIST_DELIMITER.read(&configs);
        let codec = ValueCodec::new(&delimiter)?;

        let prefix = FLAG_PREFIX.read(&configs);
        anyhow::ensure!(!prefix.is_empty(), "'{}' must not be empty", FLAG_PREFIX.name());
        let syntax = FlagSyntax {
            prefix,
            allow_bool_negation: ALLOW_BOOL_NEGATION.read(&configs),
        };
        tracing::info!(%delimiter, ?syntax, "creating build setting engine");

        let flags = FlagBindingTable::new(codec.clone(), syntax);
        let store = SettingValueStore::new(codec.clone(), graph);

        Ok(Engine {
            configs,
            codec,
            flags,
            store,
        })
    }

    pub fn configs(&self) -> &ConfigSet {
        &self.configs
    }

    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    pub fn flags(&self) -> &FlagBindingTable {
        &self.flags
    }

    pub fn store(&self) -> &SettingValueStore {
        &self.store
    }

    /// Start a new scope to declare build settings in, flags get registered with this engine.
    pub fn declare_scope(&self) -> DeclaringScope<'_> {
        DeclaringScope::new(&self.flags)
    }

    /// Parse `args` against the flags declared so far.
    pub fn parse_command_line<S: AsRef<str>>(&self, args: &[S]) -> Result<CommandLine, Error> {
        self.flags.parse_command_line(args)
    }

    /// Create the key for the configuration `name` with the parsed `flags`.
    pub fn configuration(
        &self,
        name: impl Into<CompactString>,
        flags: ParsedFlags,
    ) -> ConfigurationKey {
        let key = ConfigurationKey::new(name, flags);
        tracing::debug!(config = %key, flags = key.flags().len(), "created configuration");
        key
    }

    /// Read the value of `descriptor` in the configuration `key`.
    pub fn get(
        &self,
        key: &ConfigurationKey,
        descriptor: &BuildSettingDescriptor,
    ) -> Result<Lookup, Error> {
        self.store.get(key, descriptor)
    }

    /// Read the value of `descriptor` in the configuration `key`, as part of the evaluation
    /// `context`.
    pub fn get_cancellable(
        &self,
        key: &ConfigurationKey,
        descriptor: &BuildSettingDescriptor,
        context: &EvaluationContext,
    ) -> Result<Lookup, Error> {
        self.store.get_cancellable(key, descriptor, context)
    }

    /// Returns the descriptor bound to the flag `name`, if any.
    pub fn lookup_flag(&self, name: &str) -> Option<BuildSettingDescriptor> {
        self.flags.lookup(name)
    }

    /// Returns the descriptor of the flag whose setting is `identity`, if any.
    pub fn flag_for(&self, identity: &Label) -> Option<BuildSettingDescriptor> {
        self.flags.lookup(&identity.to_string())
    }

    /// Drop every value of the configuration `key`.
    pub fn invalidate(&self, key: &ConfigurationKey) -> bool {
        self.store.invalidate(key)
    }
}
