//! Definitions of build settings, parsed from a settings file.
//!
//! ```toml
//! [settings."//cc:opt_level"]
//! type = "int"
//! flag = true
//! default = 2
//! alias = "opt"
//!
//! [settings."//cc:toolchain"]
//! type = "label"
//! default = "//toolchains:clang"
//!
//! [targets."//toolchains:clang"]
//! outputs = { path = "/usr/bin/clang" }
//! ```

use std::collections::BTreeMap;

use anyhow::Context;
use pb_cfg::Config;
use pb_types::Label;
use serde::Deserialize;

use crate::descriptor::BuildSettingDescriptor;
use crate::graph::InMemoryGraph;
use crate::value::{NodeOutput, RawValue, SettingType};
use crate::Engine;

pub static SETTINGS_FILENAME: Config<&'static str> = Config::new(
    "settings_filename",
    "The filename the CLI reads setting definitions from, when none is given.",
    "SETTINGS.pb.toml",
);

/// Contents of a settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsSpec {
    /// Declared build settings, keyed by identity.
    #[serde(default)]
    pub settings: BTreeMap<String, SettingSpec>,
    /// Targets that label settings can point at, keyed by label.
    #[serde(default)]
    pub targets: BTreeMap<String, TargetSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingSpec {
    #[serde(rename = "type")]
    pub ty: SettingType,
    /// Whether the setting can be set from the command line.
    #[serde(default)]
    pub flag: bool,
    #[serde(default)]
    pub default: DefaultSpec,
    /// Short name for the flag, e.g. `opt` for `--opt=3`.
    pub alias: Option<String>,
}

/// A default value, written with whatever TOML type is most natural.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DefaultSpec {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl Default for DefaultSpec {
    fn default() -> Self {
        DefaultSpec::Text(String::new())
    }
}

impl DefaultSpec {
    pub fn to_raw(&self) -> RawValue {
        match self {
            DefaultSpec::Bool(val) => RawValue::text(if *val { "true" } else { "false" }),
            DefaultSpec::Int(val) => RawValue::text(val.to_string()),
            DefaultSpec::Text(text) => RawValue::text(text.as_str()),
            DefaultSpec::List(items) => RawValue::list(items.iter().map(String::as_str)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    /// Fields the target produces once evaluated.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
    /// If set, evaluating the target fails with this reason.
    pub error: Option<String>,
}

impl SettingsSpec {
    pub fn from_toml(raw: &str) -> Result<Self, anyhow::Error> {
        let spec = toml::from_str(raw)?;
        Ok(spec)
    }

    /// Declare every setting with `engine`, and register the aliases of flags.
    pub fn declare(&self, engine: &Engine) -> Result<Vec<BuildSettingDescriptor>, anyhow::Error> {
        let mut scope = engine.declare_scope();
        let mut aliases = Vec::new();

        for (identity, spec) in &self.settings {
            let label = Label::parse(identity)
                .with_context(|| format!("invalid setting identity '{identity}'"))?;
            let descriptor = scope
                .declare(label, spec.default.to_raw())
                .build(spec.ty, spec.flag)?;

            if let Some(alias) = &spec.alias {
                anyhow::ensure!(spec.flag, "setting {identity} has an alias but is not a flag");
                aliases.push((alias, descriptor.identity().to_string()));
            }
        }

        for (alias, flag_name) in aliases {
            engine.flags().register_alias(alias, &flag_name)?;
        }

        Ok(scope.descriptors().cloned().collect())
    }

    /// Complete or fail every target in `graph`.
    pub fn populate(&self, graph: &InMemoryGraph) -> Result<(), anyhow::Error> {
        for (label, target) in &self.targets {
            let label =
                Label::parse(label).with_context(|| format!("invalid target label '{label}'"))?;
            match &target.error {
                Some(reason) => {
                    anyhow::ensure!(
                        target.outputs.is_empty(),
                        "target {label} has both outputs and an error"
                    );
                    graph.fail(label, reason.as_str());
                }
                None => {
                    let output: NodeOutput = target
                        .outputs
                        .iter()
                        .map(|(name, value)| (name.as_str(), value.as_str()))
                        .collect();
                    graph.complete(label, output);
                }
            }
        }
        Ok(())
    }
}
