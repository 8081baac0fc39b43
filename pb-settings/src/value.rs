//! Raw and resolved values of build settings.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use pb_types::Label;
use serde::Deserialize;

/// The kind of a build setting, determines which codec is used to parse its values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    Int,
    Bool,
    String,
    StringList,
    Label,
    LabelList,
}

impl SettingType {
    /// Every [`SettingType`], in declaration order.
    pub const ALL: [SettingType; 6] = [
        SettingType::Int,
        SettingType::Bool,
        SettingType::String,
        SettingType::StringList,
        SettingType::Label,
        SettingType::LabelList,
    ];

    /// Name of this type as rule authors spell it, e.g. `string_list`.
    pub fn name(&self) -> &'static str {
        match self {
            SettingType::Int => "int",
            SettingType::Bool => "bool",
            SettingType::String => "string",
            SettingType::StringList => "string_list",
            SettingType::Label => "label",
            SettingType::LabelList => "label_list",
        }
    }

    /// Returns if repeated flag occurrences accumulate instead of override.
    pub fn is_list(&self) -> bool {
        matches!(self, SettingType::StringList | SettingType::LabelList)
    }

    /// Returns if values of this type reference other targets in the dependency graph.
    pub fn is_label(&self) -> bool {
        matches!(self, SettingType::Label | SettingType::LabelList)
    }
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Untyped textual value, as supplied on a command line or as a default literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawValue {
    /// A single literal, list types split it with their delimiter.
    Text(CompactString),
    /// An already split sequence of literals.
    List(Vec<CompactString>),
}

impl RawValue {
    pub fn text(text: impl Into<CompactString>) -> Self {
        RawValue::Text(text.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        RawValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Literal text of this value, list items are joined with `delimiter`.
    pub fn literal(&self, delimiter: &str) -> String {
        match self {
            RawValue::Text(text) => text.to_string(),
            RawValue::List(items) => items
                .iter()
                .map(CompactString::as_str)
                .collect::<Vec<_>>()
                .join(delimiter),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::text(value)
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::text(value)
    }
}

impl From<Vec<&str>> for RawValue {
    fn from(value: Vec<&str>) -> Self {
        RawValue::list(value)
    }
}

/// What a dependency-graph node produced once it was evaluated, a set of named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodeOutput {
    fields: Arc<BTreeMap<CompactString, CompactString>>,
}

impl NodeOutput {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(CompactString::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for NodeOutput
where
    K: Into<CompactString>,
    V: Into<CompactString>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let fields = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        NodeOutput {
            fields: Arc::new(fields),
        }
    }
}

impl fmt::Display for NodeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (name, value)) in self.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

/// A label that has been syntactically validated, and possibly resolved against the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedLabel {
    label: Label,
    /// Output of the labeled target, `None` until the dependency graph evaluated it.
    output: Option<NodeOutput>,
}

impl ResolvedLabel {
    /// A label whose target has not been evaluated yet.
    pub fn unresolved(label: Label) -> Self {
        ResolvedLabel {
            label,
            output: None,
        }
    }

    pub fn resolved(label: Label, output: NodeOutput) -> Self {
        ResolvedLabel {
            label,
            output: Some(output),
        }
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn output(&self) -> Option<&NodeOutput> {
        self.output.as_ref()
    }
}

impl fmt::Display for ResolvedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        if let Some(output) = &self.output {
            write!(f, " {output}")?;
        }
        Ok(())
    }
}

/// Typed and validated value of a build setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedValue {
    Int(i64),
    Bool(bool),
    String(CompactString),
    StringList(Vec<CompactString>),
    Label(ResolvedLabel),
    LabelList(Vec<ResolvedLabel>),
}

impl ResolvedValue {
    pub fn setting_type(&self) -> SettingType {
        match self {
            ResolvedValue::Int(_) => SettingType::Int,
            ResolvedValue::Bool(_) => SettingType::Bool,
            ResolvedValue::String(_) => SettingType::String,
            ResolvedValue::StringList(_) => SettingType::StringList,
            ResolvedValue::Label(_) => SettingType::Label,
            ResolvedValue::LabelList(_) => SettingType::LabelList,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ResolvedValue::Int(val) => Some(*val),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ResolvedValue::Bool(val) => Some(*val),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResolvedValue::String(val) => Some(val.as_str()),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[CompactString]> {
        match self {
            ResolvedValue::StringList(val) => Some(&val[..]),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&ResolvedLabel> {
        match self {
            ResolvedValue::Label(val) => Some(val),
            _ => None,
        }
    }

    pub fn as_label_list(&self) -> Option<&[ResolvedLabel]> {
        match self {
            ResolvedValue::LabelList(val) => Some(&val[..]),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedValue::Int(val) => write!(f, "{val}"),
            ResolvedValue::Bool(val) => write!(f, "{val}"),
            ResolvedValue::String(val) => write!(f, "{val:?}"),
            ResolvedValue::StringList(vals) => f.debug_list().entries(vals).finish(),
            ResolvedValue::Label(val) => write!(f, "{val}"),
            ResolvedValue::LabelList(vals) => {
                write!(f, "[")?;
                for (idx, val) in vals.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{val}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Where a committed setting value came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Parsed from a flag on the command line.
    ExplicitFlag,
    /// The default declared alongside the setting.
    ExplicitDefault,
    /// Copied from another configuration.
    Inherited,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provenance::ExplicitFlag => "explicit-flag",
            Provenance::ExplicitDefault => "explicit-default",
            Provenance::Inherited => "inherited",
        };
        f.write_str(s)
    }
}
