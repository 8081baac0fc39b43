//! Binding of command line flags to build settings.
//!
//! Repeated occurrences of a flag resolve differently depending on the type of the setting:
//! for scalar types the last occurrence wins, for list types occurrences accumulate in command
//! line order.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use compact_str::CompactString;
use parking_lot::RwLock;
use pb_ore::debug_assert_none;
use pb_types::Label;

use crate::codec::ValueCodec;
use crate::descriptor::BuildSettingDescriptor;
use crate::value::{RawValue, SettingType};
use crate::Error;

/// How flags are spelled on a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSyntax {
    /// Prefix that marks an argument as a flag, e.g. `--`.
    pub prefix: CompactString,
    /// Whether `--no<name>` sets a bool flag to false.
    pub allow_bool_negation: bool,
}

impl Default for FlagSyntax {
    fn default() -> Self {
        FlagSyntax {
            prefix: CompactString::const_new("--"),
            allow_bool_negation: true,
        }
    }
}

/// Maps flag names to the [`BuildSettingDescriptor`]s they set.
#[derive(Debug, Default)]
pub struct FlagBindingTable {
    inner: RwLock<FlagTableInner>,
    codec: ValueCodec,
    syntax: FlagSyntax,
}

#[derive(Debug, Default)]
struct FlagTableInner {
    /// Flag name to the setting it's bound to.
    flags: BTreeMap<CompactString, BuildSettingDescriptor>,
    /// Alias to the flag name it stands in for.
    aliases: BTreeMap<CompactString, CompactString>,
}

impl FlagBindingTable {
    pub fn new(codec: ValueCodec, syntax: FlagSyntax) -> Self {
        FlagBindingTable {
            inner: RwLock::default(),
            codec,
            syntax,
        }
    }

    pub fn syntax(&self) -> &FlagSyntax {
        &self.syntax
    }

    /// Bind `flag_name` to `descriptor`.
    ///
    /// Registering the same descriptor under the same name again is a no-op.
    ///
    /// # Errors
    ///
    /// * [`Error::NotFlaggable`] if the descriptor is not a flag.
    /// * [`Error::DuplicateFlagName`] if the name is already bound to a different descriptor.
    pub fn register(
        &self,
        flag_name: &str,
        descriptor: &BuildSettingDescriptor,
    ) -> Result<(), Error> {
        if !descriptor.is_flag() {
            return Err(Error::NotFlaggable(descriptor.identity().clone()));
        }

        let mut inner = self.inner.write();
        if let Some(existing) = inner.lookup(flag_name) {
            if existing == descriptor && !inner.aliases.contains_key(flag_name) {
                return Ok(());
            }
            return Err(Error::DuplicateFlagName {
                name: CompactString::new(flag_name),
                existing: existing.identity().clone(),
            });
        }

        let prev = inner
            .flags
            .insert(CompactString::new(flag_name), descriptor.clone());
        debug_assert_none!(prev);
        tracing::trace!(flag = flag_name, setting = %descriptor.identity(), "registered flag");

        Ok(())
    }

    /// Bind `alias` to the already registered flag `flag_name`.
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownFlag`] if `flag_name` is not registered.
    /// * [`Error::DuplicateFlagName`] if `alias` is already a flag name or alias.
    pub fn register_alias(&self, alias: &str, flag_name: &str) -> Result<(), Error> {
        let mut inner = self.inner.write();
        if !inner.flags.contains_key(flag_name) {
            return Err(Error::UnknownFlag {
                name: CompactString::new(flag_name),
                literal: alias.to_string(),
            });
        }
        if let Some(existing) = inner.lookup(alias) {
            return Err(Error::DuplicateFlagName {
                name: CompactString::new(alias),
                existing: existing.identity().clone(),
            });
        }

        inner
            .aliases
            .insert(CompactString::new(alias), CompactString::new(flag_name));
        tracing::trace!(alias, flag = flag_name, "registered flag alias");

        Ok(())
    }

    /// Returns the descriptor bound to `name`, which can be a flag name or an alias.
    pub fn lookup(&self, name: &str) -> Option<BuildSettingDescriptor> {
        let inner = self.inner.read();
        inner.lookup(name).cloned()
    }

    /// Parse a single occurrence of the flag `flag_name` with the literal `raw_text`.
    ///
    /// Values for list types are split into their items, so recording multiple occurrences
    /// with [`ParsedFlags::record`] concatenates them.
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownFlag`] if no setting is bound to `flag_name`.
    pub fn parse_occurrence(&self, flag_name: &str, raw_text: &str) -> Result<FlagOccurrence, Error> {
        let descriptor = self.lookup(flag_name).ok_or_else(|| Error::UnknownFlag {
            name: CompactString::new(flag_name),
            literal: raw_text.to_string(),
        })?;

        let ty = descriptor.setting_type();
        let raw = if ty.is_list() {
            RawValue::List(self.codec.split(ty, raw_text))
        } else {
            RawValue::text(raw_text)
        };

        Ok(FlagOccurrence { descriptor, raw })
    }

    /// Parse all of the flags in `args`.
    ///
    /// Accepts `<prefix>name=value`, `<prefix>name value`, a bare `<prefix>name` for bool flags,
    /// and `<prefix>no<name>` for bool flags if negation is allowed. Arguments that aren't bound
    /// flags, and everything after a `--`, are returned in [`CommandLine::residue`] for the
    /// caller to handle.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidValue`] if a non-bool flag is missing its value.
    pub fn parse_command_line<S: AsRef<str>>(&self, args: &[S]) -> Result<CommandLine, Error> {
        let mut command_line = CommandLine::default();
        let mut args = args.iter().map(S::as_ref);

        while let Some(arg) = args.next() {
            if arg == "--" {
                command_line.residue.extend(args.by_ref().map(String::from));
                break;
            }
            let Some(body) = arg.strip_prefix(self.syntax.prefix.as_str()) else {
                command_line.residue.push(arg.to_string());
                continue;
            };
            let (name, inline_value) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };

            let occurrence = match (self.lookup(name), inline_value) {
                (Some(_), Some(value)) => self.parse_occurrence(name, value)?,
                (Some(descriptor), None) if descriptor.setting_type() == SettingType::Bool => {
                    self.parse_occurrence(name, "true")?
                }
                (Some(descriptor), None) => {
                    let Some(value) = args.next() else {
                        return Err(Error::InvalidValue {
                            setting: descriptor.identity().clone(),
                            ty: descriptor.setting_type(),
                            literal: arg.to_string(),
                            reason: CompactString::const_new("flag requires a value"),
                        });
                    };
                    self.parse_occurrence(name, value)?
                }
                (None, None) => match self.negated_bool(name) {
                    Some(negated) => self.parse_occurrence(negated, "false")?,
                    None => {
                        command_line.residue.push(arg.to_string());
                        continue;
                    }
                },
                (None, Some(_)) => {
                    command_line.residue.push(arg.to_string());
                    continue;
                }
            };

            tracing::trace!(
                setting = %occurrence.descriptor.identity(),
                raw = ?occurrence.raw,
                "parsed flag occurrence"
            );
            command_line.flags.record(occurrence);
        }

        Ok(command_line)
    }

    /// If `name` is `no<flag>` for a bool flag, returns `<flag>`.
    fn negated_bool<'n>(&self, name: &'n str) -> Option<&'n str> {
        if !self.syntax.allow_bool_negation {
            return None;
        }
        let negated = name.strip_prefix("no")?;
        let descriptor = self.lookup(negated)?;
        (descriptor.setting_type() == SettingType::Bool).then_some(negated)
    }
}

impl FlagTableInner {
    fn lookup(&self, name: &str) -> Option<&BuildSettingDescriptor> {
        let name = self.aliases.get(name).map(CompactString::as_str).unwrap_or(name);
        if let Some(descriptor) = self.flags.get(name) {
            return Some(descriptor);
        }
        // Flags are bound by canonical label, accept any spelling of it, e.g. `//foo`.
        let canonical = Label::parse(name).ok()?.to_string();
        self.flags.get(canonical.as_str())
    }
}

/// A single parsed occurrence of a flag.
#[derive(Debug, Clone)]
pub struct FlagOccurrence {
    pub descriptor: BuildSettingDescriptor,
    pub raw: RawValue,
}

/// Raw values of all the flags that were set, keyed by setting identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParsedFlags {
    values: BTreeMap<Label, RawValue>,
}

impl ParsedFlags {
    /// Record an occurrence of a flag.
    ///
    /// Scalar flags are overridden by later occurrences, list flags accumulate.
    pub fn record(&mut self, occurrence: FlagOccurrence) {
        let FlagOccurrence { descriptor, raw } = occurrence;

        match self.values.entry(descriptor.identity().clone()) {
            Entry::Occupied(mut entry) => match (entry.get_mut(), raw) {
                (RawValue::List(existing), RawValue::List(items))
                    if descriptor.setting_type().is_list() =>
                {
                    existing.extend(items);
                }
                (existing, raw) => *existing = raw,
            },
            Entry::Vacant(entry) => {
                entry.insert(raw);
            }
        }
    }

    /// Raw value of the flag for `identity`, if it was set.
    pub fn get(&self, identity: &Label) -> Option<&RawValue> {
        self.values.get(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, &RawValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of parsing a command line.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    /// Values of every flag bound to a build setting.
    pub flags: ParsedFlags,
    /// Arguments that were not flags bound to a build setting.
    pub residue: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DeclaringScope;

    fn label(text: &str) -> Label {
        Label::parse(text).unwrap()
    }

    /// A table with `//f:int`, `//f:bool`, `//f:str`, `//f:list`, `//f:labels` flags, and a
    /// non-flag `//f:hidden`.
    fn test_table() -> (FlagBindingTable, Vec<BuildSettingDescriptor>) {
        let table = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&table);
        let descriptors = vec![
            scope.declare(label("//f:int"), "0").int(true).unwrap(),
            scope.declare(label("//f:bool"), "false").bool(true).unwrap(),
            scope.declare(label("//f:str"), "").string(true).unwrap(),
            scope.declare(label("//f:list"), "").string_list(true).unwrap(),
            scope.declare(label("//f:labels"), "").label_list(true).unwrap(),
            scope.declare(label("//f:hidden"), "").string(false).unwrap(),
        ];
        drop(scope);
        (table, descriptors)
    }

    #[test]
    fn test_register_errors() {
        let (table, descriptors) = test_table();
        let hidden = &descriptors[5];
        assert!(matches!(
            table.register("hidden", hidden),
            Err(Error::NotFlaggable(_))
        ));

        // Same descriptor again is fine, a different one is not.
        table.register("//f:int", &descriptors[0]).unwrap();
        assert!(matches!(
            table.register("//f:int", &descriptors[1]),
            Err(Error::DuplicateFlagName { existing, .. }) if existing == label("//f:int")
        ));
    }

    #[test]
    fn test_aliases() {
        let (table, descriptors) = test_table();
        table.register_alias("jobs", "//f:int").unwrap();
        assert_eq!(table.lookup("jobs"), Some(descriptors[0].clone()));

        assert!(matches!(
            table.register_alias("jobs", "//f:str"),
            Err(Error::DuplicateFlagName { .. })
        ));
        assert!(matches!(
            table.register_alias("//f:str", "//f:int"),
            Err(Error::DuplicateFlagName { .. })
        ));
        assert!(matches!(
            table.register_alias("nope", "//f:missing"),
            Err(Error::UnknownFlag { .. })
        ));
        // An alias can't be re-registered as a flag name.
        assert!(matches!(
            table.register("jobs", &descriptors[0]),
            Err(Error::DuplicateFlagName { .. })
        ));
    }

    #[test]
    fn test_parse_occurrence() {
        let (table, _) = test_table();
        let occurrence = table.parse_occurrence("//f:list", "a,b").unwrap();
        assert_eq!(occurrence.raw, RawValue::list(["a", "b"]));
        let occurrence = table.parse_occurrence("//f:int", "12").unwrap();
        assert_eq!(occurrence.raw, RawValue::text("12"));

        let err = table.parse_occurrence("//f:nope", "1").unwrap_err();
        assert!(matches!(err, Error::UnknownFlag { name, .. } if name == "//f:nope"));
    }

    #[test]
    fn test_scalar_last_occurrence_wins() {
        let (table, _) = test_table();
        let command_line = table
            .parse_command_line(&["--//f:int=1", "--//f:int=2"])
            .unwrap();
        assert_eq!(
            command_line.flags.get(&label("//f:int")),
            Some(&RawValue::text("2"))
        );
    }

    #[test]
    fn test_list_occurrences_accumulate() {
        let (table, _) = test_table();
        let command_line = table
            .parse_command_line(&[
                "--//f:list=a",
                "--//f:int=1",
                "--//f:list",
                "b,c",
                "--//f:labels=//x:y",
                "--//f:labels=//z",
            ])
            .unwrap();
        assert_eq!(
            command_line.flags.get(&label("//f:list")),
            Some(&RawValue::list(["a", "b", "c"]))
        );
        assert_eq!(
            command_line.flags.get(&label("//f:labels")),
            Some(&RawValue::list(["//x:y", "//z"]))
        );
    }

    #[test]
    fn test_bool_forms() {
        let (table, _) = test_table();
        let command_line = table.parse_command_line(&["--//f:bool"]).unwrap();
        assert_eq!(
            command_line.flags.get(&label("//f:bool")),
            Some(&RawValue::text("true"))
        );

        let command_line = table
            .parse_command_line(&["--//f:bool", "--no//f:bool"])
            .unwrap();
        assert_eq!(
            command_line.flags.get(&label("//f:bool")),
            Some(&RawValue::text("false"))
        );

        // Negation only applies to bool flags.
        let command_line = table.parse_command_line(&["--no//f:int"]).unwrap();
        assert!(command_line.flags.is_empty());
        assert_eq!(command_line.residue, vec!["--no//f:int".to_string()]);
    }

    #[test]
    fn test_negation_disabled() {
        let (_, descriptors) = test_table();
        let syntax = FlagSyntax {
            prefix: "--".into(),
            allow_bool_negation: false,
        };
        let table = FlagBindingTable::new(ValueCodec::default(), syntax);
        table.register("//f:bool", &descriptors[1]).unwrap();

        let command_line = table.parse_command_line(&["--no//f:bool"]).unwrap();
        assert!(command_line.flags.is_empty());
        assert_eq!(command_line.residue.len(), 1);
    }

    #[test]
    fn test_residue() {
        let (table, _) = test_table();
        let command_line = table
            .parse_command_line(&[
                "build",
                "--//f:int=3",
                "--jobs=4",
                "--//f:hidden=x",
                "--",
                "--//f:int=5",
            ])
            .unwrap();
        assert_eq!(
            command_line.flags.get(&label("//f:int")),
            Some(&RawValue::text("3"))
        );
        assert_eq!(
            command_line.residue,
            vec!["build", "--jobs=4", "--//f:hidden=x", "--//f:int=5"]
        );
    }

    #[test]
    fn test_short_label_spelling() {
        let table = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&table);
        let foo = scope.declare(label("//foo"), "0").int(true).unwrap();
        drop(scope);

        assert_eq!(table.lookup("//foo"), Some(foo.clone()));
        assert_eq!(table.lookup("//foo:foo"), Some(foo));

        let command_line = table.parse_command_line(&["--//foo=3"]).unwrap();
        assert!(command_line.residue.is_empty());
        assert_eq!(command_line.flags.len(), 1);
        assert_eq!(
            command_line.flags.get(&label("//foo:foo")),
            Some(&RawValue::text("3"))
        );
    }

    #[test]
    fn test_missing_value() {
        let (table, _) = test_table();
        let err = table.parse_command_line(&["--//f:str"]).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { setting, .. } if setting == label("//f:str")));
    }
}
