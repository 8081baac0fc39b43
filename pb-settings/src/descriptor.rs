//! Descriptors of build settings.
//!
//! Rule authors mark a rule as a build setting by attaching a descriptor, e.g. an `int` setting
//! that is callable on the command line. Descriptors are created through a [`DeclaringScope`],
//! one constructor per [`SettingType`]:
//!
//! ```ignore
//! let mut scope = DeclaringScope::new(&flags);
//! let opt_level = scope.declare(Label::parse("//cc:opt_level")?, "2").int(true)?;
//! let copts = scope.declare(Label::parse("//cc:copts")?, "").string_list(false)?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use pb_types::Label;

use crate::flags::FlagBindingTable;
use crate::value::{RawValue, SettingType};
use crate::Error;

/// Immutable description of a single build setting: its type, whether it's a flag, and its
/// default.
///
/// Two descriptors are equal if and only if their identities are equal.
#[derive(Clone)]
pub struct BuildSettingDescriptor {
    inner: Arc<DescriptorInner>,
}

struct DescriptorInner {
    /// Label of the rule instance that declares this setting.
    identity: Label,
    ty: SettingType,
    /// Whether or not this setting is callable on the command line.
    is_flag: bool,
    /// Literal used when no flag sets a value.
    default: RawValue,
}

impl BuildSettingDescriptor {
    fn new(identity: Label, ty: SettingType, is_flag: bool, default: RawValue) -> Self {
        BuildSettingDescriptor {
            inner: Arc::new(DescriptorInner {
                identity,
                ty,
                is_flag,
                default,
            }),
        }
    }

    pub fn identity(&self) -> &Label {
        &self.inner.identity
    }

    pub fn setting_type(&self) -> SettingType {
        self.inner.ty
    }

    pub fn is_flag(&self) -> bool {
        self.inner.is_flag
    }

    pub fn default_value(&self) -> &RawValue {
        &self.inner.default
    }
}

impl PartialEq for BuildSettingDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.inner.identity == other.inner.identity
    }
}

impl Eq for BuildSettingDescriptor {}

impl Hash for BuildSettingDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.identity.hash(state);
    }
}

impl fmt::Debug for BuildSettingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildSettingDescriptor")
            .field("identity", &self.inner.identity.to_string())
            .field("type", &self.inner.ty)
            .field("flag", &self.inner.is_flag)
            .field("default", &self.inner.default)
            .finish()
    }
}

impl fmt::Display for BuildSettingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.inner.is_flag { "flag" } else { "setting" };
        write!(f, "{} {kind} {}", self.inner.ty, self.inner.identity)
    }
}

/// A scope in which rule definitions declare build settings, e.g. a single package.
///
/// Identities must be unique within a scope. Flags are registered with the
/// [`FlagBindingTable`] under their identity's canonical label.
#[derive(Debug)]
pub struct DeclaringScope<'a> {
    flags: &'a FlagBindingTable,
    declared: BTreeMap<Label, BuildSettingDescriptor>,
}

impl<'a> DeclaringScope<'a> {
    pub fn new(flags: &'a FlagBindingTable) -> Self {
        DeclaringScope {
            flags,
            declared: BTreeMap::new(),
        }
    }

    /// Start declaring the setting `identity` with the `default` literal.
    ///
    /// The default is only validated when the setting is first read.
    pub fn declare(
        &mut self,
        identity: Label,
        default: impl Into<RawValue>,
    ) -> Declaration<'_, 'a> {
        Declaration {
            scope: self,
            identity,
            default: default.into(),
        }
    }

    /// Returns the descriptor declared for `identity`, if any.
    pub fn get(&self, identity: &Label) -> Option<&BuildSettingDescriptor> {
        self.declared.get(identity)
    }

    /// All of the descriptors declared in this scope, ordered by identity.
    pub fn descriptors(&self) -> impl Iterator<Item = &BuildSettingDescriptor> {
        self.declared.values()
    }
}

/// A pending declaration, completed by picking the type of the setting.
#[must_use = "a declaration does nothing until a type is picked"]
pub struct Declaration<'s, 'a> {
    scope: &'s mut DeclaringScope<'a>,
    identity: Label,
    default: RawValue,
}

impl Declaration<'_, '_> {
    /// An integer-typed build setting.
    pub fn int(self, flag: bool) -> Result<BuildSettingDescriptor, Error> {
        self.build(SettingType::Int, flag)
    }

    /// A bool-typed build setting.
    pub fn bool(self, flag: bool) -> Result<BuildSettingDescriptor, Error> {
        self.build(SettingType::Bool, flag)
    }

    /// A string-typed build setting.
    pub fn string(self, flag: bool) -> Result<BuildSettingDescriptor, Error> {
        self.build(SettingType::String, flag)
    }

    /// A string list-typed build setting.
    pub fn string_list(self, flag: bool) -> Result<BuildSettingDescriptor, Error> {
        self.build(SettingType::StringList, flag)
    }

    /// A label-typed build setting.
    pub fn label(self, flag: bool) -> Result<BuildSettingDescriptor, Error> {
        self.build(SettingType::Label, flag)
    }

    /// A label list-typed build setting.
    pub fn label_list(self, flag: bool) -> Result<BuildSettingDescriptor, Error> {
        self.build(SettingType::LabelList, flag)
    }

    /// Declare a build setting of type `ty`.
    ///
    /// # Errors
    ///
    /// * [`Error::DuplicateSetting`] if the identity was already declared in this scope.
    /// * [`Error::DuplicateFlagName`] if `flag` is set and the flag name is bound to another
    ///   setting.
    pub fn build(self, ty: SettingType, flag: bool) -> Result<BuildSettingDescriptor, Error> {
        let Declaration {
            scope,
            identity,
            default,
        } = self;

        if scope.declared.contains_key(&identity) {
            return Err(Error::DuplicateSetting(identity));
        }

        let descriptor = BuildSettingDescriptor::new(identity.clone(), ty, flag, default);
        if flag {
            scope
                .flags
                .register(&identity.to_string(), &descriptor)?;
        }
        tracing::debug!(setting = %identity, %ty, flag, "declared build setting");
        scope.declared.insert(identity, descriptor.clone());

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> Label {
        Label::parse(text).unwrap()
    }

    #[test]
    fn smoketest_declare_every_type() {
        let flags = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&flags);

        let int = scope.declare(label("//s:int"), "1").int(false).unwrap();
        let bool_ = scope.declare(label("//s:bool"), "true").bool(true).unwrap();
        let string = scope.declare(label("//s:string"), "").string(false).unwrap();
        let list = scope.declare(label("//s:list"), "").string_list(true).unwrap();
        let lbl = scope.declare(label("//s:label"), "//t").label(false).unwrap();
        let lbls = scope.declare(label("//s:labels"), "").label_list(true).unwrap();

        let types: Vec<_> = [&int, &bool_, &string, &list, &lbl, &lbls]
            .iter()
            .map(|d| d.setting_type())
            .collect();
        assert_eq!(types, SettingType::ALL.to_vec());
        assert!(!int.is_flag());
        assert!(bool_.is_flag());
        assert_eq!(scope.descriptors().count(), 6);

        // Only the flags were registered.
        assert_eq!(flags.lookup("//s:bool"), Some(bool_));
        assert_eq!(flags.lookup("//s:list"), Some(list));
        assert_eq!(flags.lookup("//s:int"), None);
    }

    #[test]
    fn test_duplicate_setting() {
        let flags = FlagBindingTable::default();
        let mut scope = DeclaringScope::new(&flags);

        scope.declare(label("//s:x"), "1").int(false).unwrap();
        let err = scope.declare(label("//s:x"), "a").string(true).unwrap_err();
        assert!(matches!(err, Error::DuplicateSetting(id) if id == label("//s:x")));
        // The failed declaration did not register a flag.
        assert_eq!(flags.lookup("//s:x"), None);
    }

    #[test]
    fn test_same_identity_in_another_scope() {
        let flags = FlagBindingTable::default();
        let mut scope_a = DeclaringScope::new(&flags);
        let mut scope_b = DeclaringScope::new(&flags);

        scope_a.declare(label("//s:x"), "1").int(false).unwrap();
        scope_b.declare(label("//s:x"), "2").int(false).unwrap();
    }

    #[test]
    fn test_equality_is_by_identity() {
        let flags = FlagBindingTable::default();
        let mut scope_a = DeclaringScope::new(&flags);
        let mut scope_b = DeclaringScope::new(&flags);

        let a = scope_a.declare(label("//s:x"), "1").int(false).unwrap();
        let b = scope_b.declare(label("//s:x"), "").string(false).unwrap();
        let c = scope_b.declare(label("//s:y"), "1").int(false).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
