//! Keys for build configurations.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use compact_str::CompactString;
use pb_ore::hash::Xxh3Hasher;
use pb_types::Xxh64Hash;

use crate::flags::ParsedFlags;
use crate::value::RawValue;

/// Immutable snapshot that identifies one build configuration, including the command line
/// flags that settings are evaluated against.
///
/// Cheap to clone. Equal keys always have equal fingerprints.
#[derive(Clone)]
pub struct ConfigurationKey {
    inner: Arc<ConfigurationInner>,
}

struct ConfigurationInner {
    name: CompactString,
    flags: ParsedFlags,
    fingerprint: Xxh64Hash,
}

impl ConfigurationKey {
    pub fn new(name: impl Into<CompactString>, flags: ParsedFlags) -> Self {
        let name = name.into();

        let mut hasher = Xxh3Hasher::new();
        hasher.update_str(&name);
        for (identity, raw) in flags.iter() {
            hasher.update_str(&identity.to_string());
            match raw {
                RawValue::Text(text) => {
                    hasher.update(&[0]);
                    hasher.update_str(text);
                }
                RawValue::List(items) => {
                    hasher.update(&[1]);
                    hasher.update(&(items.len() as u64).to_le_bytes());
                    for item in items {
                        hasher.update_str(item);
                    }
                }
            }
        }
        let fingerprint = hasher.digest();

        ConfigurationKey {
            inner: Arc::new(ConfigurationInner {
                name,
                flags,
                fingerprint,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Flags that were set on the command line for this configuration.
    pub fn flags(&self) -> &ParsedFlags {
        &self.inner.flags
    }

    pub fn fingerprint(&self) -> Xxh64Hash {
        self.inner.fingerprint
    }
}

impl PartialEq for ConfigurationKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.fingerprint == other.inner.fingerprint
                && self.inner.name == other.inner.name
                && self.inner.flags == other.inner.flags)
    }
}

impl Eq for ConfigurationKey {}

impl Hash for ConfigurationKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.fingerprint.hash(state);
    }
}

impl fmt::Display for ConfigurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.inner.name, self.inner.fingerprint)
    }
}

impl fmt::Debug for ConfigurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationKey")
            .field("name", &self.inner.name)
            .field("fingerprint", &self.inner.fingerprint)
            .field("flags", &self.inner.flags.len())
            .finish()
    }
}
