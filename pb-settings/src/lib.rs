//! Typed build settings for `pb`.
//!
//! Rules declare build settings, typed and named configuration values that can be set from the
//! command line, carry a typed default, and, for label-typed settings, point at other targets in
//! the build graph whose outputs become the setting's value.
//!
//! * [`codec`] converts between raw text and typed values.
//! * [`descriptor`] declares settings.
//! * [`flags`] binds flags on the command line to settings.
//! * [`resolve`] connects label settings to the host's [`graph::DependencyGraph`].
//! * [`store`] caches the value of each setting per configuration.
//!
//! [`Engine`] wires all of these together.

pub mod cfgs;
pub mod codec;
pub mod configuration;
pub mod defs;
pub mod descriptor;
pub mod engine;
pub mod flags;
pub mod graph;
pub mod resolve;
pub mod store;
pub mod value;

mod error;

pub use configuration::ConfigurationKey;
pub use descriptor::{BuildSettingDescriptor, DeclaringScope};
pub use engine::{Engine, EngineConfig};
pub use error::Error;
pub use store::{EvaluationContext, Lookup, SettingEntry};
pub use value::{Provenance, RawValue, ResolvedValue, SettingType};
