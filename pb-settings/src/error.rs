//! Errors from declaring, parsing, and resolving build settings.

use std::sync::Arc;

use compact_str::CompactString;
use pb_types::{Label, LabelError};

use crate::codec::ParseError;
use crate::value::{ResolvedValue, SettingType};

/// Errors produced by the build setting engine.
///
/// User facing errors carry the identity of the offending setting and the literal text that
/// failed, they abort the enclosing configuration evaluation and retrying can't succeed. See
/// [`Error::is_internal`] for errors that indicate a bug in the host.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("setting {setting}: invalid {ty} value '{literal}': {reason}")]
    InvalidValue {
        setting: Label,
        ty: SettingType,
        literal: String,
        reason: CompactString,
    },
    #[error("setting {setting}: invalid label '{literal}': {source}")]
    InvalidLabelSyntax {
        setting: Label,
        literal: String,
        source: LabelError,
    },
    #[error("setting {0} is already declared in this scope")]
    DuplicateSetting(Label),
    #[error("flag name '{name}' is already bound to {existing}")]
    DuplicateFlagName {
        name: CompactString,
        existing: Label,
    },
    #[error("setting {0} is not a flag, it can't be set from the command line")]
    NotFlaggable(Label),
    #[error("unknown flag '{name}' in '{literal}'")]
    UnknownFlag { name: CompactString, literal: String },
    #[error("setting {setting}: dependency {label} was read before it completed")]
    UnresolvedDependency { setting: Label, label: Label },
    #[error("setting {setting}: dependency {label} failed: {reason}")]
    DependencyFailed {
        setting: Label,
        label: Label,
        reason: Arc<str>,
    },
    #[error(
        "setting {setting} in configuration {configuration}: tried to commit {attempted}, \
         but {committed} is already committed"
    )]
    SettingValueConflict {
        setting: Label,
        configuration: CompactString,
        committed: Box<ResolvedValue>,
        attempted: Box<ResolvedValue>,
    },
    #[error("setting {setting}: expected a {expected} value, found a {found} value")]
    TypeMismatch {
        setting: Label,
        expected: SettingType,
        found: SettingType,
    },
    #[error("setting {setting}: evaluation in configuration {configuration} was cancelled")]
    Cancelled {
        setting: Label,
        configuration: CompactString,
    },
}

impl Error {
    /// Attribute a [`ParseError`] to `setting`.
    pub fn from_parse(setting: &Label, err: ParseError) -> Self {
        match err {
            ParseError::InvalidValue {
                ty,
                literal,
                reason,
            } => Error::InvalidValue {
                setting: setting.clone(),
                ty,
                literal,
                reason: CompactString::const_new(reason),
            },
            ParseError::InvalidLabelSyntax { literal, source } => Error::InvalidLabelSyntax {
                setting: setting.clone(),
                literal,
                source,
            },
            ParseError::TypeMismatch { expected, found } => Error::TypeMismatch {
                setting: setting.clone(),
                expected,
                found,
            },
        }
    }

    /// Returns if this error indicates a scheduling or contract bug in the host, as opposed to bad
    /// user input. These should be treated as fatal.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedDependency { .. }
                | Error::SettingValueConflict { .. }
                | Error::TypeMismatch { .. }
        )
    }

    /// Returns if this error was caused by user input, e.g. a malformed flag value.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::InvalidValue { .. }
                | Error::InvalidLabelSyntax { .. }
                | Error::UnknownFlag { .. }
                | Error::DependencyFailed { .. }
        )
    }
}
