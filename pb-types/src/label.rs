//! Labels that name a build target.
//!
//! A label has the form `[@repository]//package/path[:name]`, e.g. `//toolchains/cc:clang` or
//! `@rules_rust//rust/settings:edition`. When `:name` is omitted the target name is the last
//! component of the package, so `//foo/bar` and `//foo/bar:bar` are the same label.

use std::fmt;
use std::str::FromStr;

use compact_str::CompactString;

/// Identifies a single build target in the graph.
///
/// Labels are always absolute. The canonical text form produced by [`fmt::Display`] always
/// includes the target name, so parsing it again yields an equal [`Label`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    /// Name of the repository, empty for the main repository.
    repository: CompactString,
    /// Path of the package relative to the repository root, empty for the root package.
    package: CompactString,
    /// Name of the target within the package.
    name: CompactString,
}

impl Label {
    /// Parse a [`Label`] from its textual form.
    ///
    /// # Errors
    ///
    /// * If the text is empty or contains whitespace or a comma.
    /// * If the text does not start with `//` or `@repository//`.
    /// * If the repository, package, or target name contain disallowed characters.
    pub fn parse(text: &str) -> Result<Label, LabelError> {
        if text.is_empty() {
            return Err(LabelError::Empty);
        }
        if let Some(c) = text.chars().find(|c| c.is_whitespace() || *c == ',') {
            return Err(LabelError::invalid(text, LabelPart::Whole, invalid_char(c)));
        }

        // Split off the repository, if any.
        let (repository, rest) = match text.strip_prefix('@') {
            Some(rest) => {
                let Some(idx) = rest.find("//") else {
                    return Err(LabelError::NotAbsolute(text.to_string()));
                };
                let repository = &rest[..idx];
                validate_repository(repository)
                    .map_err(|reason| LabelError::invalid(text, LabelPart::Repository, reason))?;
                (repository, &rest[idx..])
            }
            None => ("", text),
        };

        let Some(rest) = rest.strip_prefix("//") else {
            return Err(LabelError::NotAbsolute(text.to_string()));
        };
        let (package, name) = match rest.split_once(':') {
            Some((package, name)) => (package, Some(name)),
            None => (rest, None),
        };

        validate_path(package, PACKAGE_CHARS)
            .map_err(|reason| LabelError::invalid(text, LabelPart::Package, reason))?;
        let name = match name {
            Some(name) => {
                validate_path(name, NAME_CHARS)
                    .map_err(|reason| LabelError::invalid(text, LabelPart::Name, reason))?;
                if name.is_empty() {
                    return Err(LabelError::invalid(text, LabelPart::Name, "is empty".into()));
                }
                name
            }
            // Default to the last component of the package.
            None => match package.rsplit('/').next() {
                Some(last) if !last.is_empty() => last,
                _ => {
                    return Err(LabelError::invalid(
                        text,
                        LabelPart::Name,
                        "is required for the root package".into(),
                    ))
                }
            },
        };

        Ok(Label {
            repository: CompactString::new(repository),
            package: CompactString::new(package),
            name: CompactString::new(name),
        })
    }

    /// Name of the repository this label lives in, empty for the main repository.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Package path of this label, empty for the root package.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Target name of this label.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::parse(s)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.repository.is_empty() {
            write!(f, "@{}", self.repository)?;
        }
        write!(f, "//{}:{}", self.package, self.name)
    }
}

/// Errors from parsing a [`Label`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("label is empty")]
    Empty,
    #[error("label '{0}' must start with '//' or '@repository//'")]
    NotAbsolute(String),
    #[error("invalid {part} in label '{label}': {reason}")]
    Invalid {
        label: String,
        part: LabelPart,
        reason: CompactString,
    },
}

impl LabelError {
    fn invalid(label: &str, part: LabelPart, reason: CompactString) -> Self {
        LabelError::Invalid {
            label: label.to_string(),
            part,
            reason,
        }
    }
}

/// Portion of a label that failed validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LabelPart {
    Whole,
    Repository,
    Package,
    Name,
}

impl fmt::Display for LabelPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LabelPart::Whole => "character",
            LabelPart::Repository => "repository",
            LabelPart::Package => "package",
            LabelPart::Name => "target name",
        };
        f.write_str(s)
    }
}

/// Punctuation allowed in a package path component, in addition to alphanumerics.
static PACKAGE_CHARS: &[char] = &['_', '-', '.', '+', '=', '~'];
/// Punctuation allowed in a target name, in addition to alphanumerics and `/`.
static NAME_CHARS: &[char] = &['_', '-', '.', '+', '=', '~', '@'];

fn invalid_char(c: char) -> CompactString {
    compact_str::format_compact!("'{}' is not allowed", c.escape_default())
}

fn validate_repository(repository: &str) -> Result<(), CompactString> {
    match repository
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        Some(c) => Err(invalid_char(c)),
        None => Ok(()),
    }
}

/// Validates a `/` separated path, an empty path is considered valid.
fn validate_path(path: &str, allowed: &[char]) -> Result<(), CompactString> {
    if path.is_empty() {
        return Ok(());
    }
    for component in path.split('/') {
        match component {
            "" => return Err("contains an empty path component".into()),
            "." | ".." => return Err("contains a relative path component".into()),
            _ => (),
        }
        if let Some(c) = component
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || allowed.contains(c)))
        {
            return Err(invalid_char(c));
        }
    }
    Ok(())
}
