//! Parsing, validating, and formatting of build setting values.
//!
//! Every [`SettingType`] has a textual form. [`ValueCodec::parse`] turns a [`RawValue`] into a
//! [`ResolvedValue`] and [`ValueCodec::format`] goes the other way, such that for any value `v`
//! produced by `parse`, `parse(format(v)) == v`. Formatting a label drops the output of its
//! target, only the canonical label text is kept.

use std::num::IntErrorKind;

use compact_str::CompactString;
use pb_types::{Label, LabelError};

use crate::value::{RawValue, ResolvedLabel, ResolvedValue, SettingType};

/// Delimiter for `string_list` values when none is configured.
pub const DEFAULT_DELIMITER: &str = ",";
/// Delimiter for `label_list` values, labels can never contain a comma.
pub const LABEL_LIST_DELIMITER: &str = ",";

/// Accepted boolean literals, compared case-insensitively.
static TRUE_LITERALS: &[&str] = &["true", "1", "yes"];
static FALSE_LITERALS: &[&str] = &["false", "0", "no"];

/// Per-type parse and format logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCodec {
    /// Delimiter used to split `string_list` values.
    delimiter: CompactString,
}

impl Default for ValueCodec {
    fn default() -> Self {
        ValueCodec {
            delimiter: CompactString::const_new(DEFAULT_DELIMITER),
        }
    }
}

impl ValueCodec {
    /// Create a [`ValueCodec`] that splits `string_list` values on `delimiter`.
    ///
    /// # Errors
    ///
    /// * If `delimiter` is empty.
    pub fn new(delimiter: &str) -> Result<Self, anyhow::Error> {
        if delimiter.is_empty() {
            anyhow::bail!("string list delimiter must not be empty");
        }
        Ok(ValueCodec {
            delimiter: CompactString::new(delimiter),
        })
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Split the literal `text` into the items of a list of type `ty`.
    ///
    /// Empty text yields an empty list, not a list with a single empty item.
    pub fn split(&self, ty: SettingType, text: &str) -> Vec<CompactString> {
        if text.is_empty() {
            return Vec::new();
        }
        let delimiter = match ty {
            SettingType::LabelList => LABEL_LIST_DELIMITER,
            _ => self.delimiter.as_str(),
        };
        text.split(delimiter).map(CompactString::new).collect()
    }

    /// Parse and validate `raw` as a value of type `ty`.
    ///
    /// Labels are only validated syntactically, their targets are not evaluated.
    pub fn parse(&self, ty: SettingType, raw: &RawValue) -> Result<ResolvedValue, ParseError> {
        let value = match ty {
            SettingType::Int => {
                let text = expect_text(ty, raw, &self.delimiter)?;
                let val = text.parse::<i64>().map_err(|err| {
                    let reason = match err.kind() {
                        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                            "out of range for a 64-bit signed integer"
                        }
                        IntErrorKind::Empty => "expected an integer, found nothing",
                        _ => "not a base-10 integer",
                    };
                    ParseError::invalid(ty, text, reason)
                })?;
                ResolvedValue::Int(val)
            }
            SettingType::Bool => {
                let text = expect_text(ty, raw, &self.delimiter)?;
                let matches = |candidates: &[&str]| {
                    candidates
                        .iter()
                        .any(|literal| text.eq_ignore_ascii_case(literal))
                };
                if matches(TRUE_LITERALS) {
                    ResolvedValue::Bool(true)
                } else if matches(FALSE_LITERALS) {
                    ResolvedValue::Bool(false)
                } else {
                    return Err(ParseError::invalid(
                        ty,
                        text,
                        "expected one of true, false, 1, 0, yes, no",
                    ));
                }
            }
            SettingType::String => {
                let text = expect_text(ty, raw, &self.delimiter)?;
                ResolvedValue::String(text.clone())
            }
            SettingType::StringList => {
                let items = match raw {
                    RawValue::Text(text) => self.split(ty, text),
                    RawValue::List(items) => items.clone(),
                };
                ResolvedValue::StringList(items)
            }
            SettingType::Label => {
                let text = expect_text(ty, raw, &self.delimiter)?;
                ResolvedValue::Label(parse_label(text)?)
            }
            SettingType::LabelList => {
                let items = match raw {
                    RawValue::Text(text) => self.split(ty, text),
                    RawValue::List(items) => items.clone(),
                };
                let labels = items
                    .iter()
                    .map(|item| parse_label(item))
                    .collect::<Result<_, _>>()?;
                ResolvedValue::LabelList(labels)
            }
        };

        Ok(value)
    }

    /// Format `value` as a [`RawValue`] of type `ty`.
    ///
    /// List types are formatted as [`RawValue::List`] so items containing the delimiter survive.
    ///
    /// # Errors
    ///
    /// * If `value` is not of type `ty`.
    pub fn format(&self, ty: SettingType, value: &ResolvedValue) -> Result<RawValue, ParseError> {
        let found = value.setting_type();
        if found != ty {
            return Err(ParseError::TypeMismatch {
                expected: ty,
                found,
            });
        }

        let raw = match value {
            ResolvedValue::Int(val) => RawValue::Text(compact_str::format_compact!("{val}")),
            ResolvedValue::Bool(val) => RawValue::text(if *val { "true" } else { "false" }),
            ResolvedValue::String(val) => RawValue::Text(val.clone()),
            ResolvedValue::StringList(vals) => RawValue::List(vals.clone()),
            ResolvedValue::Label(val) => RawValue::Text(canonical(val)),
            ResolvedValue::LabelList(vals) => RawValue::List(vals.iter().map(canonical).collect()),
        };
        Ok(raw)
    }
}

fn canonical(label: &ResolvedLabel) -> CompactString {
    compact_str::format_compact!("{}", label.label())
}

fn expect_text<'a>(
    ty: SettingType,
    raw: &'a RawValue,
    delimiter: &str,
) -> Result<&'a CompactString, ParseError> {
    match raw {
        RawValue::Text(text) => Ok(text),
        RawValue::List(_) => Err(ParseError::invalid(
            ty,
            &raw.literal(delimiter),
            "expected a single value, found a list",
        )),
    }
}

fn parse_label(text: &str) -> Result<ResolvedLabel, ParseError> {
    let label = Label::parse(text).map_err(|source| ParseError::InvalidLabelSyntax {
        literal: text.to_string(),
        source,
    })?;
    Ok(ResolvedLabel::unresolved(label))
}

/// Errors from parsing or formatting a value, before it is attributed to a setting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid {ty} value '{literal}': {reason}")]
    InvalidValue {
        ty: SettingType,
        literal: String,
        reason: &'static str,
    },
    #[error("invalid label '{literal}': {source}")]
    InvalidLabelSyntax { literal: String, source: LabelError },
    #[error("expected a {expected} value, found a {found} value")]
    TypeMismatch {
        expected: SettingType,
        found: SettingType,
    },
}

impl ParseError {
    fn invalid(ty: SettingType, literal: &str, reason: &'static str) -> Self {
        ParseError::InvalidValue {
            ty,
            literal: literal.to_string(),
            reason,
        }
    }
}
