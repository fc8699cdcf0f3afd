//! Field values and media references collected by sub-forms

use crate::{FieldKind, FieldRole, FieldSpec, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value recorded in a sub-form field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Rating(u8),
    Checklist(Vec<String>),
    Flag(bool),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Rating(_) => FieldKind::Rating,
            FieldValue::Checklist(_) => FieldKind::Checklist,
            FieldValue::Flag(_) => FieldKind::Flag,
        }
    }

    /// Whether the value counts toward a required field.
    ///
    /// Blank text, an empty checklist and an unconfirmed flag do not.
    pub fn is_filled(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Rating(_) => true,
            FieldValue::Checklist(items) => !items.is_empty(),
            FieldValue::Flag(v) => *v,
        }
    }

    /// Check the value against the field it is recorded into
    pub fn validate_for(&self, spec: &FieldSpec) -> Result<(), ValidationError> {
        if self.kind() != spec.kind {
            return Err(ValidationError::KindMismatch {
                field: spec.key.to_string(),
                expected: spec.kind,
                found: self.kind(),
            });
        }
        match self {
            FieldValue::Rating(r) if !(1..=5).contains(r) => {
                Err(ValidationError::RatingOutOfRange {
                    field: spec.key.to_string(),
                    value: *r,
                })
            }
            FieldValue::Number(n) if !n.is_finite() || *n < 0.0 => {
                Err(ValidationError::InvalidNumber {
                    field: spec.key.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Parse user input according to the field kind.
    ///
    /// Checklists are comma separated; flags accept yes/no, true/false, 1/0.
    pub fn parse_as(kind: FieldKind, input: &str) -> Option<FieldValue> {
        let input = input.trim();
        match kind {
            FieldKind::Text => Some(FieldValue::Text(input.to_string())),
            FieldKind::Number => input.parse().ok().map(FieldValue::Number),
            FieldKind::Rating => input.parse().ok().map(FieldValue::Rating),
            FieldKind::Checklist => Some(FieldValue::Checklist(
                input
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            )),
            FieldKind::Flag => match input.to_ascii_lowercase().as_str() {
                "yes" | "y" | "true" | "1" => Some(FieldValue::Flag(true)),
                "no" | "n" | "false" | "0" => Some(FieldValue::Flag(false)),
                _ => None,
            },
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Rating(r) => write!(f, "{}/5", r),
            FieldValue::Checklist(items) => write!(f, "{}", items.join(", ")),
            FieldValue::Flag(v) => write!(f, "{}", if *v { "yes" } else { "no" }),
        }
    }
}

/// Kind of captured media
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn parse(s: &str) -> Option<MediaKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photo" | "image" => Some(MediaKind::Photo),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// A reference to an uploaded photo or video. The upload itself is
/// handled elsewhere; the workflow only keeps the reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaReference {
    pub kind: MediaKind,
    pub reference: String,
    pub captured_by: FieldRole,
    pub captured_at: DateTime<Utc>,
}

impl MediaReference {
    pub fn new(kind: MediaKind, reference: impl Into<String>, captured_by: FieldRole) -> Self {
        Self {
            kind,
            reference: reference.into(),
            captured_by,
            captured_at: Utc::now(),
        }
    }
}
