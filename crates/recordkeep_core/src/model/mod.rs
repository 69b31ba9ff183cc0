//! Typed record model shared by every entity kind.
//!
//! # Responsibility
//! - Name the entity kinds the store knows about.
//! - Define the [`Entity`] contract each record type implements so the store
//!   can persist, validate and index it without knowing its concrete shape.
//!
//! # Invariants
//! - Identifiers are unique within one [`EntityKind`].
//! - Foreign keys are one-directional; the reverse direction is resolved
//!   through the store's reference index, never through embedded objects.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod music;
pub mod real_estate;

/// Integer identifier of one record within its kind.
pub type RecordId = i64;

/// Every record kind persisted by the entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Property,
    ClientRequest,
    Country,
    Artist,
    Album,
    Track,
    Playlist,
    Category,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        Self::Property,
        Self::ClientRequest,
        Self::Country,
        Self::Artist,
        Self::Album,
        Self::Track,
        Self::Playlist,
        Self::Category,
    ];

    /// Stable storage/CLI name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::ClientRequest => "client_request",
            Self::Country => "country",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Track => "track",
            Self::Playlist => "playlist",
            Self::Category => "category",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    /// Accepts the snake_case name, with `-` tolerated in place of `_`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownKind(value.trim().to_string()))
    }
}

/// Reference from one record to another record of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignKey {
    pub kind: EntityKind,
    pub id: RecordId,
}

impl ForeignKey {
    pub fn new(kind: EntityKind, id: RecordId) -> Self {
        Self { kind, id }
    }
}

/// Scalar value of one named record field.
///
/// Used by field-level lookups (`find_by_field`) that are driven by a field
/// name chosen at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Integer(_) => FieldType::Integer,
            Self::Real(_) => FieldType::Real,
            Self::Text(_) => FieldType::Text,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Declared type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Real,
    Text,
}

impl FieldType {
    /// Parses caller text into a value of this type. Reals accept a decimal
    /// comma.
    pub fn parse(self, raw: &str) -> Result<FieldValue, ValidationError> {
        let trimmed = raw.trim();
        match self {
            Self::Integer => trimmed
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| ValidationError::InvalidNumber(raw.to_string())),
            Self::Real => trimmed
                .replace(',', ".")
                .parse::<f64>()
                .map(FieldValue::Real)
                .map_err(|_| ValidationError::InvalidNumber(raw.to_string())),
            Self::Text => Ok(FieldValue::Text(raw.to_string())),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

/// Contract implemented by every persisted record type.
///
/// The store keeps records as serialized documents keyed by `(KIND, id)`;
/// everything kind-specific (validation, foreign keys, field access) lives
/// behind this trait.
pub trait Entity: Serialize + DeserializeOwned + Clone {
    const KIND: EntityKind;
    /// Field names accepted by [`Entity::field`], with their declared types.
    const FIELDS: &'static [(&'static str, FieldType)];

    fn id(&self) -> RecordId;
    fn set_id(&mut self, id: RecordId);

    /// Foreign keys that must resolve when this record is written.
    fn references(&self) -> Vec<ForeignKey> {
        Vec::new()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn field(&self, name: &str) -> Option<FieldValue>;

    fn field_type(name: &str) -> Option<FieldType> {
        Self::FIELDS
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, field_type)| *field_type)
    }
}

/// Parses a caller-supplied identifier.
pub fn parse_record_id(raw: &str) -> Result<RecordId, ValidationError> {
    raw.trim()
        .parse::<RecordId>()
        .map_err(|_| ValidationError::InvalidId(raw.to_string()))
}

/// Field-level validation failures for caller input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(&'static str),
    OutOfRange {
        field: &'static str,
        message: String,
    },
    InvalidPhoneNumber(String),
    InvalidId(String),
    InvalidNumber(String),
    UnknownKind(String),
    UnknownField {
        kind: EntityKind,
        field: String,
    },
    UnknownRequestType(String),
    FieldCount {
        expected: usize,
        actual: usize,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "field `{field}` cannot be empty"),
            Self::OutOfRange { field, message } => write!(f, "field `{field}` {message}"),
            Self::InvalidPhoneNumber(value) => write!(f, "invalid phone number `{value}`"),
            Self::InvalidId(value) => write!(f, "invalid identifier `{value}`"),
            Self::InvalidNumber(value) => write!(f, "invalid number `{value}`"),
            Self::UnknownKind(value) => write!(f, "unknown entity kind `{value}`"),
            Self::UnknownField { kind, field } => {
                write!(f, "unknown field `{field}` for kind `{kind}`")
            }
            Self::UnknownRequestType(value) => write!(f, "unknown request type `{value}`"),
            Self::FieldCount { expected, actual } => {
                write!(f, "expected {expected} fields, got {actual}")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn assert_declared_field_types<T: Entity>(record: &T) {
    for (name, field_type) in T::FIELDS {
        let value = record
            .field(name)
            .unwrap_or_else(|| panic!("{} has no value for `{name}`", T::KIND));
        assert_eq!(value.field_type(), *field_type, "{}.{name}", T::KIND);
    }
    assert!(record.field("no_such_field").is_none());
}
