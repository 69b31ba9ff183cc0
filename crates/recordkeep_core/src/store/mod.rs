//! Durable record storage and association bookkeeping.
//!
//! # Responsibility
//! - Persist typed records keyed by `(kind, id)` ([`EntityStore`]).
//! - Maintain association sets and the reverse foreign-key index
//!   ([`RelationshipIndex`]).
//!
//! # Invariants
//! - Expected conditions (absent id, duplicate pair) are values, not errors:
//!   `Option`/`bool` results.
//! - Multi-row writes run in one immediate transaction; a failed write leaves
//!   no trace.

use crate::db::schema::{current_user_version, table_exists, REQUIRED_TABLES, SCHEMA_VERSION};
use crate::db::DbError;
use crate::model::{EntityKind, RecordId, ValidationError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod entity_store;
mod relationship;

pub use entity_store::{EntityStore, RecordFilter, RecordIter, WriteBatch};
pub use relationship::{AssociationSet, RelationshipIndex, PLAYLIST_TRACKS};

pub type StoreResult<T> = Result<T, StoreError>;

/// What `remove` does with associations that still point at the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovePolicy {
    /// Drop every association touching the removed record.
    #[default]
    Cascade,
    /// Refuse the removal until the record is unlinked everywhere.
    Reject,
}

/// Explicit store configuration, passed at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub remove_policy: RemovePolicy,
}

/// Error returned by store, relationship and repository operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Validation(ValidationError),
    MalformedInput(String),
    DuplicateIdentifier {
        kind: EntityKind,
        id: RecordId,
    },
    /// A written record or link points at a record that does not exist.
    DanglingReference {
        kind: EntityKind,
        id: RecordId,
    },
    /// Removal rejected because associations or foreign keys still point at
    /// the record.
    StillReferenced {
        kind: EntityKind,
        id: RecordId,
        links: usize,
    },
    /// Persisted data cannot be decoded into its record type.
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl StoreError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Stable snake_case code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::MalformedInput(_) => "malformed_input",
            Self::DuplicateIdentifier { .. } => "duplicate_identifier",
            Self::DanglingReference { .. } | Self::StillReferenced { .. } => "dangling_reference",
            Self::InvalidData(_) => "corrupted_record",
            Self::Db(_) | Self::UninitializedConnection { .. } | Self::MissingRequiredTable(_) => {
                "storage_error"
            }
        }
    }

    /// Whether the error is a storage fault rather than a rejected request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Db(_)
                | Self::InvalidData(_)
                | Self::UninitializedConnection { .. }
                | Self::MissingRequiredTable(_)
        )
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::MalformedInput(message) => write!(f, "malformed input: {message}"),
            Self::DuplicateIdentifier { kind, id } => {
                write!(f, "{kind} #{id} already exists")
            }
            Self::DanglingReference { kind, id } => {
                write!(f, "referenced {kind} #{id} does not exist")
            }
            Self::StillReferenced { kind, id, links } => {
                write!(f, "{kind} #{id} is still referenced by {links} link(s)")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "record store requires table `{table}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let actual_version = current_user_version(conn)?;
    if actual_version != SCHEMA_VERSION {
        return Err(StoreError::UninitializedConnection {
            expected_version: SCHEMA_VERSION,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }

    Ok(())
}
