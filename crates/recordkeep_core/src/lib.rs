//! Core record-keeping logic for RecordKeep.
//! This crate is the single source of truth for record invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod store;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::music::{Album, Artist, Category, Country, Playlist, Track};
pub use model::real_estate::{ClientRequest, Property, PropertyVariant, RequestType};
pub use model::{
    parse_record_id, Entity, EntityKind, FieldType, FieldValue, ForeignKey, RecordId,
    ValidationError,
};
pub use repo::{
    AlbumRepository, ArtistRepository, CategoryRepository, ClientRequestRepository,
    CountryRepository, PlaylistRepository, PropertyRepository, Repository, TrackRepository,
};
pub use seed::{seed_music, seed_real_estate, SeedOutcome};
pub use store::{
    AssociationSet, EntityStore, RecordFilter, RecordIter, RelationshipIndex, RemovePolicy,
    StoreConfig, StoreError, StoreResult, WriteBatch, PLAYLIST_TRACKS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
