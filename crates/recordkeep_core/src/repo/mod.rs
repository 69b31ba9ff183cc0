//! Repository layer: typed facades over the entity store.
//!
//! # Responsibility
//! - Give every entity kind a typed CRUD + filter surface.
//! - Host kind-specific lookups (surname, phone, reverse foreign keys,
//!   playlist membership).
//!
//! # Invariants
//! - Read operations never write.
//! - Writes go through [`crate::store::EntityStore`] and are all-or-nothing.

pub mod music;
pub mod real_estate;
mod repository;

pub use repository::Repository;

use crate::model::music::{Album, Artist, Category, Country, Playlist, Track};
use crate::model::real_estate::{ClientRequest, Property};

pub type PropertyRepository<'conn> = Repository<'conn, Property>;
pub type ClientRequestRepository<'conn> = Repository<'conn, ClientRequest>;
pub type CountryRepository<'conn> = Repository<'conn, Country>;
pub type ArtistRepository<'conn> = Repository<'conn, Artist>;
pub type AlbumRepository<'conn> = Repository<'conn, Album>;
pub type TrackRepository<'conn> = Repository<'conn, Track>;
pub type PlaylistRepository<'conn> = Repository<'conn, Playlist>;
pub type CategoryRepository<'conn> = Repository<'conn, Category>;
