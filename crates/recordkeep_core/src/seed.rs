//! Sample datasets for the two record domains.
//!
//! # Responsibility
//! - Load the real-estate and music sample records on explicit request.
//!
//! # Invariants
//! - Seeding is never implicit: callers invoke it once at process start.
//! - A domain that already holds records is left untouched.
//! - Each domain loads in one transaction: fully or not at all.

use crate::model::music::{Album, Artist, Category, Country, Playlist, Track};
use crate::model::real_estate::{ClientRequest, Property, RequestType};
use crate::model::EntityKind;
use crate::store::{EntityStore, StoreResult, WriteBatch, PLAYLIST_TRACKS};
use log::info;

const REAL_ESTATE_KINDS: &[EntityKind] = &[EntityKind::Property, EntityKind::ClientRequest];
const MUSIC_KINDS: &[EntityKind] = &[
    EntityKind::Country,
    EntityKind::Artist,
    EntityKind::Album,
    EntityKind::Track,
    EntityKind::Playlist,
    EntityKind::Category,
];

/// Result of one seed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Loaded { records: usize },
    Skipped,
}

/// Loads three apartments and three client requests dated `requested_at`
/// (epoch ms).
pub fn seed_real_estate(store: &EntityStore<'_>, requested_at: i64) -> StoreResult<SeedOutcome> {
    let written = store.write_batch(|batch| {
        if has_records(batch, REAL_ESTATE_KINDS)? {
            return Ok(None);
        }

        let properties = [
            Property::apartment(1, "Подільський", 70.0, 2, 5, 70000.0, "вул. Подільська, 5"),
            Property::apartment(2, "Голосіївський", 90.0, 3, 7, 90000.0, "вул. Голосіївська, 12"),
            Property::apartment(3, "Печерський", 120.0, 4, 3, 120000.0, "вул. Печерська, 22"),
        ];
        for property in &properties {
            batch.add(property)?;
        }

        let requests = [
            (1, "Іван Іванов", RequestType::Purchase, "вул. Подільська, 5", "0661234567"),
            (2, "Петро Петров", RequestType::Exchange, "вул. Голосіївська, 12", "0671234567"),
            (3, "Сергій Сергієнко", RequestType::Sale, "вул. Печерська, 22", "0681234567"),
        ];
        for (id, full_name, request_type, address, phone_number) in requests {
            batch.add(&ClientRequest {
                id,
                full_name: full_name.to_string(),
                request_type,
                address: address.to_string(),
                phone_number: phone_number.to_string(),
                requested_at,
            })?;
        }

        Ok(Some(properties.len() + requests.len()))
    })?;

    Ok(outcome("real_estate", written))
}

/// Loads one artist with an album of two tracks, a `Favorites` category and a
/// playlist linking every track.
pub fn seed_music(store: &EntityStore<'_>) -> StoreResult<SeedOutcome> {
    let written = store.write_batch(|batch| {
        if has_records(batch, MUSIC_KINDS)? {
            return Ok(None);
        }

        let country_id = batch.add(&Country::new("USA"))?;
        let artist_id = batch.add(&Artist::new("John", "Doe", country_id))?;
        let album_id = batch.add(&Album::new("Example Album", 2023, "Rock", artist_id))?;
        let track_ids = [
            batch.add(&Track::new("Example Track 1", 180, album_id))?,
            batch.add(&Track::new("Example Track 2", 240, album_id))?,
        ];
        let favorites_id = batch.add(&Category::new("Favorites"))?;
        let playlist_id = batch.add(&Playlist::new("My Playlist", favorites_id))?;
        for track_id in track_ids {
            batch.link(PLAYLIST_TRACKS, playlist_id, track_id)?;
        }

        Ok(Some(5 + track_ids.len()))
    })?;

    Ok(outcome("music", written))
}

fn has_records(batch: &WriteBatch<'_>, kinds: &[EntityKind]) -> StoreResult<bool> {
    for kind in kinds {
        if batch.count(*kind)? > 0 {
            return Ok(true);
        }
    }
    Ok(false)
}

fn outcome(domain: &str, written: Option<usize>) -> SeedOutcome {
    match written {
        Some(records) => loaded(domain, records),
        None => skipped(domain),
    }
}

fn loaded(domain: &str, records: usize) -> SeedOutcome {
    info!("event=seed_load module=seed status=ok domain={domain} records={records}");
    SeedOutcome::Loaded { records }
}

fn skipped(domain: &str) -> SeedOutcome {
    info!("event=seed_load module=seed status=skipped domain={domain} reason=not_empty");
    SeedOutcome::Skipped
}
