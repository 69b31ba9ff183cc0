//! Music catalog lookups.
//!
//! Reverse navigation (country → artists, artist → albums, …) goes through
//! the reference index; playlist membership goes through [`PLAYLIST_TRACKS`].

use crate::model::music::{Album, Artist, Category, Playlist, Track};
use crate::model::{EntityKind, RecordId};
use crate::repo::Repository;
use crate::store::{StoreResult, PLAYLIST_TRACKS};

impl Repository<'_, Artist> {
    pub fn by_country(&self, country_id: RecordId) -> StoreResult<Vec<Artist>> {
        self.store()
            .relationships()
            .referencing(EntityKind::Country, country_id)
    }
}

impl Repository<'_, Album> {
    pub fn by_artist(&self, artist_id: RecordId) -> StoreResult<Vec<Album>> {
        self.store()
            .relationships()
            .referencing(EntityKind::Artist, artist_id)
    }
}

impl Repository<'_, Track> {
    pub fn by_album(&self, album_id: RecordId) -> StoreResult<Vec<Track>> {
        self.store()
            .relationships()
            .referencing(EntityKind::Album, album_id)
    }

    /// Playlists containing track `track_id`, in link order.
    pub fn playlists(&self, track_id: RecordId) -> StoreResult<Vec<Playlist>> {
        self.store()
            .relationships()
            .associations_for(PLAYLIST_TRACKS, EntityKind::Track, track_id)
    }
}

impl Repository<'_, Playlist> {
    pub fn by_category(&self, category_id: RecordId) -> StoreResult<Vec<Playlist>> {
        self.store()
            .relationships()
            .referencing(EntityKind::Category, category_id)
    }

    /// Tracks of playlist `playlist_id`, in link order.
    pub fn tracks(&self, playlist_id: RecordId) -> StoreResult<Vec<Track>> {
        self.store()
            .relationships()
            .associations_for(PLAYLIST_TRACKS, EntityKind::Playlist, playlist_id)
    }

    pub fn add_track(&self, playlist_id: RecordId, track_id: RecordId) -> StoreResult<bool> {
        self.store()
            .relationships()
            .link(PLAYLIST_TRACKS, playlist_id, track_id)
    }

    pub fn remove_track(&self, playlist_id: RecordId, track_id: RecordId) -> StoreResult<bool> {
        self.store()
            .relationships()
            .unlink(PLAYLIST_TRACKS, playlist_id, track_id)
    }

    /// Text listing of a playlist: a header line with its category, then one
    /// `- name (hh:mm:ss)` line per track.
    pub fn render(&self, playlist_id: RecordId) -> StoreResult<Option<String>> {
        let Some(playlist) = self.get(playlist_id)? else {
            return Ok(None);
        };
        let category = self
            .store()
            .get::<Category>(playlist.category_id)?
            .map(|category| category.name)
            .unwrap_or_default();

        let mut lines = vec![format!("Playlist: {} ({category})", playlist.name)];
        for track in self.tracks(playlist_id)? {
            lines.push(format!("- {} ({})", track.name, track.duration_text()));
        }
        Ok(Some(lines.join("\n")))
    }
}
