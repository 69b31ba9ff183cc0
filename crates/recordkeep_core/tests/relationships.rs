use recordkeep_core::db::open_db_in_memory;
use recordkeep_core::{
    Album, Artist, AssociationSet, Category, Country, EntityKind, EntityStore, Playlist,
    RemovePolicy, StoreConfig, StoreError, Track, PLAYLIST_TRACKS,
};

struct Catalog {
    country_id: i64,
    artist_id: i64,
    album_id: i64,
    category_id: i64,
    playlist_id: i64,
    first_track: i64,
    second_track: i64,
}

fn seed_catalog(store: &EntityStore<'_>) -> Catalog {
    let country_id = store.add(&Country::new("USA")).unwrap();
    let artist_id = store.add(&Artist::new("John", "Doe", country_id)).unwrap();
    let album_id = store
        .add(&Album::new("Example Album", 2023, "Rock", artist_id))
        .unwrap();
    let first_track = store.add(&Track::new("Example Track 1", 180, album_id)).unwrap();
    let second_track = store.add(&Track::new("Example Track 2", 240, album_id)).unwrap();
    let category_id = store.add(&Category::new("Favorites")).unwrap();
    let playlist_id = store.add(&Playlist::new("My Playlist", category_id)).unwrap();

    Catalog {
        country_id,
        artist_id,
        album_id,
        category_id,
        playlist_id,
        first_track,
        second_track,
    }
}

fn track_names(tracks: &[Track]) -> Vec<&str> {
    tracks.iter().map(|track| track.name.as_str()).collect()
}

#[test]
fn associations_follow_link_order_and_cascade_on_remove() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    let catalog = seed_catalog(&store);
    let index = store.relationships();

    assert!(index
        .link(PLAYLIST_TRACKS, catalog.playlist_id, catalog.first_track)
        .unwrap());
    assert!(index
        .link(PLAYLIST_TRACKS, catalog.playlist_id, catalog.second_track)
        .unwrap());

    let tracks: Vec<Track> = index
        .associations_for(PLAYLIST_TRACKS, EntityKind::Playlist, catalog.playlist_id)
        .unwrap();
    assert_eq!(track_names(&tracks), vec!["Example Track 1", "Example Track 2"]);

    assert!(store.remove(EntityKind::Track, catalog.first_track).unwrap());

    let tracks: Vec<Track> = index
        .associations_for(PLAYLIST_TRACKS, EntityKind::Playlist, catalog.playlist_id)
        .unwrap();
    assert_eq!(track_names(&tracks), vec!["Example Track 2"]);
    assert_eq!(
        index.link_count(EntityKind::Track, catalog.first_track).unwrap(),
        0
    );
}

#[test]
fn linking_twice_reports_existing_pair() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    let catalog = seed_catalog(&store);
    let index = store.relationships();

    assert!(index
        .link(PLAYLIST_TRACKS, catalog.playlist_id, catalog.first_track)
        .unwrap());
    assert!(!index
        .link(PLAYLIST_TRACKS, catalog.playlist_id, catalog.first_track)
        .unwrap());

    let ids = index
        .linked_ids(PLAYLIST_TRACKS, EntityKind::Playlist, catalog.playlist_id)
        .unwrap();
    assert_eq!(ids, vec![catalog.first_track]);
}

#[test]
fn link_to_missing_record_is_dangling_reference() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    let catalog = seed_catalog(&store);
    let index = store.relationships();

    let err = index
        .link(PLAYLIST_TRACKS, catalog.playlist_id, 404)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::DanglingReference {
            kind: EntityKind::Track,
            id: 404
        }
    ));

    let err = index
        .link(PLAYLIST_TRACKS, 404, catalog.first_track)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::DanglingReference {
            kind: EntityKind::Playlist,
            id: 404
        }
    ));
    assert_eq!(
        index.link_count(EntityKind::Track, catalog.first_track).unwrap(),
        0
    );
}

#[test]
fn unlink_removes_only_the_named_pair() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    let catalog = seed_catalog(&store);
    let index = store.relationships();

    index
        .link(PLAYLIST_TRACKS, catalog.playlist_id, catalog.first_track)
        .unwrap();
    index
        .link(PLAYLIST_TRACKS, catalog.playlist_id, catalog.second_track)
        .unwrap();

    assert!(index
        .unlink(PLAYLIST_TRACKS, catalog.playlist_id, catalog.first_track)
        .unwrap());
    assert!(!index
        .unlink(PLAYLIST_TRACKS, catalog.playlist_id, catalog.first_track)
        .unwrap());

    let ids = index
        .linked_ids(PLAYLIST_TRACKS, EntityKind::Playlist, catalog.playlist_id)
        .unwrap();
    assert_eq!(ids, vec![catalog.second_track]);
    assert!(store.contains(EntityKind::Track, catalog.first_track).unwrap());
}

#[test]
fn associations_resolve_from_either_side() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    let catalog = seed_catalog(&store);
    let index = store.relationships();
    let road_trip = store
        .add(&Playlist::new("Road Trip", catalog.category_id))
        .unwrap();

    index
        .link(PLAYLIST_TRACKS, road_trip, catalog.second_track)
        .unwrap();
    index
        .link(PLAYLIST_TRACKS, catalog.playlist_id, catalog.second_track)
        .unwrap();

    let playlists: Vec<Playlist> = index
        .associations_for(PLAYLIST_TRACKS, EntityKind::Track, catalog.second_track)
        .unwrap();
    let names: Vec<&str> = playlists.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Road Trip", "My Playlist"]);
}

#[test]
fn associations_reject_kinds_outside_the_set() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    let catalog = seed_catalog(&store);
    let index = store.relationships();

    let err = index
        .linked_ids(PLAYLIST_TRACKS, EntityKind::Album, catalog.album_id)
        .unwrap_err();
    assert!(matches!(err, StoreError::MalformedInput(_)));

    let err = index
        .associations_for::<Album>(PLAYLIST_TRACKS, EntityKind::Playlist, catalog.playlist_id)
        .unwrap_err();
    assert!(matches!(err, StoreError::MalformedInput(_)));
}

#[test]
fn referencing_walks_foreign_keys_backwards() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    let catalog = seed_catalog(&store);
    let index = store.relationships();

    let artists: Vec<Artist> = index
        .referencing(EntityKind::Country, catalog.country_id)
        .unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].id, catalog.artist_id);

    let tracks: Vec<Track> = index
        .referencing(EntityKind::Album, catalog.album_id)
        .unwrap();
    assert_eq!(track_names(&tracks), vec!["Example Track 1", "Example Track 2"]);

    // Moving a track to another album moves its reverse entry too.
    let other_album = store
        .add(&Album::new("B-Sides", 2024, "Rock", catalog.artist_id))
        .unwrap();
    store
        .update(
            catalog.first_track,
            &Track::new("Example Track 1", 180, other_album),
        )
        .unwrap();

    let tracks: Vec<Track> = index
        .referencing(EntityKind::Album, catalog.album_id)
        .unwrap();
    assert_eq!(track_names(&tracks), vec!["Example Track 2"]);
    let moved: Vec<Track> = index.referencing(EntityKind::Album, other_album).unwrap();
    assert_eq!(track_names(&moved), vec!["Example Track 1"]);
}

#[test]
fn reject_policy_refuses_removal_while_linked() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::with_config(
        &conn,
        StoreConfig {
            remove_policy: RemovePolicy::Reject,
        },
    )
    .unwrap();
    let catalog = seed_catalog(&store);
    let index = store.relationships();
    index
        .link(PLAYLIST_TRACKS, catalog.playlist_id, catalog.first_track)
        .unwrap();

    let err = store
        .remove(EntityKind::Track, catalog.first_track)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::StillReferenced {
            kind: EntityKind::Track,
            links: 1,
            ..
        }
    ));
    assert!(store.contains(EntityKind::Track, catalog.first_track).unwrap());

    index
        .unlink(PLAYLIST_TRACKS, catalog.playlist_id, catalog.first_track)
        .unwrap();
    assert!(store.remove(EntityKind::Track, catalog.first_track).unwrap());
}

#[test]
fn association_sets_are_found_by_name() {
    assert_eq!(AssociationSet::by_name("playlist_tracks"), Some(PLAYLIST_TRACKS));
    assert_eq!(AssociationSet::by_name("Playlist-Tracks"), Some(PLAYLIST_TRACKS));
    assert_eq!(AssociationSet::by_name("artist_fans"), None);
    assert_eq!(
        PLAYLIST_TRACKS.paired_kind(EntityKind::Track),
        Some(EntityKind::Playlist)
    );
    assert_eq!(PLAYLIST_TRACKS.paired_kind(EntityKind::Album), None);
}
