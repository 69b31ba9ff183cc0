use recordkeep_core::db::open_db_in_memory;
use recordkeep_core::{
    seed_music, seed_real_estate, AlbumRepository, ArtistRepository, CategoryRepository,
    ClientRequestRepository, EntityKind, EntityStore, FieldValue, PlaylistRepository, Property,
    PropertyRepository, SeedOutcome, StoreError, TrackRepository, ValidationError,
};

const REQUESTED_AT: i64 = 1_700_000_000_000;

#[test]
fn find_by_phone_returns_matching_request() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    seed_real_estate(&store, REQUESTED_AT).unwrap();
    let requests = ClientRequestRepository::new(store);

    let found = requests.find_by_phone("0661234567").unwrap().unwrap();
    assert_eq!(found.full_name, "Іван Іванов");
    assert_eq!(found.requested_at, REQUESTED_AT);

    assert!(requests.find_by_phone("0000000000").unwrap().is_none());
}

#[test]
fn find_by_surname_matches_substring() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    seed_real_estate(&store, REQUESTED_AT).unwrap();
    let requests = ClientRequestRepository::new(store);

    let found = requests.find_by_surname("Петров").unwrap().unwrap();
    assert_eq!(found.phone_number, "0671234567");
    assert!(requests.find_by_surname("Шевченко").unwrap().is_none());
}

#[test]
fn find_by_field_parses_value_by_field_type() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    seed_real_estate(&store, REQUESTED_AT).unwrap();
    let properties = PropertyRepository::new(store);

    let by_rooms = properties.find_by_field_text("rooms", "3").unwrap().unwrap();
    assert_eq!(by_rooms.district, "Голосіївський");

    let by_area = properties.find_by_field_text("area", "120,0").unwrap().unwrap();
    assert_eq!(by_area.district, "Печерський");

    let by_district = properties
        .find_by_field("district", &FieldValue::from("Подільський"))
        .unwrap()
        .unwrap();
    assert_eq!(by_district.id, 1);

    assert!(properties
        .find_by_field_text("rooms", "9")
        .unwrap()
        .is_none());
}

#[test]
fn find_by_field_rejects_unknown_field_and_bad_number() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    seed_real_estate(&store, REQUESTED_AT).unwrap();
    let properties = PropertyRepository::new(store);

    let err = properties.find_by_field_text("balcony", "yes").unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::UnknownField {
            kind: EntityKind::Property,
            ..
        })
    ));

    let err = properties.find_by_field_text("rooms", "two").unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::InvalidNumber(_))
    ));
    assert_eq!(err.code(), "malformed_input");
}

#[test]
fn find_by_field_validates_input_on_empty_store() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    let properties = PropertyRepository::new(store);

    let err = properties.find_by_field_text("rooms", "two").unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::InvalidNumber(_))
    ));
    assert_eq!(err.code(), "malformed_input");

    let err = properties.find_by_field_text("balcony", "yes").unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::UnknownField { .. })
    ));

    assert!(properties.find_by_field_text("area", "70,5").unwrap().is_none());
}

#[test]
fn find_by_text_contains_matches_text_fields_only() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    seed_real_estate(&store, REQUESTED_AT).unwrap();
    let properties = PropertyRepository::new(store);

    let found = properties
        .find_by_text_contains("address", "Печерська")
        .unwrap()
        .unwrap();
    assert_eq!(found.id, 3);
    assert!(properties
        .find_by_text_contains("rooms", "2")
        .unwrap()
        .is_none());
}

#[test]
fn describe_uses_apartment_template() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    let properties = PropertyRepository::new(store);
    let id = properties
        .add(&Property::apartment(0, "Подільський", 70.0, 2, 5, 70000.0, "вул. Подільська, 5"))
        .unwrap();

    let description = properties.describe(id).unwrap().unwrap();
    assert!(description.contains("Подільський"));
    assert!(description.contains("70000"));
    assert!(description.starts_with("Адреса: вул. Подільська, 5"));

    assert!(properties.describe(id + 1).unwrap().is_none());
}

#[test]
fn repository_filter_and_update_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    seed_real_estate(&store, REQUESTED_AT).unwrap();
    let properties = PropertyRepository::new(store);

    let cheap: Vec<i64> = properties
        .filter(|property| property.price < 100000.0)
        .map(|item| item.unwrap().id)
        .collect();
    assert_eq!(cheap, vec![1, 2]);

    let mut pechersky = properties.get(3).unwrap().unwrap();
    pechersky.price = 95000.0;
    assert!(properties.update(3, &pechersky).unwrap());

    let cheap_count = properties
        .filter(|property| property.price < 100000.0)
        .count();
    assert_eq!(cheap_count, 3);

    assert!(properties.remove(3).unwrap());
    assert_eq!(properties.all().unwrap().len(), 2);
}

#[test]
fn seed_music_builds_linked_catalog() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();

    let outcome = seed_music(&store).unwrap();
    assert_eq!(outcome, SeedOutcome::Loaded { records: 7 });

    let usa = recordkeep_core::CountryRepository::new(store)
        .find_by_name("USA")
        .unwrap()
        .unwrap();
    let artists = ArtistRepository::new(store).by_country(usa.id).unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].full_name(), "John Doe");

    let albums = AlbumRepository::new(store).by_artist(artists[0].id).unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].year, 2023);

    let tracks = TrackRepository::new(store).by_album(albums[0].id).unwrap();
    assert_eq!(tracks.len(), 2);

    let favorites = CategoryRepository::new(store)
        .find_by_name("Favorites")
        .unwrap()
        .unwrap();
    let playlists = PlaylistRepository::new(store);
    let in_favorites = playlists.by_category(favorites.id).unwrap();
    assert_eq!(in_favorites.len(), 1);

    let playlist_tracks = playlists.tracks(in_favorites[0].id).unwrap();
    assert_eq!(playlist_tracks, tracks);

    let containing = TrackRepository::new(store).playlists(tracks[1].id).unwrap();
    assert_eq!(containing, in_favorites);
}

#[test]
fn failed_seed_leaves_no_partial_catalog() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER fail_second_track BEFORE INSERT ON records
         WHEN NEW.kind = 'track' AND NEW.body LIKE '%Example Track 2%'
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .unwrap();

    let err = seed_music(&store).unwrap_err();
    assert_eq!(err.code(), "storage_error");
    for kind in [
        EntityKind::Country,
        EntityKind::Artist,
        EntityKind::Album,
        EntityKind::Track,
        EntityKind::Category,
        EntityKind::Playlist,
    ] {
        assert_eq!(store.count(kind).unwrap(), 0, "{kind} left behind");
    }

    conn.execute_batch("DROP TRIGGER fail_second_track;").unwrap();
    assert_eq!(
        seed_music(&store).unwrap(),
        SeedOutcome::Loaded { records: 7 }
    );
    assert_eq!(store.count(EntityKind::Track).unwrap(), 2);
}

#[test]
fn seeding_twice_is_skipped() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();

    assert_eq!(
        seed_real_estate(&store, REQUESTED_AT).unwrap(),
        SeedOutcome::Loaded { records: 6 }
    );
    assert_eq!(
        seed_real_estate(&store, REQUESTED_AT).unwrap(),
        SeedOutcome::Skipped
    );
    assert_eq!(store.count(EntityKind::Property).unwrap(), 3);
    assert_eq!(store.count(EntityKind::ClientRequest).unwrap(), 3);

    seed_music(&store).unwrap();
    assert_eq!(seed_music(&store).unwrap(), SeedOutcome::Skipped);
    assert_eq!(store.count(EntityKind::Track).unwrap(), 2);
}

#[test]
fn playlist_render_lists_category_and_durations() {
    let conn = open_db_in_memory().unwrap();
    let store = EntityStore::try_new(&conn).unwrap();
    seed_music(&store).unwrap();
    let playlists = PlaylistRepository::new(store);
    let playlist = playlists.find_by_name("My Playlist").unwrap().unwrap();

    let rendered = playlists.render(playlist.id).unwrap().unwrap();
    assert_eq!(
        rendered,
        "Playlist: My Playlist (Favorites)\n\
         - Example Track 1 (00:03:00)\n\
         - Example Track 2 (00:04:00)"
    );

    let first = TrackRepository::new(store)
        .find_by_name("Example Track 1")
        .unwrap()
        .unwrap();
    assert!(playlists.remove_track(playlist.id, first.id).unwrap());
    let rendered = playlists.render(playlist.id).unwrap().unwrap();
    assert_eq!(
        rendered,
        "Playlist: My Playlist (Favorites)\n- Example Track 2 (00:04:00)"
    );

    assert!(playlists.render(playlist.id + 100).unwrap().is_none());
}
