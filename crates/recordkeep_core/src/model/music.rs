//! Music catalog records.
//!
//! Artists belong to a country, albums to an artist, tracks to an album and
//! playlists to a category. Playlist membership is a many-to-many association
//! kept by the relationship index, not a field on either record.

use crate::model::{
    require_text, Entity, EntityKind, FieldType, FieldValue, ForeignKey, RecordId,
    ValidationError,
};
use serde::{Deserialize, Serialize};

const MAX_ALBUM_YEAR: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
}

impl Country {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }
}

impl Entity for Country {
    const KIND: EntityKind = EntityKind::Country;
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::Integer),
        ("name", FieldType::Text),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "name" => Some(FieldValue::Text(self.name.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub country_id: RecordId,
}

impl Artist {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        country_id: RecordId,
    ) -> Self {
        Self {
            id: 0,
            first_name: first_name.into(),
            last_name: last_name.into(),
            country_id,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Artist {
    const KIND: EntityKind = EntityKind::Artist;
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::Integer),
        ("first_name", FieldType::Text),
        ("last_name", FieldType::Text),
        ("country_id", FieldType::Integer),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn references(&self) -> Vec<ForeignKey> {
        vec![ForeignKey::new(EntityKind::Country, self.country_id)]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "first_name" => Some(FieldValue::Text(self.first_name.clone())),
            "last_name" => Some(FieldValue::Text(self.last_name.clone())),
            "country_id" => Some(FieldValue::Integer(self.country_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
    pub year: i32,
    pub genre: String,
    pub artist_id: RecordId,
}

impl Album {
    pub fn new(
        name: impl Into<String>,
        year: i32,
        genre: impl Into<String>,
        artist_id: RecordId,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            year,
            genre: genre.into(),
            artist_id,
        }
    }
}

impl Entity for Album {
    const KIND: EntityKind = EntityKind::Album;
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::Integer),
        ("name", FieldType::Text),
        ("year", FieldType::Integer),
        ("genre", FieldType::Text),
        ("artist_id", FieldType::Integer),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn references(&self) -> Vec<ForeignKey> {
        vec![ForeignKey::new(EntityKind::Artist, self.artist_id)]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        if !(1..=MAX_ALBUM_YEAR).contains(&self.year) {
            return Err(ValidationError::OutOfRange {
                field: "year",
                message: format!("must be between 1 and {MAX_ALBUM_YEAR}, got {}", self.year),
            });
        }
        Ok(())
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "name" => Some(FieldValue::Text(self.name.clone())),
            "year" => Some(FieldValue::Integer(i64::from(self.year))),
            "genre" => Some(FieldValue::Text(self.genre.clone())),
            "artist_id" => Some(FieldValue::Integer(self.artist_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
    pub duration_secs: u32,
    pub album_id: RecordId,
}

impl Track {
    pub fn new(name: impl Into<String>, duration_secs: u32, album_id: RecordId) -> Self {
        Self {
            id: 0,
            name: name.into(),
            duration_secs,
            album_id,
        }
    }

    /// Duration as `hh:mm:ss`.
    pub fn duration_text(&self) -> String {
        let hours = self.duration_secs / 3600;
        let minutes = (self.duration_secs % 3600) / 60;
        let seconds = self.duration_secs % 60;
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl Entity for Track {
    const KIND: EntityKind = EntityKind::Track;
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::Integer),
        ("name", FieldType::Text),
        ("duration_secs", FieldType::Integer),
        ("album_id", FieldType::Integer),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn references(&self) -> Vec<ForeignKey> {
        vec![ForeignKey::new(EntityKind::Album, self.album_id)]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "name" => Some(FieldValue::Text(self.name.clone())),
            "duration_secs" => Some(FieldValue::Integer(i64::from(self.duration_secs))),
            "album_id" => Some(FieldValue::Integer(self.album_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
    pub category_id: RecordId,
}

impl Playlist {
    pub fn new(name: impl Into<String>, category_id: RecordId) -> Self {
        Self {
            id: 0,
            name: name.into(),
            category_id,
        }
    }
}

impl Entity for Playlist {
    const KIND: EntityKind = EntityKind::Playlist;
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::Integer),
        ("name", FieldType::Text),
        ("category_id", FieldType::Integer),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn references(&self) -> Vec<ForeignKey> {
        vec![ForeignKey::new(EntityKind::Category, self.category_id)]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "name" => Some(FieldValue::Text(self.name.clone())),
            "category_id" => Some(FieldValue::Integer(self.category_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }
}

impl Entity for Category {
    const KIND: EntityKind = EntityKind::Category;
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::Integer),
        ("name", FieldType::Text),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "name" => Some(FieldValue::Text(self.name.clone())),
            _ => None,
        }
    }
}
