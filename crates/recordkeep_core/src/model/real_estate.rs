//! Real-estate listing records.
//!
//! # Responsibility
//! - Define `Property` (tagged by [`PropertyVariant`]) and `ClientRequest`.
//! - Render property descriptions through a per-variant formatter table.
//!
//! # Invariants
//! - `Property::describe` is pure and only reads the record's own fields.
//! - Adding a variant touches this module only; the store and repositories
//!   are unaware of variants.

use crate::model::{
    require_text, Entity, EntityKind, FieldType, FieldValue, RecordId, ValidationError,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid phone regex"));

/// Variant tag selecting how a property is described.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyVariant {
    #[default]
    Apartment,
}

type Describer = fn(&Property) -> String;

impl PropertyVariant {
    fn describer(self) -> Describer {
        match self {
            Self::Apartment => describe_apartment,
        }
    }
}

/// One listed property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub variant: PropertyVariant,
    pub district: String,
    /// Floor area in square metres.
    pub area: f64,
    pub rooms: u32,
    pub floor: i32,
    /// Asking price in hryvnias.
    pub price: f64,
    pub address: String,
}

impl Property {
    /// Builds an apartment listing; `id = 0` asks the store to assign one.
    pub fn apartment(
        id: RecordId,
        district: impl Into<String>,
        area: f64,
        rooms: u32,
        floor: i32,
        price: f64,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id,
            variant: PropertyVariant::Apartment,
            district: district.into(),
            area,
            rooms,
            floor,
            price,
            address: address.into(),
        }
    }

    /// Human-readable summary, formatted by the record's variant.
    pub fn describe(&self) -> String {
        (self.variant.describer())(self)
    }
}

fn describe_apartment(property: &Property) -> String {
    format!(
        "Адреса: {}, район: {}, площа: {} кв.м, кімнат: {}, поверх: {}, ціна: {} грн.",
        property.address,
        property.district,
        format_uk_number(property.area),
        property.rooms,
        property.floor,
        format_uk_number(property.price),
    )
}

/// Formats a number the way the uk-UA locale prints it: no trailing `.0`
/// for whole values and a decimal comma otherwise.
pub fn format_uk_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string().replace('.', ",")
    }
}

impl Entity for Property {
    const KIND: EntityKind = EntityKind::Property;
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::Integer),
        ("variant", FieldType::Text),
        ("district", FieldType::Text),
        ("area", FieldType::Real),
        ("rooms", FieldType::Integer),
        ("floor", FieldType::Integer),
        ("price", FieldType::Real),
        ("address", FieldType::Text),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("district", &self.district)?;
        require_text("address", &self.address)?;
        if !self.area.is_finite() || self.area <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "area",
                message: format!("must be a positive number, got {}", self.area),
            });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "price",
                message: format!("must not be negative, got {}", self.price),
            });
        }
        Ok(())
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "id" => FieldValue::Integer(self.id),
            "variant" => FieldValue::Text(
                match self.variant {
                    PropertyVariant::Apartment => "apartment",
                }
                .to_string(),
            ),
            "district" => FieldValue::Text(self.district.clone()),
            "area" => FieldValue::Real(self.area),
            "rooms" => FieldValue::Integer(i64::from(self.rooms)),
            "floor" => FieldValue::Integer(i64::from(self.floor)),
            "price" => FieldValue::Real(self.price),
            "address" => FieldValue::Text(self.address.clone()),
            _ => return None,
        };
        Some(value)
    }
}

/// Kind of deal a client asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// обмін
    Exchange,
    /// купівля
    Purchase,
    /// продаж
    Sale,
}

impl RequestType {
    /// Ukrainian label shown in request forms.
    pub fn label(self) -> &'static str {
        match self {
            Self::Exchange => "обмін",
            Self::Purchase => "купівля",
            Self::Sale => "продаж",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Exchange => "exchange",
            Self::Purchase => "purchase",
            Self::Sale => "sale",
        }
    }
}

impl Display for RequestType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RequestType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "exchange" | "обмін" => Ok(Self::Exchange),
            "purchase" | "купівля" => Ok(Self::Purchase),
            "sale" | "продаж" => Ok(Self::Sale),
            _ => Err(ValidationError::UnknownRequestType(value.trim().to_string())),
        }
    }
}

/// A client's buy/sell/exchange request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {
    #[serde(default)]
    pub id: RecordId,
    pub full_name: String,
    pub request_type: RequestType,
    pub address: String,
    pub phone_number: String,
    /// Unix epoch milliseconds.
    pub requested_at: i64,
}

impl ClientRequest {
    /// Number of comma-separated fields in the free-text request form.
    pub const FREE_TEXT_FIELDS: usize = 4;

    /// Parses `full name, request type, address, phone` free-text input.
    ///
    /// The address may itself contain commas (`вул. Подільська, 5`): the
    /// first two and the last field are positional, everything between them
    /// is the address.
    pub fn from_free_text(text: &str, requested_at: i64) -> Result<Self, ValidationError> {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        if parts.len() < Self::FREE_TEXT_FIELDS {
            return Err(ValidationError::FieldCount {
                expected: Self::FREE_TEXT_FIELDS,
                actual: parts.len(),
            });
        }

        let last = parts.len() - 1;
        let request = Self {
            id: 0,
            full_name: parts[0].to_string(),
            request_type: parts[1].parse()?,
            address: parts[2..last].join(", "),
            phone_number: parts[last].to_string(),
            requested_at,
        };
        request.validate()?;
        Ok(request)
    }
}

impl Entity for ClientRequest {
    const KIND: EntityKind = EntityKind::ClientRequest;
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::Integer),
        ("full_name", FieldType::Text),
        ("request_type", FieldType::Text),
        ("address", FieldType::Text),
        ("phone_number", FieldType::Text),
        ("requested_at", FieldType::Integer),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("full_name", &self.full_name)?;
        require_text("address", &self.address)?;
        if !PHONE_RE.is_match(&self.phone_number) {
            return Err(ValidationError::InvalidPhoneNumber(
                self.phone_number.clone(),
            ));
        }
        Ok(())
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "id" => FieldValue::Integer(self.id),
            "full_name" => FieldValue::Text(self.full_name.clone()),
            "request_type" => FieldValue::Text(self.request_type.as_str().to_string()),
            "address" => FieldValue::Text(self.address.clone()),
            "phone_number" => FieldValue::Text(self.phone_number.clone()),
            "requested_at" => FieldValue::Integer(self.requested_at),
            _ => return None,
        };
        Some(value)
    }
}
