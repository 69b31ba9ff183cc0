//! Generic typed repository.

use crate::model::{Entity, FieldType, FieldValue, RecordId, ValidationError};
use crate::store::{EntityStore, RecordFilter, RecordIter, StoreResult};
use std::marker::PhantomData;

/// Typed CRUD facade for one record kind.
///
/// The store is injected at construction; repositories hold no other state.
pub struct Repository<'conn, T> {
    store: EntityStore<'conn>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Repository<'_, T> {}

impl<'conn, T: Entity> Repository<'conn, T> {
    pub fn new(store: EntityStore<'conn>) -> Self {
        Self {
            store,
            marker: PhantomData,
        }
    }

    pub fn store(&self) -> EntityStore<'conn> {
        self.store
    }

    /// Adds a record; `id = 0` asks the store to assign one.
    pub fn add(&self, record: &T) -> StoreResult<RecordId> {
        self.store.add(record)
    }

    pub fn get(&self, id: RecordId) -> StoreResult<Option<T>> {
        self.store.get(id)
    }

    /// Replaces all fields of record `id`; `Ok(false)` when absent.
    pub fn update(&self, id: RecordId, record: &T) -> StoreResult<bool> {
        self.store.update(id, record)
    }

    /// Removes record `id`; `Ok(false)` when absent.
    pub fn remove(&self, id: RecordId) -> StoreResult<bool> {
        self.store.remove(T::KIND, id)
    }

    pub fn list_all(&self) -> RecordIter<'conn, T> {
        self.store.list_all()
    }

    /// Collects every record, stopping at the first decode error.
    pub fn all(&self) -> StoreResult<Vec<T>> {
        self.list_all().collect()
    }

    pub fn filter<P>(&self, predicate: P) -> RecordFilter<'conn, T, P>
    where
        P: FnMut(&T) -> bool,
    {
        self.store.filter(predicate)
    }

    /// First record (in insertion order) accepted by `predicate`.
    pub fn find_first<P>(&self, predicate: P) -> StoreResult<Option<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.filter(predicate).next().transpose()
    }

    /// First record whose `field` equals `value` exactly.
    pub fn find_by_field(&self, field: &str, value: &FieldValue) -> StoreResult<Option<T>> {
        ensure_known_field::<T>(field)?;
        self.find_first(|record| record.field(field).as_ref() == Some(value))
    }

    /// Like [`Repository::find_by_field`], but `raw` is first parsed as the
    /// field's declared type.
    ///
    /// # Errors
    /// - `Validation` when `raw` does not parse as the field's type, whether
    ///   or not any record is stored.
    pub fn find_by_field_text(&self, field: &str, raw: &str) -> StoreResult<Option<T>> {
        let wanted = ensure_known_field::<T>(field)?.parse(raw)?;
        self.find_by_field(field, &wanted)
    }

    /// First record whose text `field` contains `needle` (case-sensitive).
    pub fn find_by_text_contains(&self, field: &str, needle: &str) -> StoreResult<Option<T>> {
        ensure_known_field::<T>(field)?;
        self.find_first(|record| {
            matches!(record.field(field), Some(FieldValue::Text(text)) if text.contains(needle))
        })
    }

    /// First record whose `name` field equals `name`.
    pub fn find_by_name(&self, name: &str) -> StoreResult<Option<T>> {
        self.find_by_field("name", &FieldValue::from(name))
    }
}

fn ensure_known_field<T: Entity>(field: &str) -> Result<FieldType, ValidationError> {
    T::field_type(field).ok_or_else(|| ValidationError::UnknownField {
        kind: T::KIND,
        field: field.to_string(),
    })
}
