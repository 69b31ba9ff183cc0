//! Typed record storage over the `records` table.
//!
//! # Responsibility
//! - Add/get/update/remove records of any [`Entity`] kind by identifier.
//! - Enumerate records lazily in insertion order, optionally filtered.
//! - Keep `record_refs` in sync with each record's foreign keys.
//!
//! # Invariants
//! - `(kind, id)` is unique; ids requested as `0` (or below) are assigned
//!   above the kind's high-water mark, so removed ids are never handed out
//!   again.
//! - Foreign keys must resolve at write time.
//! - A record body always carries the same id as its row.

use super::relationship::{
    count_links, insert_link, purge_links, AssociationSet, RelationshipIndex,
};
use super::{ensure_store_connection_ready, RemovePolicy, StoreConfig, StoreError, StoreResult};
use crate::model::{Entity, EntityKind, ForeignKey, RecordId};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::VecDeque;
use std::marker::PhantomData;

const PAGE_SIZE: usize = 64;

/// SQLite-backed entity store.
///
/// Holds a borrowed connection; cheap to copy into repositories.
#[derive(Clone, Copy)]
pub struct EntityStore<'conn> {
    conn: &'conn Connection,
    config: StoreConfig,
}

impl<'conn> EntityStore<'conn> {
    /// Creates a store with the default (cascade) configuration.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        Self::with_config(conn, StoreConfig::default())
    }

    /// Creates a store from a bootstrapped connection and explicit config.
    pub fn with_config(conn: &'conn Connection, config: StoreConfig) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn, config })
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    pub(crate) fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Association and reverse-reference lookups over this store.
    pub fn relationships(&self) -> RelationshipIndex<'conn> {
        RelationshipIndex::new(*self)
    }

    /// Persists a new record and returns its effective id.
    ///
    /// # Errors
    /// - `Validation` when the record fails its own validation.
    /// - `DuplicateIdentifier` when a positive caller id is already taken.
    /// - `DanglingReference` when a foreign key does not resolve.
    pub fn add<T: Entity>(&self, record: &T) -> StoreResult<RecordId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id = insert_record(&tx, record)?;
        tx.commit()?;

        info!(
            "event=record_add module=store status=ok kind={} id={}",
            T::KIND,
            id
        );
        Ok(id)
    }

    /// Runs `work` inside one immediate transaction. Every write staged
    /// through the [`WriteBatch`] lands together, or none does.
    pub fn write_batch<R>(
        &self,
        work: impl FnOnce(&mut WriteBatch<'_>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut batch = WriteBatch {
            conn: &tx,
            writes: 0,
        };
        let outcome = work(&mut batch)?;
        let writes = batch.writes;
        tx.commit()?;

        info!("event=batch_write module=store status=ok writes={writes}");
        Ok(outcome)
    }

    /// Loads one record, `None` when the id is absent.
    pub fn get<T: Entity>(&self, id: RecordId) -> StoreResult<Option<T>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM records WHERE kind = ?1 AND id = ?2;",
                params![T::KIND.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| decode_record(T::KIND, id, &body))
            .transpose()
    }

    pub fn contains(&self, kind: EntityKind, id: RecordId) -> StoreResult<bool> {
        record_exists(self.conn, kind, id)
    }

    /// Replaces the fields of an existing record; its id is kept.
    ///
    /// Returns `Ok(false)` without touching anything when `id` is absent.
    pub fn update<T: Entity>(&self, id: RecordId, record: &T) -> StoreResult<bool> {
        record.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !record_exists(&tx, T::KIND, id)? {
            return Ok(false);
        }

        let mut stored = record.clone();
        stored.set_id(id);
        let references = stored.references();
        ensure_references_exist(&tx, &references)?;

        tx.execute(
            "UPDATE records SET body = ?3 WHERE kind = ?1 AND id = ?2;",
            params![T::KIND.as_str(), id, encode_record(&stored)?],
        )?;
        tx.execute(
            "DELETE FROM record_refs WHERE source_kind = ?1 AND source_id = ?2;",
            params![T::KIND.as_str(), id],
        )?;
        write_references(&tx, T::KIND, id, &references)?;
        tx.commit()?;

        info!(
            "event=record_update module=store status=ok kind={} id={}",
            T::KIND,
            id
        );
        Ok(true)
    }

    /// Deletes a record if present, applying the configured remove policy to
    /// associations that touch it.
    ///
    /// # Errors
    /// - `StillReferenced` while other records' foreign keys point at the
    ///   record, and under [`RemovePolicy::Reject`] also while associations
    ///   touch it.
    pub fn remove(&self, kind: EntityKind, id: RecordId) -> StoreResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !record_exists(&tx, kind, id)? {
            return Ok(false);
        }

        let referrers = count_referrers(&tx, kind, id)?;
        let cascaded = match self.config.remove_policy {
            RemovePolicy::Cascade => {
                if referrers > 0 {
                    return Err(still_referenced(kind, id, referrers));
                }
                purge_links(&tx, kind, id)?
            }
            RemovePolicy::Reject => {
                let links = count_links(&tx, kind, id)? + referrers;
                if links > 0 {
                    return Err(still_referenced(kind, id, links));
                }
                0
            }
        };

        tx.execute(
            "DELETE FROM record_refs
             WHERE (source_kind = ?1 AND source_id = ?2)
                OR (target_kind = ?1 AND target_id = ?2);",
            params![kind.as_str(), id],
        )?;
        tx.execute(
            "DELETE FROM records WHERE kind = ?1 AND id = ?2;",
            params![kind.as_str(), id],
        )?;
        tx.commit()?;

        info!(
            "event=record_remove module=store status=ok kind={kind} id={id} cascaded_links={cascaded}"
        );
        Ok(true)
    }

    /// Lazily enumerates every record of `T` in insertion order.
    ///
    /// Each call starts a fresh enumeration over the current state.
    pub fn list_all<T: Entity>(&self) -> RecordIter<'conn, T> {
        RecordIter::new(self.conn, T::KIND)
    }

    /// Lazily enumerates the records of `T` accepted by `predicate`.
    pub fn filter<T, P>(&self, predicate: P) -> RecordFilter<'conn, T, P>
    where
        T: Entity,
        P: FnMut(&T) -> bool,
    {
        RecordFilter {
            inner: self.list_all(),
            predicate,
        }
    }

    pub fn count(&self, kind: EntityKind) -> StoreResult<u64> {
        count_records(self.conn, kind)
    }
}

/// Write handle passed to [`EntityStore::write_batch`].
pub struct WriteBatch<'tx> {
    conn: &'tx Connection,
    writes: usize,
}

impl WriteBatch<'_> {
    /// Same contract as [`EntityStore::add`], deferred to the batch commit.
    pub fn add<T: Entity>(&mut self, record: &T) -> StoreResult<RecordId> {
        let id = insert_record(self.conn, record)?;
        self.writes += 1;
        Ok(id)
    }

    /// Same contract as [`RelationshipIndex::link`], deferred to the batch
    /// commit.
    pub fn link(
        &mut self,
        set: AssociationSet,
        left_id: RecordId,
        right_id: RecordId,
    ) -> StoreResult<bool> {
        let created = insert_link(self.conn, set, left_id, right_id)?;
        if created {
            self.writes += 1;
        }
        Ok(created)
    }

    pub fn count(&self, kind: EntityKind) -> StoreResult<u64> {
        count_records(self.conn, kind)
    }
}

/// Lazy, paged enumeration of one kind in insertion order.
pub struct RecordIter<'conn, T> {
    conn: &'conn Connection,
    kind: EntityKind,
    after_seq: i64,
    page: VecDeque<StoredRow>,
    exhausted: bool,
    marker: PhantomData<fn() -> T>,
}

struct StoredRow {
    id: RecordId,
    body: String,
}

impl<'conn, T> RecordIter<'conn, T> {
    fn new(conn: &'conn Connection, kind: EntityKind) -> Self {
        Self {
            conn,
            kind,
            after_seq: 0,
            page: VecDeque::new(),
            exhausted: false,
            marker: PhantomData,
        }
    }

    fn fetch_page(&mut self) -> StoreResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT seq, id, body
             FROM records
             WHERE kind = ?1 AND seq > ?2
             ORDER BY seq ASC
             LIMIT ?3;",
        )?;
        let mut rows = stmt.query(params![self.kind.as_str(), self.after_seq, PAGE_SIZE as i64])?;

        let mut fetched = 0;
        while let Some(row) = rows.next()? {
            self.after_seq = row.get(0)?;
            self.page.push_back(StoredRow {
                id: row.get(1)?,
                body: row.get(2)?,
            });
            fetched += 1;
        }

        if fetched < PAGE_SIZE {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl<T: Entity> Iterator for RecordIter<'_, T> {
    type Item = StoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }

        let row = self.page.pop_front()?;
        Some(decode_record(self.kind, row.id, &row.body))
    }
}

/// Predicate-filtered [`RecordIter`]. Decode errors are always yielded.
pub struct RecordFilter<'conn, T, P> {
    inner: RecordIter<'conn, T>,
    predicate: P,
}

impl<T, P> Iterator for RecordFilter<'_, T, P>
where
    T: Entity,
    P: FnMut(&T) -> bool,
{
    type Item = StoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        for item in self.inner.by_ref() {
            match item {
                Ok(record) if !(self.predicate)(&record) => continue,
                other => return Some(other),
            }
        }
        None
    }
}

pub(super) fn record_exists(conn: &Connection, kind: EntityKind, id: RecordId) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM records WHERE kind = ?1 AND id = ?2);",
        params![kind.as_str(), id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn count_referrers(conn: &Connection, kind: EntityKind, id: RecordId) -> StoreResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM record_refs WHERE target_kind = ?1 AND target_id = ?2;",
        params![kind.as_str(), id],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as usize)
}

fn insert_record<T: Entity>(conn: &Connection, record: &T) -> StoreResult<RecordId> {
    record.validate()?;

    let id = if record.id() > 0 {
        if record_exists(conn, T::KIND, record.id())? {
            debug!(
                "event=record_add module=store status=rejected kind={} id={} reason=duplicate",
                T::KIND,
                record.id()
            );
            return Err(StoreError::DuplicateIdentifier {
                kind: T::KIND,
                id: record.id(),
            });
        }
        record.id()
    } else {
        next_record_id(conn, T::KIND)?
    };

    let mut stored = record.clone();
    stored.set_id(id);
    let references = stored.references();
    ensure_references_exist(conn, &references)?;

    conn.execute(
        "INSERT INTO records (kind, id, body) VALUES (?1, ?2, ?3);",
        params![T::KIND.as_str(), id, encode_record(&stored)?],
    )?;
    write_references(conn, T::KIND, id, &references)?;
    raise_high_water(conn, T::KIND, id)?;
    Ok(id)
}

fn count_records(conn: &Connection, kind: EntityKind) -> StoreResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM records WHERE kind = ?1;",
        [kind.as_str()],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

fn still_referenced(kind: EntityKind, id: RecordId, links: usize) -> StoreError {
    debug!("event=record_remove module=store status=rejected kind={kind} id={id} links={links}");
    StoreError::StillReferenced { kind, id, links }
}

/// Next id above every id the kind has ever used, removed ones included.
fn next_record_id(conn: &Connection, kind: EntityKind) -> StoreResult<RecordId> {
    let id = conn.query_row(
        "SELECT MAX(
             COALESCE((SELECT high_water FROM id_sequences WHERE kind = ?1), 0),
             COALESCE((SELECT MAX(id) FROM records WHERE kind = ?1), 0)
         ) + 1;",
        [kind.as_str()],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn raise_high_water(conn: &Connection, kind: EntityKind, id: RecordId) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO id_sequences (kind, high_water) VALUES (?1, ?2)
         ON CONFLICT (kind) DO UPDATE SET high_water = MAX(high_water, excluded.high_water);",
        params![kind.as_str(), id],
    )?;
    Ok(())
}

fn ensure_references_exist(conn: &Connection, references: &[ForeignKey]) -> StoreResult<()> {
    for reference in references {
        if !record_exists(conn, reference.kind, reference.id)? {
            return Err(StoreError::DanglingReference {
                kind: reference.kind,
                id: reference.id,
            });
        }
    }
    Ok(())
}

fn write_references(
    conn: &Connection,
    kind: EntityKind,
    id: RecordId,
    references: &[ForeignKey],
) -> StoreResult<()> {
    for reference in references {
        conn.execute(
            "INSERT OR IGNORE INTO record_refs (source_kind, source_id, target_kind, target_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![kind.as_str(), id, reference.kind.as_str(), reference.id],
        )?;
    }
    Ok(())
}

fn encode_record<T: Entity>(record: &T) -> StoreResult<String> {
    serde_json::to_string(record).map_err(|err| {
        StoreError::InvalidData(format!("cannot encode {} #{}: {err}", T::KIND, record.id()))
    })
}

fn decode_record<T: Entity>(kind: EntityKind, id: RecordId, body: &str) -> StoreResult<T> {
    let record: T = serde_json::from_str(body)
        .map_err(|err| StoreError::InvalidData(format!("{kind} #{id}: {err}")))?;
    if record.id() != id {
        return Err(StoreError::InvalidData(format!(
            "{kind} #{id}: body carries id {}",
            record.id()
        )));
    }
    Ok(record)
}
