//! Association sets and reverse foreign-key lookups.
//!
//! # Responsibility
//! - Link/unlink record pairs inside a named [`AssociationSet`].
//! - Resolve the records paired with a given record, in link order.
//! - Resolve "who points at me" through the `record_refs` index, so no
//!   record ever embeds its dependents.
//!
//! # Invariants
//! - `(set, left_id, right_id)` is unique.
//! - Both ends of a link exist when it is created.
//! - Removing a record consults this module (cascade or reject).

use super::entity_store::record_exists;
use super::{EntityStore, StoreError, StoreResult};
use crate::model::{Entity, EntityKind, RecordId};
use log::info;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// A many-to-many pairing between two record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssociationSet {
    pub name: &'static str,
    pub left: EntityKind,
    pub right: EntityKind,
}

/// Playlist membership: playlist (left) ↔ track (right).
pub const PLAYLIST_TRACKS: AssociationSet = AssociationSet {
    name: "playlist_tracks",
    left: EntityKind::Playlist,
    right: EntityKind::Track,
};

impl AssociationSet {
    pub const ALL: &'static [AssociationSet] = &[PLAYLIST_TRACKS];

    /// Looks up a known set by name (`-` accepted for `_`).
    pub fn by_name(name: &str) -> Option<AssociationSet> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.iter().copied().find(|set| set.name == normalized)
    }

    /// Kind on the opposite side of `kind`, if `kind` takes part in the set.
    pub fn paired_kind(&self, kind: EntityKind) -> Option<EntityKind> {
        if kind == self.left {
            Some(self.right)
        } else if kind == self.right {
            Some(self.left)
        } else {
            None
        }
    }
}

/// Relationship lookups bound to one entity store.
#[derive(Clone, Copy)]
pub struct RelationshipIndex<'conn> {
    store: EntityStore<'conn>,
}

impl<'conn> RelationshipIndex<'conn> {
    pub fn new(store: EntityStore<'conn>) -> Self {
        Self { store }
    }

    /// Records the pair; `Ok(false)` when it already exists.
    ///
    /// # Errors
    /// - `DanglingReference` when either end does not exist.
    pub fn link(
        &self,
        set: AssociationSet,
        left_id: RecordId,
        right_id: RecordId,
    ) -> StoreResult<bool> {
        let tx =
            Transaction::new_unchecked(self.store.connection(), TransactionBehavior::Immediate)?;
        let created = insert_link(&tx, set, left_id, right_id)?;
        tx.commit()?;

        info!(
            "event=assoc_link module=relationship status=ok set={} left_id={} right_id={} created={}",
            set.name,
            left_id,
            right_id,
            created
        );
        Ok(created)
    }

    /// Drops the pair; `Ok(false)` when it was not linked.
    pub fn unlink(
        &self,
        set: AssociationSet,
        left_id: RecordId,
        right_id: RecordId,
    ) -> StoreResult<bool> {
        let removed = self.store.connection().execute(
            "DELETE FROM associations
             WHERE set_name = ?1 AND left_id = ?2 AND right_id = ?3;",
            params![set.name, left_id, right_id],
        )?;

        info!(
            "event=assoc_unlink module=relationship status=ok set={} left_id={} right_id={} removed={}",
            set.name,
            left_id,
            right_id,
            removed == 1
        );
        Ok(removed == 1)
    }

    /// Ids paired with `(kind, id)` inside `set`, in link order.
    pub fn linked_ids(
        &self,
        set: AssociationSet,
        kind: EntityKind,
        id: RecordId,
    ) -> StoreResult<Vec<RecordId>> {
        let sql = if kind == set.left {
            "SELECT right_id FROM associations
             WHERE set_name = ?1 AND left_id = ?2
             ORDER BY seq ASC;"
        } else if kind == set.right {
            "SELECT left_id FROM associations
             WHERE set_name = ?1 AND right_id = ?2
             ORDER BY seq ASC;"
        } else {
            return Err(StoreError::malformed(format!(
                "{kind} does not take part in association `{}`",
                set.name
            )));
        };

        let mut stmt = self.store.connection().prepare(sql)?;
        let mut rows = stmt.query(params![set.name, id])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }

    /// Records paired with `(kind, id)` inside `set`, resolved through the
    /// entity store. `T` must be the kind on the other side of the set.
    pub fn associations_for<T: Entity>(
        &self,
        set: AssociationSet,
        kind: EntityKind,
        id: RecordId,
    ) -> StoreResult<Vec<T>> {
        if set.paired_kind(kind) != Some(T::KIND) {
            return Err(StoreError::malformed(format!(
                "association `{}` does not pair {kind} with {}",
                set.name,
                T::KIND
            )));
        }

        self.linked_ids(set, kind, id)?
            .into_iter()
            .map(|paired_id| self.require::<T>(paired_id))
            .collect()
    }

    /// Records of kind `T` whose foreign keys point at `(target_kind, target_id)`,
    /// in insertion order.
    pub fn referencing<T: Entity>(
        &self,
        target_kind: EntityKind,
        target_id: RecordId,
    ) -> StoreResult<Vec<T>> {
        let mut stmt = self.store.connection().prepare(
            "SELECT r.id
             FROM record_refs rr
             INNER JOIN records r ON r.kind = rr.source_kind AND r.id = rr.source_id
             WHERE rr.target_kind = ?1
               AND rr.target_id = ?2
               AND rr.source_kind = ?3
             ORDER BY r.seq ASC;",
        )?;
        let mut rows = stmt.query(params![target_kind.as_str(), target_id, T::KIND.as_str()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get::<_, RecordId>(0)?);
        }

        ids.into_iter().map(|id| self.require::<T>(id)).collect()
    }

    /// Number of association rows touching `(kind, id)` across all sets.
    pub fn link_count(&self, kind: EntityKind, id: RecordId) -> StoreResult<usize> {
        count_links(self.store.connection(), kind, id)
    }

    fn require<T: Entity>(&self, id: RecordId) -> StoreResult<T> {
        self.store.get::<T>(id)?.ok_or_else(|| {
            StoreError::InvalidData(format!("linked {} #{id} is missing", T::KIND))
        })
    }
}

pub(super) fn insert_link(
    conn: &Connection,
    set: AssociationSet,
    left_id: RecordId,
    right_id: RecordId,
) -> StoreResult<bool> {
    for (kind, id) in [(set.left, left_id), (set.right, right_id)] {
        if !record_exists(conn, kind, id)? {
            return Err(StoreError::DanglingReference { kind, id });
        }
    }

    let created = conn.execute(
        "INSERT OR IGNORE INTO associations (set_name, left_kind, left_id, right_kind, right_id)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            set.name,
            set.left.as_str(),
            left_id,
            set.right.as_str(),
            right_id
        ],
    )?;
    Ok(created == 1)
}

pub(super) fn count_links(conn: &Connection, kind: EntityKind, id: RecordId) -> StoreResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM associations
         WHERE (left_kind = ?1 AND left_id = ?2)
            OR (right_kind = ?1 AND right_id = ?2);",
        params![kind.as_str(), id],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as usize)
}

pub(super) fn purge_links(conn: &Connection, kind: EntityKind, id: RecordId) -> StoreResult<usize> {
    let removed = conn.execute(
        "DELETE FROM associations
         WHERE (left_kind = ?1 AND left_id = ?2)
            OR (right_kind = ?1 AND right_id = ?2);",
        params![kind.as_str(), id],
    )?;
    Ok(removed)
}
