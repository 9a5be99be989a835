use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{EntityStore, KeyScheme, Record, RecordKey, StoreError};
use crate::brokerage::domain::EntityKind;
use crate::brokerage::integrity::{self, Dependent};

/// Process-local store. Every operation runs under one lock, so constraint
/// checks and the write they guard are atomic.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    by_kind: HashMap<EntityKind, Box<dyn ErasedTable>>,
}

struct Table<E> {
    last_seq: u64,
    rows: BTreeMap<RecordKey, E>,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self {
            last_seq: 0,
            rows: BTreeMap::new(),
        }
    }
}

/// Kind-erased view used for cross-table constraint checks.
trait ErasedTable: Send {
    fn contains(&self, key: &RecordKey) -> bool;
    fn dependents_of(&self, target: EntityKind, key: &RecordKey) -> Vec<Dependent>;
    fn detach(&mut self, dependent: &Dependent);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Record> ErasedTable for Table<E> {
    fn contains(&self, key: &RecordKey) -> bool {
        self.rows.contains_key(key)
    }

    fn dependents_of(&self, target: EntityKind, key: &RecordKey) -> Vec<Dependent> {
        self.rows
            .values()
            .flat_map(|row| {
                row.references()
                    .into_iter()
                    .filter(|reference| reference.target == target && reference.key == *key)
                    .map(move |reference| Dependent {
                        kind: E::KIND,
                        key: row.key(),
                        field: reference.field,
                    })
            })
            .collect()
    }

    fn detach(&mut self, dependent: &Dependent) {
        if let Some(row) = self.rows.get_mut(&dependent.key) {
            row.clear_reference(dependent.field);
            row.timestamps_mut().updated_at = Utc::now();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<E: Record> Table<E> {
    fn next_key(&mut self) -> RecordKey {
        match E::KEY_SCHEME {
            KeyScheme::Sequence => {
                self.last_seq += 1;
                RecordKey::Seq(self.last_seq)
            }
            KeyScheme::Opaque => RecordKey::Opaque(Uuid::new_v4().to_string()),
        }
    }

    fn check_unique(&self, record: &E, own_key: Option<&RecordKey>) -> Result<(), StoreError> {
        for unique in record.unique_fields() {
            let clash = self
                .rows
                .values()
                .filter(|row| Some(&row.key()) != own_key)
                .any(|row| row.unique_fields().contains(&unique));
            if clash {
                return Err(StoreError::DuplicateKey {
                    kind: E::KIND,
                    field: unique.field,
                    value: unique.value,
                });
            }
        }
        Ok(())
    }
}

impl Tables {
    fn table<E: Record>(&self) -> Option<&Table<E>> {
        self.by_kind
            .get(&E::KIND)
            .and_then(|table| table.as_any().downcast_ref::<Table<E>>())
    }

    fn table_mut<E: Record>(&mut self) -> Result<&mut Table<E>, StoreError> {
        self.by_kind
            .entry(E::KIND)
            .or_insert_with(|| Box::new(Table::<E>::default()))
            .as_any_mut()
            .downcast_mut::<Table<E>>()
            .ok_or_else(|| {
                StoreError::Unavailable(format!("table for {} has an unexpected row type", E::KIND))
            })
    }

    fn contains(&self, kind: EntityKind, key: &RecordKey) -> bool {
        self.by_kind
            .get(&kind)
            .is_some_and(|table| table.contains(key))
    }

    fn verify_references<E: Record>(&self, record: &E) -> Result<(), StoreError> {
        integrity::verify_references(&record.references(), |kind, key| self.contains(kind, key))?;
        Ok(())
    }
}

impl fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.tables.try_lock().map(|tables| tables.by_kind.len()).ok();
        f.debug_struct("InMemoryStore")
            .field("tables", &tables)
            .finish_non_exhaustive()
    }
}

impl InMemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

impl EntityStore for InMemoryStore {
    fn create<E: Record>(&self, mut record: E) -> Result<E, StoreError> {
        let mut tables = self.lock()?;
        tables.verify_references(&record)?;

        let table = tables.table_mut::<E>()?;
        table.check_unique(&record, None)?;

        let key = match (E::KEY_SCHEME, record.key()) {
            (KeyScheme::Opaque, RecordKey::Opaque(existing)) if !existing.is_empty() => {
                RecordKey::Opaque(existing)
            }
            _ => table.next_key(),
        };
        if table.rows.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                kind: E::KIND,
                field: "id",
                value: key.to_string(),
            });
        }

        let now = Utc::now();
        record.assign_key(key.clone());
        let stamps = record.timestamps_mut();
        stamps.created_at = now;
        stamps.updated_at = now;

        table.rows.insert(key, record.clone());
        Ok(record)
    }

    fn get<E: Record>(&self, key: &RecordKey) -> Result<E, StoreError> {
        let tables = self.lock()?;
        tables
            .table::<E>()
            .and_then(|table| table.rows.get(key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: E::KIND,
                key: key.clone(),
            })
    }

    fn list<E: Record>(&self, filter: &dyn Fn(&E) -> bool) -> Result<Vec<E>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .table::<E>()
            .map(|table| table.rows.values().filter(|row| filter(row)).cloned().collect())
            .unwrap_or_default())
    }

    fn update<E, F, Err>(&self, key: &RecordKey, apply: F) -> Result<E, Err>
    where
        E: Record,
        F: FnOnce(&mut E) -> Result<(), Err>,
        Err: From<StoreError>,
    {
        let mut tables = self.lock()?;
        let current = tables
            .table::<E>()
            .and_then(|table| table.rows.get(key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: E::KIND,
                key: key.clone(),
            })?;

        let mut updated = current.clone();
        apply(&mut updated)?;
        updated.assign_key(key.clone());
        let stamps = updated.timestamps_mut();
        stamps.created_at = current.timestamps().created_at;
        stamps.updated_at = Utc::now();

        tables.verify_references(&updated)?;
        let table = tables.table_mut::<E>()?;
        table.check_unique(&updated, Some(key))?;
        table.rows.insert(key.clone(), updated.clone());
        Ok(updated)
    }

    fn delete<E: Record>(&self, key: &RecordKey) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.contains(E::KIND, key) {
            return Err(StoreError::NotFound {
                kind: E::KIND,
                key: key.clone(),
            });
        }

        let dependents = tables
            .by_kind
            .values()
            .flat_map(|table| table.dependents_of(E::KIND, key))
            .collect();
        let detached = integrity::plan_deletion(E::KIND, key, dependents)?;

        for dependent in &detached {
            if let Some(table) = tables.by_kind.get_mut(&dependent.kind) {
                table.detach(dependent);
                info!(
                    kind = %dependent.kind,
                    id = %dependent.key,
                    field = dependent.field,
                    "cleared reference to deleted {}",
                    E::KIND
                );
            }
        }

        tables.table_mut::<E>()?.rows.remove(key);
        Ok(())
    }
}
