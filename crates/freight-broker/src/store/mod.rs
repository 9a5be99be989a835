//! Typed repository abstraction over the brokerage entity kinds.
//!
//! The store owns surrogate key assignment, timestamps, unique-key checks and
//! the foreign-key constraints declared by [`crate::brokerage::integrity`]. It
//! holds no business rules of its own.

mod memory;

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::brokerage::domain::EntityKind;
use crate::brokerage::integrity::{IntegrityError, Reference};
use crate::config::StoreConfig;

pub use memory::InMemoryStore;

/// Primary key of a stored row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Seq(u64),
    Opaque(String),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Seq(id) => write!(f, "{id}"),
            RecordKey::Opaque(id) => f.write_str(id),
        }
    }
}

impl From<u64> for RecordKey {
    fn from(value: u64) -> Self {
        Self::Seq(value)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::Opaque(value.to_string())
    }
}

/// How the store allocates primary keys for a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    /// Monotonic per-kind sequence starting at 1.
    Sequence,
    /// Globally unique opaque string (UUID v4).
    Opaque,
}

/// Creation and last-mutation instants, stamped by the store only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A unique-indexed field value carried by a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueField {
    pub field: &'static str,
    pub value: String,
}

impl UniqueField {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Row type that can live in an [`EntityStore`].
pub trait Record: Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    const KEY_SCHEME: KeyScheme = KeyScheme::Sequence;

    fn key(&self) -> RecordKey;
    fn assign_key(&mut self, key: RecordKey);
    fn timestamps(&self) -> &Timestamps;
    fn timestamps_mut(&mut self) -> &mut Timestamps;

    fn unique_fields(&self) -> Vec<UniqueField> {
        Vec::new()
    }

    /// Non-null foreign keys held by this row.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Nulls the named foreign key. Only called for nullable relationships.
    fn clear_reference(&mut self, _field: &'static str) {}
}

/// Repository contract shared by every backend.
pub trait EntityStore: Send + Sync {
    /// Persists a new row, assigning its key and timestamps.
    fn create<E: Record>(&self, record: E) -> Result<E, StoreError>;

    fn get<E: Record>(&self, key: &RecordKey) -> Result<E, StoreError>;

    /// Rows matching `filter`, in key order.
    fn list<E: Record>(&self, filter: &dyn Fn(&E) -> bool) -> Result<Vec<E>, StoreError>;

    /// Applies `apply` to the stored row and re-checks constraints before
    /// committing. The key and `createdAt` cannot be changed by `apply`.
    fn update<E, F, Err>(&self, key: &RecordKey, apply: F) -> Result<E, Err>
    where
        E: Record,
        F: FnOnce(&mut E) -> Result<(), Err>,
        Err: From<StoreError>;

    fn delete<E: Record>(&self, key: &RecordKey) -> Result<(), StoreError>;

    fn count_where<E: Record>(&self, predicate: &dyn Fn(&E) -> bool) -> Result<usize, StoreError> {
        Ok(self.list(predicate)?.len())
    }

    /// Sum of `field` over matching rows; zero when nothing matches.
    fn sum_where<E: Record>(
        &self,
        predicate: &dyn Fn(&E) -> bool,
        field: &dyn Fn(&E) -> Decimal,
    ) -> Result<Decimal, StoreError> {
        Ok(self
            .list(predicate)?
            .iter()
            .fold(Decimal::ZERO, |total, row| total + field(row)))
    }
}

/// Opens the store named by the configured connection string.
pub fn connect(config: &StoreConfig) -> Result<InMemoryStore, StoreError> {
    let url = config.url.trim();
    match url.split_once("://") {
        Some(("memory", name)) => {
            tracing::info!(store = %name, "using in-memory entity store");
            Ok(InMemoryStore::default())
        }
        Some((scheme, _)) => Err(StoreError::Unavailable(format!(
            "unsupported store scheme '{scheme}'"
        ))),
        None => Err(StoreError::Unavailable(format!(
            "malformed store url '{url}'"
        ))),
    }
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: RecordKey },
    #[error("{kind} with {field} '{value}' already exists")]
    DuplicateKey {
        kind: EntityKind,
        field: &'static str,
        value: String,
    },
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_accepts_memory_scheme() {
        let config = StoreConfig {
            url: "memory://brokerage".to_string(),
        };
        let store = connect(&config).expect("memory store");
        assert!(format!("{store:?}").starts_with("InMemoryStore"));
    }

    #[test]
    fn connect_rejects_other_backends() {
        let config = StoreConfig {
            url: "postgres://localhost/brokerage".to_string(),
        };
        match connect(&config) {
            Err(StoreError::Unavailable(message)) => assert!(message.contains("postgres")),
            other => panic!("expected unavailable store, got {other:?}"),
        }

        let config = StoreConfig {
            url: "brokerage".to_string(),
        };
        assert!(matches!(connect(&config), Err(StoreError::Unavailable(_))));
    }
}
