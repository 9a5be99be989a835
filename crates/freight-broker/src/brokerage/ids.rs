use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Prefix of a human-facing document number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberPrefix {
    Order,
    Quote,
    Invoice,
}

impl NumberPrefix {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "ORD",
            Self::Quote => "QTE",
            Self::Invoice => "INV",
        }
    }
}

/// Allocates `{PREFIX}-{epoch millis}-{sequence}` numbers for orders, quotes
/// and invoices whose caller did not supply one. The sequence is shared by all
/// prefixes and never repeats within a process; the store's unique index stays
/// the enforcement point across processes.
#[derive(Debug)]
pub struct NumberAllocator {
    sequence: AtomicU64,
}

impl Default for NumberAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl NumberAllocator {
    pub fn starting_at(first: u64) -> Self {
        Self {
            sequence: AtomicU64::new(first),
        }
    }

    pub fn allocate(&self, prefix: NumberPrefix) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let millis = Utc::now().timestamp_millis();
        format!("{}-{millis}-{sequence:04}", prefix.as_str())
    }

    /// Uses the caller's number when it is non-blank, otherwise allocates one.
    pub fn resolve(&self, supplied: Option<String>, prefix: NumberPrefix) -> String {
        match supplied {
            Some(number) if !number.trim().is_empty() => number.trim().to_string(),
            _ => self.allocate(prefix),
        }
    }
}
