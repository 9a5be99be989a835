//! Brokerage entities, their create payloads (drafts) and partial updates (patches).

mod billing;
mod parties;
mod shipments;
mod tasks;

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::ids::NumberAllocator;
use super::lifecycle::Lifecycle;
use crate::store::Record;

pub use billing::{Invoice, InvoicePatch, NewInvoice, NewQuote, Quote, QuotePatch};
pub use parties::{
    Carrier, CarrierPatch, Customer, CustomerPatch, Lead, LeadPatch, NewCarrier, NewCustomer,
    NewLead,
};
pub use shipments::{Dispatch, DispatchPatch, NewDispatch, NewOrder, Order, OrderPatch};
pub use tasks::{FollowUp, FollowUpPatch, NewFollowUp};

/// Every entity kind the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Lead,
    Customer,
    Carrier,
    Order,
    Dispatch,
    Quote,
    Invoice,
    FollowUp,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Lead => "lead",
            Self::Customer => "customer",
            Self::Carrier => "carrier",
            Self::Order => "order",
            Self::Dispatch => "dispatch",
            Self::Quote => "quote",
            Self::Invoice => "invoice",
            Self::FollowUp => "follow_up",
        }
    }

    /// Path segment under `/api`.
    pub const fn collection(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Lead => "leads",
            Self::Customer => "customers",
            Self::Carrier => "carriers",
            Self::Order => "orders",
            Self::Dispatch => "dispatches",
            Self::Quote => "quotes",
            Self::Invoice => "invoices",
            Self::FollowUp => "followups",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An entity exposed through the generic create/list/update/delete surface.
pub trait Resource: Record + Serialize {
    type Draft: DeserializeOwned + Send + 'static;
    type Patch: DeserializeOwned + Send + 'static;

    /// Builds an unsaved row. Key and timestamps are assigned by the store.
    fn from_draft(draft: Self::Draft, numbers: &NumberAllocator) -> Result<Self, ValidationError>;

    /// Applies only the fields present in `patch`.
    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), ValidationError>;

    /// Lifecycle label used by list filtering, if the kind has one.
    fn status_label(&self) -> Option<&'static str> {
        None
    }

    fn status_vocabulary() -> &'static [&'static str] {
        &[]
    }
}

/// Errors raised while turning request payloads into rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error("'{value}' is not a valid {entity} status")]
    InvalidStatus { entity: EntityKind, value: String },
    #[error("{entity} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        entity: EntityKind,
        from: &'static str,
        to: &'static str,
    },
}

impl ValidationError {
    pub(crate) fn input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Keeps "field omitted" (`None`) apart from "field set to null" (`Some(None)`).
/// Use together with `#[serde(default)]`.
pub(crate) fn explicit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Overwrites `slot` only when the patch carried a value.
pub(crate) fn assign<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Like [`assign`], trimming the value the same way drafts are numbered.
pub(crate) fn assign_number(slot: &mut String, value: Option<String>) {
    assign(slot, value.map(|number| number.trim().to_string()));
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::input(field, "must not be blank"))
    } else {
        Ok(())
    }
}

pub(crate) fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require_text(field, value)?;
    match value.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::input(field, "must be an e-mail address")),
    }
}

pub(crate) fn require_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        Err(ValidationError::input(field, "must not be negative"))
    } else {
        Ok(())
    }
}

/// Parses a decimal amount held as text.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Resolves the status for a new row: the supplied value or the kind's default.
pub(crate) fn initial_status<S: Lifecycle>(raw: Option<String>) -> Result<S, ValidationError> {
    match raw {
        Some(raw) => S::parse(&raw),
        None => Ok(S::default()),
    }
}

/// Validates a requested status change against the current one.
pub(crate) fn next_status<S: Lifecycle>(
    current: S,
    raw: Option<String>,
) -> Result<S, ValidationError> {
    match raw {
        Some(raw) => {
            let next = S::parse(&raw)?;
            current.transition(next)
        }
        None => Ok(current),
    }
}
