use std::sync::Arc;

use tracing::info;

use super::dashboard::{self, DashboardStats};
use super::documents::{
    DocumentRenderer, InvoiceDocument, QuoteDocument, QuoteRecipient, RateConfirmationDocument,
    RenderError, RenderedDocument,
};
use super::domain::{
    Carrier, Customer, Dispatch, EntityKind, FollowUp, Invoice, Lead, Order, Quote, Resource,
    ValidationError,
};
use super::ids::NumberAllocator;
use super::integrity::{Dependent, IntegrityError};
use crate::store::{EntityStore, RecordKey, StoreError};

/// Facade over the entity store: payload validation, lifecycle rules,
/// aggregation and document assembly.
pub struct BrokerageService<S, D> {
    store: Arc<S>,
    renderer: Arc<D>,
    numbers: NumberAllocator,
}

impl<S, D> BrokerageService<S, D>
where
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    pub fn new(store: Arc<S>, renderer: Arc<D>) -> Self {
        Self::with_numbers(store, renderer, NumberAllocator::default())
    }

    pub fn with_numbers(store: Arc<S>, renderer: Arc<D>, numbers: NumberAllocator) -> Self {
        Self {
            store,
            renderer,
            numbers,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Validate a draft and persist it.
    pub fn create<E: Resource>(&self, draft: E::Draft) -> Result<E, BrokerageError> {
        let record = E::from_draft(draft, &self.numbers)?;
        let stored = self.store.create(record)?;
        info!(kind = %E::KIND, id = %stored.key(), "created");
        Ok(stored)
    }

    pub fn get<E: Resource>(&self, key: &RecordKey) -> Result<E, BrokerageError> {
        Ok(self.store.get(key)?)
    }

    /// All rows of a kind, optionally restricted to one lifecycle status.
    pub fn list<E: Resource>(&self, status: Option<&str>) -> Result<Vec<E>, BrokerageError> {
        let Some(raw) = status else {
            return Ok(self.store.list::<E>(&|_| true)?);
        };

        let vocabulary = E::status_vocabulary();
        if vocabulary.is_empty() {
            return Err(BrokerageError::InvalidInput {
                field: "status",
                reason: format!("{} has no status to filter on", E::KIND),
            });
        }
        let wanted = raw.trim();
        if !vocabulary.contains(&wanted) {
            return Err(BrokerageError::InvalidStatus {
                entity: E::KIND,
                value: raw.to_string(),
            });
        }

        Ok(self
            .store
            .list::<E>(&|row| row.status_label() == Some(wanted))?)
    }

    /// Apply a partial update. Omitted fields keep their stored values.
    pub fn update<E: Resource>(
        &self,
        key: &RecordKey,
        patch: E::Patch,
    ) -> Result<E, BrokerageError> {
        let updated = self.store.update(key, |row: &mut E| {
            row.apply_patch(patch).map_err(BrokerageError::from)
        })?;
        info!(kind = %E::KIND, id = %key, "updated");
        Ok(updated)
    }

    pub fn delete<E: Resource>(&self, key: &RecordKey) -> Result<(), BrokerageError> {
        self.store.delete::<E>(key)?;
        info!(kind = %E::KIND, id = %key, "deleted");
        Ok(())
    }

    pub fn dashboard(&self) -> Result<DashboardStats, BrokerageError> {
        Ok(dashboard::compute(self.store.as_ref())?)
    }

    pub fn urgent_follow_ups(&self) -> Result<Vec<FollowUp>, BrokerageError> {
        Ok(dashboard::urgent_follow_ups(self.store.as_ref())?)
    }

    /// Render an invoice together with its order and billed customer. The
    /// customer comes from the invoice, falling back to the order's customer.
    pub fn invoice_document(&self, id: u64) -> Result<RenderedDocument, BrokerageError> {
        let invoice: Invoice = self.get(&id.into())?;
        let order_id = invoice
            .order_id
            .ok_or_else(|| ValidationError::input("orderId", "invoice is not linked to an order"))?;
        let order: Order = self.get(&order_id.into())?;
        let customer_id = invoice.customer_id.or(order.customer_id).ok_or_else(|| {
            ValidationError::input("customerId", "invoice has no customer to bill")
        })?;
        let customer: Customer = self.get(&customer_id.into())?;

        let document = InvoiceDocument {
            invoice,
            order,
            customer,
        };
        Ok(self.renderer.invoice(&document)?)
    }

    /// Render a quote for its lead, or for its customer when no lead is set.
    pub fn quote_document(&self, id: u64) -> Result<RenderedDocument, BrokerageError> {
        let quote: Quote = self.get(&id.into())?;
        let recipient = match (quote.lead_id, quote.customer_id) {
            (Some(lead_id), _) => QuoteRecipient::Lead(self.get::<Lead>(&lead_id.into())?),
            (None, Some(customer_id)) => {
                QuoteRecipient::Customer(self.get::<Customer>(&customer_id.into())?)
            }
            (None, None) => {
                return Err(ValidationError::input(
                    "leadId",
                    "quote is addressed to neither a lead nor a customer",
                )
                .into())
            }
        };

        Ok(self.renderer.quote(&QuoteDocument { quote, recipient })?)
    }

    pub fn rate_confirmation(&self, dispatch_id: u64) -> Result<RenderedDocument, BrokerageError> {
        let dispatch: Dispatch = self.get(&dispatch_id.into())?;
        let order: Order = self.get(&dispatch.order_id.into())?;
        let carrier: Carrier = self.get(&dispatch.carrier_id.into())?;

        let document = RateConfirmationDocument {
            dispatch,
            order,
            carrier,
        };
        Ok(self.renderer.rate_confirmation(&document)?)
    }
}

/// Request-boundary error taxonomy for brokerage operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerageError {
    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: RecordKey },
    #[error("{kind} with {field} '{value}' already exists")]
    DuplicateKey {
        kind: EntityKind,
        field: &'static str,
        value: String,
    },
    #[error("{field} references {target} {key}, which does not exist")]
    DanglingReference {
        field: &'static str,
        target: EntityKind,
        key: RecordKey,
    },
    #[error("{kind} {key} is still referenced by {} dependent row(s)", .dependents.len())]
    ReferencedByDependents {
        kind: EntityKind,
        key: RecordKey,
        dependents: Vec<Dependent>,
    },
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
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<StoreError> for BrokerageError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { kind, key } => Self::NotFound { kind, key },
            StoreError::DuplicateKey { kind, field, value } => {
                Self::DuplicateKey { kind, field, value }
            }
            StoreError::Integrity(error) => error.into(),
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
        }
    }
}

impl From<IntegrityError> for BrokerageError {
    fn from(value: IntegrityError) -> Self {
        match value {
            IntegrityError::DanglingReference { field, target, key } => {
                Self::DanglingReference { field, target, key }
            }
            IntegrityError::ReferencedByDependents {
                kind,
                key,
                dependents,
            } => Self::ReferencedByDependents {
                kind,
                key,
                dependents,
            },
        }
    }
}

impl From<ValidationError> for BrokerageError {
    fn from(value: ValidationError) -> Self {
        match value {
            ValidationError::InvalidInput { field, reason } => Self::InvalidInput { field, reason },
            ValidationError::InvalidStatus { entity, value } => {
                Self::InvalidStatus { entity, value }
            }
            ValidationError::InvalidTransition { entity, from, to } => {
                Self::InvalidTransition { entity, from, to }
            }
        }
    }
}
