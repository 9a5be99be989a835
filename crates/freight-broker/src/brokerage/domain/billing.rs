use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    assign, assign_number, explicit, initial_status, next_status, parse_amount,
    require_non_negative, require_text, EntityKind, Resource, ValidationError,
};
use crate::brokerage::ids::{NumberAllocator, NumberPrefix};
use crate::brokerage::integrity::Reference;
use crate::brokerage::lifecycle::{InvoiceStatus, InvoiceType, QuoteStatus, Vocabulary};
use crate::store::{Record, RecordKey, Timestamps, UniqueField};

/// Priced proposal for a lane, made to a lead or an existing customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: u64,
    pub quote_number: String,
    pub lead_id: Option<u64>,
    pub customer_id: Option<u64>,
    pub origin_city: String,
    pub origin_state: String,
    pub destination_city: String,
    pub destination_state: String,
    pub pickup_date: Option<NaiveDate>,
    pub equipment_type: String,
    pub weight: Option<f64>,
    pub commodity: Option<String>,
    pub quoted_rate: Decimal,
    pub valid_until: NaiveDate,
    pub status: QuoteStatus,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuote {
    /// Allocated as `QTE-...` when omitted.
    pub quote_number: Option<String>,
    pub lead_id: Option<u64>,
    pub customer_id: Option<u64>,
    pub origin_city: String,
    pub origin_state: String,
    pub destination_city: String,
    pub destination_state: String,
    pub pickup_date: Option<NaiveDate>,
    pub equipment_type: String,
    pub weight: Option<f64>,
    pub commodity: Option<String>,
    pub quoted_rate: Decimal,
    pub valid_until: NaiveDate,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePatch {
    pub quote_number: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub lead_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub customer_id: Option<Option<u64>>,
    pub origin_city: Option<String>,
    pub origin_state: Option<String>,
    pub destination_city: Option<String>,
    pub destination_state: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub pickup_date: Option<Option<NaiveDate>>,
    pub equipment_type: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub commodity: Option<Option<String>>,
    pub quoted_rate: Option<Decimal>,
    pub valid_until: Option<NaiveDate>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub notes: Option<Option<String>>,
}

impl Quote {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("quoteNumber", &self.quote_number)?;
        require_text("originCity", &self.origin_city)?;
        require_text("originState", &self.origin_state)?;
        require_text("destinationCity", &self.destination_city)?;
        require_text("destinationState", &self.destination_state)?;
        require_text("equipmentType", &self.equipment_type)?;
        require_non_negative("quotedRate", self.quoted_rate)?;
        if self.weight.is_some_and(|weight| weight < 0.0) {
            return Err(ValidationError::input("weight", "must not be negative"));
        }
        Ok(())
    }

    pub fn lane(&self) -> String {
        format!(
            "{}, {} -> {}, {}",
            self.origin_city, self.origin_state, self.destination_city, self.destination_state
        )
    }
}

impl Record for Quote {
    const KIND: EntityKind = EntityKind::Quote;

    fn key(&self) -> RecordKey {
        RecordKey::Seq(self.id)
    }

    fn assign_key(&mut self, key: RecordKey) {
        if let RecordKey::Seq(id) = key {
            self.id = id;
        }
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn unique_fields(&self) -> Vec<UniqueField> {
        vec![UniqueField::new("quoteNumber", self.quote_number.clone())]
    }

    fn references(&self) -> Vec<Reference> {
        [
            Reference::optional("leadId", EntityKind::Lead, self.lead_id),
            Reference::optional("customerId", EntityKind::Customer, self.customer_id),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Resource for Quote {
    type Draft = NewQuote;
    type Patch = QuotePatch;

    fn from_draft(draft: NewQuote, numbers: &NumberAllocator) -> Result<Self, ValidationError> {
        let quote = Self {
            id: 0,
            quote_number: numbers.resolve(draft.quote_number, NumberPrefix::Quote),
            lead_id: draft.lead_id,
            customer_id: draft.customer_id,
            origin_city: draft.origin_city,
            origin_state: draft.origin_state,
            destination_city: draft.destination_city,
            destination_state: draft.destination_state,
            pickup_date: draft.pickup_date,
            equipment_type: draft.equipment_type,
            weight: draft.weight,
            commodity: draft.commodity,
            quoted_rate: draft.quoted_rate,
            valid_until: draft.valid_until,
            status: initial_status(draft.status)?,
            notes: draft.notes,
            timestamps: Timestamps::default(),
        };
        quote.validate()?;
        Ok(quote)
    }

    fn apply_patch(&mut self, patch: QuotePatch) -> Result<(), ValidationError> {
        self.status = next_status(self.status, patch.status)?;

        assign_number(&mut self.quote_number, patch.quote_number);
        assign(&mut self.lead_id, patch.lead_id);
        assign(&mut self.customer_id, patch.customer_id);
        assign(&mut self.origin_city, patch.origin_city);
        assign(&mut self.origin_state, patch.origin_state);
        assign(&mut self.destination_city, patch.destination_city);
        assign(&mut self.destination_state, patch.destination_state);
        assign(&mut self.pickup_date, patch.pickup_date);
        assign(&mut self.equipment_type, patch.equipment_type);
        assign(&mut self.weight, patch.weight);
        assign(&mut self.commodity, patch.commodity);
        assign(&mut self.quoted_rate, patch.quoted_rate);
        assign(&mut self.valid_until, patch.valid_until);
        assign(&mut self.notes, patch.notes);
        self.validate()
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.label())
    }

    fn status_vocabulary() -> &'static [&'static str] {
        QuoteStatus::LABELS
    }
}

/// Receivable (customer) or payable (carrier) billing document.
///
/// `amount` is persisted as decimal text; readers parse it with
/// [`parse_amount`](super::parse_amount).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: u64,
    pub invoice_number: String,
    #[serde(rename = "type")]
    pub invoice_type: InvoiceType,
    pub customer_id: Option<u64>,
    pub carrier_id: Option<u64>,
    pub order_id: Option<u64>,
    pub dispatch_id: Option<u64>,
    pub amount: String,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

/// Accepts `amount` as either a JSON number or decimal text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    /// Allocated as `INV-...` when omitted.
    pub invoice_number: Option<String>,
    #[serde(rename = "type")]
    pub invoice_type: String,
    pub customer_id: Option<u64>,
    pub carrier_id: Option<u64>,
    pub order_id: Option<u64>,
    pub dispatch_id: Option<u64>,
    pub amount: Decimal,
    pub status: Option<String>,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePatch {
    pub invoice_number: Option<String>,
    #[serde(rename = "type")]
    pub invoice_type: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub customer_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub carrier_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub order_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub dispatch_id: Option<Option<u64>>,
    pub amount: Option<Decimal>,
    pub status: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "explicit")]
    pub paid_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "explicit")]
    pub notes: Option<Option<String>>,
}

impl Invoice {
    /// Parsed amount, or `None` when the stored text is not a decimal.
    pub fn amount_value(&self) -> Option<Decimal> {
        parse_amount(&self.amount)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("invoiceNumber", &self.invoice_number)?;
        let amount = self
            .amount_value()
            .ok_or_else(|| ValidationError::input("amount", "must be a decimal amount"))?;
        require_non_negative("amount", amount)
    }

    /// Settling an invoice records the day it was paid unless one was given.
    fn stamp_paid_date(&mut self) {
        if self.status == InvoiceStatus::Paid && self.paid_date.is_none() {
            self.paid_date = Some(Utc::now().date_naive());
        }
    }
}

impl Record for Invoice {
    const KIND: EntityKind = EntityKind::Invoice;

    fn key(&self) -> RecordKey {
        RecordKey::Seq(self.id)
    }

    fn assign_key(&mut self, key: RecordKey) {
        if let RecordKey::Seq(id) = key {
            self.id = id;
        }
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn unique_fields(&self) -> Vec<UniqueField> {
        vec![UniqueField::new("invoiceNumber", self.invoice_number.clone())]
    }

    fn references(&self) -> Vec<Reference> {
        [
            Reference::optional("customerId", EntityKind::Customer, self.customer_id),
            Reference::optional("carrierId", EntityKind::Carrier, self.carrier_id),
            Reference::optional("orderId", EntityKind::Order, self.order_id),
            Reference::optional("dispatchId", EntityKind::Dispatch, self.dispatch_id),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Resource for Invoice {
    type Draft = NewInvoice;
    type Patch = InvoicePatch;

    fn from_draft(draft: NewInvoice, numbers: &NumberAllocator) -> Result<Self, ValidationError> {
        let mut invoice = Self {
            id: 0,
            invoice_number: numbers.resolve(draft.invoice_number, NumberPrefix::Invoice),
            invoice_type: InvoiceType::parse(&draft.invoice_type)?,
            customer_id: draft.customer_id,
            carrier_id: draft.carrier_id,
            order_id: draft.order_id,
            dispatch_id: draft.dispatch_id,
            amount: draft.amount.to_string(),
            status: initial_status(draft.status)?,
            due_date: draft.due_date,
            paid_date: draft.paid_date,
            notes: draft.notes,
            timestamps: Timestamps::default(),
        };
        invoice.validate()?;
        invoice.stamp_paid_date();
        Ok(invoice)
    }

    fn apply_patch(&mut self, patch: InvoicePatch) -> Result<(), ValidationError> {
        self.status = next_status(self.status, patch.status)?;
        if let Some(raw) = patch.invoice_type {
            self.invoice_type = InvoiceType::parse(&raw)?;
        }

        assign_number(&mut self.invoice_number, patch.invoice_number);
        assign(&mut self.customer_id, patch.customer_id);
        assign(&mut self.carrier_id, patch.carrier_id);
        assign(&mut self.order_id, patch.order_id);
        assign(&mut self.dispatch_id, patch.dispatch_id);
        assign(&mut self.amount, patch.amount.map(|amount| amount.to_string()));
        assign(&mut self.due_date, patch.due_date);
        assign(&mut self.paid_date, patch.paid_date);
        assign(&mut self.notes, patch.notes);
        self.validate()?;
        self.stamp_paid_date();
        Ok(())
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.label())
    }

    fn status_vocabulary() -> &'static [&'static str] {
        InvoiceStatus::LABELS
    }
}
