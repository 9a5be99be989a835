//! Printable brokerage documents. The service resolves every linked row before
//! calling a renderer, so renderers never see missing required parties.

use std::fmt::Write;

use super::domain::{Carrier, Customer, Dispatch, Invoice, Lead, Order, Quote};
use super::lifecycle::Vocabulary;

pub struct InvoiceDocument {
    pub invoice: Invoice,
    pub order: Order,
    pub customer: Customer,
}

/// Who a quote is addressed to.
pub enum QuoteRecipient {
    Lead(Lead),
    Customer(Customer),
}

impl QuoteRecipient {
    fn company_name(&self) -> &str {
        match self {
            Self::Lead(lead) => &lead.company_name,
            Self::Customer(customer) => &customer.company_name,
        }
    }

    fn contact_person(&self) -> &str {
        match self {
            Self::Lead(lead) => &lead.contact_person,
            Self::Customer(customer) => &customer.contact_person,
        }
    }

    fn email(&self) -> &str {
        match self {
            Self::Lead(lead) => &lead.email,
            Self::Customer(customer) => &customer.email,
        }
    }
}

pub struct QuoteDocument {
    pub quote: Quote,
    pub recipient: QuoteRecipient,
}

pub struct RateConfirmationDocument {
    pub dispatch: Dispatch,
    pub order: Order,
    pub carrier: Carrier,
}

/// Rendered output handed back to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to lay out document: {0}")]
    Layout(#[from] std::fmt::Error),
    #[error("renderer rejected {document}: {reason}")]
    Rejected {
        document: &'static str,
        reason: String,
    },
}

pub trait DocumentRenderer: Send + Sync {
    fn invoice(&self, document: &InvoiceDocument) -> Result<RenderedDocument, RenderError>;
    fn quote(&self, document: &QuoteDocument) -> Result<RenderedDocument, RenderError>;
    fn rate_confirmation(
        &self,
        document: &RateConfirmationDocument,
    ) -> Result<RenderedDocument, RenderError>;
}

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const DATE_FORMAT: &str = "%B %-d, %Y";

/// Plain-text renderer with a fixed letterhead.
#[derive(Debug, Clone)]
pub struct TextDocumentRenderer {
    letterhead: String,
}

impl Default for TextDocumentRenderer {
    fn default() -> Self {
        Self::new("EverFlown Logistics")
    }
}

impl TextDocumentRenderer {
    pub fn new(letterhead: impl Into<String>) -> Self {
        Self {
            letterhead: letterhead.into(),
        }
    }

    fn header(&self, out: &mut String, title: &str) -> std::fmt::Result {
        writeln!(out, "{}", self.letterhead)?;
        writeln!(out, "Professional Freight Brokerage Services")?;
        writeln!(out)?;
        writeln!(out, "{title}")?;
        writeln!(out, "{}", "=".repeat(title.len()))
    }

    fn text(file_name: String, body: String) -> RenderedDocument {
        RenderedDocument {
            file_name,
            content_type: TEXT_CONTENT_TYPE,
            body: body.into_bytes(),
        }
    }
}

impl DocumentRenderer for TextDocumentRenderer {
    fn invoice(&self, document: &InvoiceDocument) -> Result<RenderedDocument, RenderError> {
        let InvoiceDocument {
            invoice,
            order,
            customer,
        } = document;
        let amount = invoice
            .amount_value()
            .ok_or_else(|| RenderError::Rejected {
                document: "invoice",
                reason: format!("amount '{}' is not a decimal", invoice.amount),
            })?;

        let mut out = String::new();
        self.header(&mut out, "INVOICE")?;
        writeln!(out, "Invoice Number: {}", invoice.invoice_number)?;
        writeln!(
            out,
            "Invoice Date:   {}",
            invoice.timestamps.created_at.format(DATE_FORMAT)
        )?;
        writeln!(out, "Due Date:       {}", invoice.due_date.format(DATE_FORMAT))?;
        writeln!(out, "Order Number:   {}", order.order_number)?;
        writeln!(out)?;

        writeln!(out, "Bill To:")?;
        writeln!(out, "  {}", customer.company_name)?;
        if !customer.contact_person.trim().is_empty() {
            writeln!(out, "  Attn: {}", customer.contact_person)?;
        }
        for line in customer.billing_lines() {
            writeln!(out, "  {line}")?;
        }
        writeln!(out)?;

        writeln!(out, "Shipment Details:")?;
        writeln!(out, "  Lane:      {}", order.lane())?;
        writeln!(out, "  Equipment: {}", order.equipment_type)?;
        writeln!(
            out,
            "  Commodity: {}",
            order.commodity.as_deref().unwrap_or("General Freight")
        )?;
        writeln!(out)?;
        writeln!(out, "Total Amount: ${amount:.2}")?;
        writeln!(out, "Payment Terms: {}", customer.payment_terms)?;
        if let Some(notes) = invoice.notes.as_deref().filter(|notes| !notes.is_empty()) {
            writeln!(out)?;
            writeln!(out, "Notes:")?;
            writeln!(out, "  {notes}")?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "Thank you for your business! For questions about this invoice, please contact us."
        )?;

        Ok(Self::text(
            format!("invoice-{}.txt", invoice.invoice_number),
            out,
        ))
    }

    fn quote(&self, document: &QuoteDocument) -> Result<RenderedDocument, RenderError> {
        let QuoteDocument { quote, recipient } = document;

        let mut out = String::new();
        self.header(&mut out, "FREIGHT QUOTE")?;
        writeln!(out, "Quote Number: {}", quote.quote_number)?;
        writeln!(
            out,
            "Quote Date:   {}",
            quote.timestamps.created_at.format(DATE_FORMAT)
        )?;
        writeln!(out, "Valid Until:  {}", quote.valid_until.format(DATE_FORMAT))?;
        writeln!(out, "Status:       {}", quote.status.label())?;
        writeln!(out)?;

        writeln!(out, "Quote For:")?;
        writeln!(out, "  {}", recipient.company_name())?;
        writeln!(out, "  Attn: {}", recipient.contact_person())?;
        writeln!(out, "  {}", recipient.email())?;
        writeln!(out)?;

        writeln!(out, "Lane:      {}", quote.lane())?;
        writeln!(out, "Equipment: {}", quote.equipment_type)?;
        if let Some(pickup) = quote.pickup_date {
            writeln!(out, "Pickup:    {}", pickup.format(DATE_FORMAT))?;
        }
        if let Some(weight) = quote.weight {
            writeln!(out, "Weight:    {weight} lbs")?;
        }
        writeln!(
            out,
            "Commodity: {}",
            quote.commodity.as_deref().unwrap_or("General Freight")
        )?;
        writeln!(out)?;
        writeln!(out, "Quoted Rate: ${:.2}", quote.quoted_rate)?;
        if let Some(notes) = quote.notes.as_deref().filter(|notes| !notes.is_empty()) {
            writeln!(out)?;
            writeln!(out, "Notes:")?;
            writeln!(out, "  {notes}")?;
        }

        Ok(Self::text(format!("quote-{}.txt", quote.quote_number), out))
    }

    fn rate_confirmation(
        &self,
        document: &RateConfirmationDocument,
    ) -> Result<RenderedDocument, RenderError> {
        let RateConfirmationDocument {
            dispatch,
            order,
            carrier,
        } = document;

        let mut out = String::new();
        self.header(&mut out, "RATE CONFIRMATION")?;
        writeln!(out, "Order Number: {}", order.order_number)?;
        writeln!(out, "Dispatch:     {}", dispatch.id)?;
        writeln!(out)?;

        writeln!(out, "Carrier:")?;
        writeln!(out, "  {}", carrier.company_name)?;
        writeln!(out, "  Attn: {}", carrier.contact_person)?;
        if let Some(mc) = carrier.mc_number.as_deref() {
            writeln!(out, "  MC#:  {mc}")?;
        }
        if let Some(dot) = carrier.dot_number.as_deref() {
            writeln!(out, "  DOT#: {dot}")?;
        }
        writeln!(out)?;

        writeln!(out, "Pickup:")?;
        if let Some(company) = order.origin_company.as_deref() {
            writeln!(out, "  {company}")?;
        }
        writeln!(out, "  {}", order.origin_address)?;
        writeln!(
            out,
            "  {}, {} {}",
            order.origin_city, order.origin_state, order.origin_zip_code
        )?;
        writeln!(out, "  Date: {}", order.pickup_date.format(DATE_FORMAT))?;
        writeln!(out)?;

        writeln!(out, "Delivery:")?;
        if let Some(company) = order.destination_company.as_deref() {
            writeln!(out, "  {company}")?;
        }
        writeln!(out, "  {}", order.destination_address)?;
        writeln!(
            out,
            "  {}, {} {}",
            order.destination_city, order.destination_state, order.destination_zip_code
        )?;
        if let Some(delivery) = order.delivery_date {
            writeln!(out, "  Date: {}", delivery.format(DATE_FORMAT))?;
        }
        writeln!(out)?;

        writeln!(out, "Equipment: {}", order.equipment_type)?;
        if let Some(driver) = dispatch.driver_name.as_deref() {
            writeln!(out, "Driver:    {driver}")?;
        }
        if let Some(truck) = dispatch.truck_number.as_deref() {
            writeln!(out, "Truck:     {truck}")?;
        }
        writeln!(out, "Carrier Rate: ${:.2}", dispatch.carrier_rate)?;
        if let Some(instructions) = order.special_instructions.as_deref() {
            writeln!(out)?;
            writeln!(out, "Special Instructions:")?;
            writeln!(out, "  {instructions}")?;
        }

        Ok(Self::text(
            format!("rate-confirmation-{}.txt", order.order_number),
            out,
        ))
    }
}
