//! Dashboard metrics computed by scanning entity state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Carrier, Customer, Dispatch, FollowUp, Invoice, Lead, Order, Quote};
use super::lifecycle::{InvoiceStatus, InvoiceType, OrderStatus, QuoteStatus};
use crate::store::{EntityStore, StoreError};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Payload of `GET /api/dashboard/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_orders: usize,
    pub in_transit: usize,
    pub pending_quotes: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    /// Mean pickup-to-delivery days; `None` until a dispatch is delivered with
    /// both actual times recorded.
    pub avg_delivery_time: Option<f64>,
    pub pending_invoices: usize,
    pub total_leads: usize,
    pub total_customers: usize,
    pub total_carriers: usize,
    pub total_orders: usize,
    pub urgent_follow_ups: usize,
}

pub fn compute<S: EntityStore>(store: &S) -> Result<DashboardStats, StoreError> {
    let orders = store.list::<Order>(&|_| true)?;
    let active_orders = orders.iter().filter(|order| order.status.is_active()).count();
    let in_transit = orders
        .iter()
        .filter(|order| order.status == OrderStatus::InTransit)
        .count();

    let pending_quotes =
        store.count_where::<Quote>(&|quote| quote.status == QuoteStatus::Pending)?;
    let total_revenue = store.sum_where::<Invoice>(&is_collected_revenue, &revenue_amount)?;
    let pending_invoices =
        store.count_where::<Invoice>(&|invoice| invoice.status.is_outstanding())?;

    let dispatches = store.list::<Dispatch>(&|dispatch| dispatch.transit_time().is_some())?;

    Ok(DashboardStats {
        active_orders,
        in_transit,
        pending_quotes,
        total_revenue,
        avg_delivery_time: average_transit_days(&dispatches),
        pending_invoices,
        total_leads: store.count_where::<Lead>(&|_| true)?,
        total_customers: store.count_where::<Customer>(&|_| true)?,
        total_carriers: store.count_where::<Carrier>(&|_| true)?,
        total_orders: orders.len(),
        urgent_follow_ups: store.count_where::<FollowUp>(&FollowUp::is_urgent)?,
    })
}

/// Open high-priority follow-ups, soonest due first.
pub fn urgent_follow_ups<S: EntityStore>(store: &S) -> Result<Vec<FollowUp>, StoreError> {
    let mut urgent = store.list::<FollowUp>(&FollowUp::is_urgent)?;
    urgent.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
    Ok(urgent)
}

fn is_collected_revenue(invoice: &Invoice) -> bool {
    invoice.invoice_type == InvoiceType::Customer && invoice.status == InvoiceStatus::Paid
}

fn revenue_amount(invoice: &Invoice) -> Decimal {
    match invoice.amount_value() {
        Some(amount) => amount,
        None => {
            warn!(
                invoice = invoice.id,
                amount = %invoice.amount,
                "invoice amount is not a decimal; counting it as zero"
            );
            Decimal::ZERO
        }
    }
}

fn average_transit_days(dispatches: &[Dispatch]) -> Option<f64> {
    let durations: Vec<f64> = dispatches
        .iter()
        .filter_map(Dispatch::transit_time)
        .map(|duration| duration.num_seconds() as f64 / SECONDS_PER_DAY)
        .collect();
    if durations.is_empty() {
        return None;
    }
    Some(durations.iter().sum::<f64>() / durations.len() as f64)
}
