//! Closed vocabularies for status-like fields and the transition rules between
//! lifecycle states.
//!
//! Dashboard metrics match on the exact wire labels (`needs_truck`,
//! `dispatched`, `in_transit`, `pending`, `paid`, `customer`), so labels must
//! stay stable.

use serde::{Deserialize, Serialize};

use super::domain::{EntityKind, ValidationError};

/// A fixed set of values for one field of one entity kind.
pub trait Vocabulary: Copy + PartialEq + std::fmt::Debug + 'static {
    const ENTITY: EntityKind;
    const FIELD: &'static str;
    const ALL: &'static [Self];
    const LABELS: &'static [&'static str];

    fn label(self) -> &'static str;

    fn parse(raw: &str) -> Result<Self, ValidationError> {
        let wanted = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|value| value.label() == wanted)
            .ok_or_else(|| {
                if Self::FIELD == "status" {
                    ValidationError::InvalidStatus {
                        entity: Self::ENTITY,
                        value: raw.to_string(),
                    }
                } else {
                    ValidationError::input(
                        Self::FIELD,
                        format!("'{raw}' is not one of {}", Self::LABELS.join(", ")),
                    )
                }
            })
    }
}

/// A status vocabulary with a creation default and terminal states.
pub trait Lifecycle: Vocabulary + Default {
    fn is_terminal(self) -> bool;

    /// Any move is allowed except leaving a terminal state. Re-writing the
    /// current value is always allowed.
    fn transition(self, next: Self) -> Result<Self, ValidationError> {
        if self == next || !self.is_terminal() {
            Ok(next)
        } else {
            Err(ValidationError::InvalidTransition {
                entity: Self::ENTITY,
                from: self.label(),
                to: next.label(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl Vocabulary for LeadStatus {
    const ENTITY: EntityKind = EntityKind::Lead;
    const FIELD: &'static str = "status";
    const ALL: &'static [Self] = &[
        Self::New,
        Self::Contacted,
        Self::Qualified,
        Self::Converted,
        Self::Lost,
    ];
    const LABELS: &'static [&'static str] = &["new", "contacted", "qualified", "converted", "lost"];

    fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Converted => "converted",
            Self::Lost => "lost",
        }
    }
}

impl Lifecycle for LeadStatus {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Converted)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    NeedsTruck,
    Dispatched,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Orders counted by the `activeOrders` metric.
    pub const ACTIVE: [Self; 3] = [Self::NeedsTruck, Self::Dispatched, Self::InTransit];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }
}

impl Vocabulary for OrderStatus {
    const ENTITY: EntityKind = EntityKind::Order;
    const FIELD: &'static str = "status";
    const ALL: &'static [Self] = &[
        Self::NeedsTruck,
        Self::Dispatched,
        Self::InTransit,
        Self::Delivered,
        Self::Cancelled,
    ];
    const LABELS: &'static [&'static str] = &[
        "needs_truck",
        "dispatched",
        "in_transit",
        "delivered",
        "cancelled",
    ];

    fn label(self) -> &'static str {
        match self {
            Self::NeedsTruck => "needs_truck",
            Self::Dispatched => "dispatched",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Lifecycle for OrderStatus {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    #[default]
    Assigned,
    EnRoute,
    Delivered,
    Cancelled,
}

impl Vocabulary for DispatchStatus {
    const ENTITY: EntityKind = EntityKind::Dispatch;
    const FIELD: &'static str = "status";
    const ALL: &'static [Self] = &[
        Self::Assigned,
        Self::EnRoute,
        Self::Delivered,
        Self::Cancelled,
    ];
    const LABELS: &'static [&'static str] = &["assigned", "en_route", "delivered", "cancelled"];

    fn label(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::EnRoute => "en_route",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Lifecycle for DispatchStatus {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl Vocabulary for QuoteStatus {
    const ENTITY: EntityKind = EntityKind::Quote;
    const FIELD: &'static str = "status";
    const ALL: &'static [Self] = &[Self::Pending, Self::Accepted, Self::Declined, Self::Expired];
    const LABELS: &'static [&'static str] = &["pending", "accepted", "declined", "expired"];

    fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Expired => "expired",
        }
    }
}

impl Lifecycle for QuoteStatus {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Declined)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Void,
}

impl InvoiceStatus {
    /// Issued but not yet settled.
    pub fn is_outstanding(self) -> bool {
        matches!(self, Self::Sent | Self::Overdue)
    }
}

impl Vocabulary for InvoiceStatus {
    const ENTITY: EntityKind = EntityKind::Invoice;
    const FIELD: &'static str = "status";
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Sent,
        Self::Paid,
        Self::Overdue,
        Self::Void,
    ];
    const LABELS: &'static [&'static str] = &["draft", "sent", "paid", "overdue", "void"];

    fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Void => "void",
        }
    }
}

impl Lifecycle for InvoiceStatus {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Void)
    }
}

/// Who the invoice bills: the shipper (receivable) or the carrier (payable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    Customer,
    Carrier,
}

impl Vocabulary for InvoiceType {
    const ENTITY: EntityKind = EntityKind::Invoice;
    const FIELD: &'static str = "type";
    const ALL: &'static [Self] = &[Self::Customer, Self::Carrier];
    const LABELS: &'static [&'static str] = &["customer", "carrier"];

    fn label(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Carrier => "carrier",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl Vocabulary for FollowUpPriority {
    const ENTITY: EntityKind = EntityKind::FollowUp;
    const FIELD: &'static str = "priority";
    const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::High];
    const LABELS: &'static [&'static str] = &["low", "medium", "high"];

    fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}
