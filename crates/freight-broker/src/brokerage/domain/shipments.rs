use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    assign, assign_number, explicit, initial_status, next_status, require_non_negative,
    require_text, EntityKind, Resource, ValidationError,
};
use crate::brokerage::ids::{NumberAllocator, NumberPrefix};
use crate::brokerage::integrity::Reference;
use crate::brokerage::lifecycle::{DispatchStatus, OrderStatus, Vocabulary};
use crate::store::{Record, RecordKey, Timestamps, UniqueField};

/// A booked shipment for a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub order_number: String,
    pub customer_id: Option<u64>,
    pub customer_name: Option<String>,
    pub lead_id: Option<u64>,
    pub origin_company: Option<String>,
    pub origin_address: String,
    pub origin_city: String,
    pub origin_state: String,
    pub origin_zip_code: String,
    pub destination_company: Option<String>,
    pub destination_address: String,
    pub destination_city: String,
    pub destination_state: String,
    pub destination_zip_code: String,
    pub pickup_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub equipment_type: String,
    pub weight: Option<f64>,
    pub commodity: Option<String>,
    pub customer_rate: Decimal,
    pub status: OrderStatus,
    pub special_instructions: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// Allocated as `ORD-...` when omitted.
    pub order_number: Option<String>,
    pub customer_id: Option<u64>,
    pub customer_name: Option<String>,
    pub lead_id: Option<u64>,
    pub origin_company: Option<String>,
    pub origin_address: String,
    pub origin_city: String,
    pub origin_state: String,
    pub origin_zip_code: String,
    pub destination_company: Option<String>,
    pub destination_address: String,
    pub destination_city: String,
    pub destination_state: String,
    pub destination_zip_code: String,
    pub pickup_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub equipment_type: String,
    pub weight: Option<f64>,
    pub commodity: Option<String>,
    pub customer_rate: Decimal,
    pub status: Option<String>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub order_number: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub customer_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub customer_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub lead_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub origin_company: Option<Option<String>>,
    pub origin_address: Option<String>,
    pub origin_city: Option<String>,
    pub origin_state: Option<String>,
    pub origin_zip_code: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub destination_company: Option<Option<String>>,
    pub destination_address: Option<String>,
    pub destination_city: Option<String>,
    pub destination_state: Option<String>,
    pub destination_zip_code: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "explicit")]
    pub delivery_date: Option<Option<NaiveDate>>,
    pub equipment_type: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub commodity: Option<Option<String>>,
    pub customer_rate: Option<Decimal>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub special_instructions: Option<Option<String>>,
}

impl Order {
    /// Required text fields, checked after every create or patch.
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("orderNumber", &self.order_number)?;
        require_text("originAddress", &self.origin_address)?;
        require_text("originCity", &self.origin_city)?;
        require_text("originState", &self.origin_state)?;
        require_text("originZipCode", &self.origin_zip_code)?;
        require_text("destinationAddress", &self.destination_address)?;
        require_text("destinationCity", &self.destination_city)?;
        require_text("destinationState", &self.destination_state)?;
        require_text("destinationZipCode", &self.destination_zip_code)?;
        require_text("equipmentType", &self.equipment_type)?;
        require_non_negative("customerRate", self.customer_rate)?;
        if self.weight.is_some_and(|weight| weight < 0.0) {
            return Err(ValidationError::input("weight", "must not be negative"));
        }
        if let Some(delivery) = self.delivery_date {
            if delivery < self.pickup_date {
                return Err(ValidationError::input(
                    "deliveryDate",
                    "must not precede pickupDate",
                ));
            }
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

impl Record for Order {
    const KIND: EntityKind = EntityKind::Order;

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
        vec![UniqueField::new("orderNumber", self.order_number.clone())]
    }

    fn references(&self) -> Vec<Reference> {
        [
            Reference::optional("customerId", EntityKind::Customer, self.customer_id),
            Reference::optional("leadId", EntityKind::Lead, self.lead_id),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Resource for Order {
    type Draft = NewOrder;
    type Patch = OrderPatch;

    fn from_draft(draft: NewOrder, numbers: &NumberAllocator) -> Result<Self, ValidationError> {
        let order = Self {
            id: 0,
            order_number: numbers.resolve(draft.order_number, NumberPrefix::Order),
            customer_id: draft.customer_id,
            customer_name: draft.customer_name,
            lead_id: draft.lead_id,
            origin_company: draft.origin_company,
            origin_address: draft.origin_address,
            origin_city: draft.origin_city,
            origin_state: draft.origin_state,
            origin_zip_code: draft.origin_zip_code,
            destination_company: draft.destination_company,
            destination_address: draft.destination_address,
            destination_city: draft.destination_city,
            destination_state: draft.destination_state,
            destination_zip_code: draft.destination_zip_code,
            pickup_date: draft.pickup_date,
            delivery_date: draft.delivery_date,
            equipment_type: draft.equipment_type,
            weight: draft.weight,
            commodity: draft.commodity,
            customer_rate: draft.customer_rate,
            status: initial_status(draft.status)?,
            special_instructions: draft.special_instructions,
            timestamps: Timestamps::default(),
        };
        order.validate()?;
        Ok(order)
    }

    fn apply_patch(&mut self, patch: OrderPatch) -> Result<(), ValidationError> {
        self.status = next_status(self.status, patch.status)?;

        assign_number(&mut self.order_number, patch.order_number);
        assign(&mut self.customer_id, patch.customer_id);
        assign(&mut self.customer_name, patch.customer_name);
        assign(&mut self.lead_id, patch.lead_id);
        assign(&mut self.origin_company, patch.origin_company);
        assign(&mut self.origin_address, patch.origin_address);
        assign(&mut self.origin_city, patch.origin_city);
        assign(&mut self.origin_state, patch.origin_state);
        assign(&mut self.origin_zip_code, patch.origin_zip_code);
        assign(&mut self.destination_company, patch.destination_company);
        assign(&mut self.destination_address, patch.destination_address);
        assign(&mut self.destination_city, patch.destination_city);
        assign(&mut self.destination_state, patch.destination_state);
        assign(&mut self.destination_zip_code, patch.destination_zip_code);
        assign(&mut self.pickup_date, patch.pickup_date);
        assign(&mut self.delivery_date, patch.delivery_date);
        assign(&mut self.equipment_type, patch.equipment_type);
        assign(&mut self.weight, patch.weight);
        assign(&mut self.commodity, patch.commodity);
        assign(&mut self.customer_rate, patch.customer_rate);
        assign(&mut self.special_instructions, patch.special_instructions);
        self.validate()
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.label())
    }

    fn status_vocabulary() -> &'static [&'static str] {
        OrderStatus::LABELS
    }
}

/// Assignment of an order to a carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatch {
    pub id: u64,
    pub order_id: u64,
    pub carrier_id: u64,
    pub carrier_rate: Decimal,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub truck_number: Option<String>,
    pub trailer_number: Option<String>,
    pub status: DispatchStatus,
    pub rate_confirmation_sent: bool,
    pub rate_confirmation_signed: bool,
    pub estimated_pickup_time: Option<DateTime<Utc>>,
    pub actual_pickup_time: Option<DateTime<Utc>>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDispatch {
    pub order_id: u64,
    pub carrier_id: u64,
    pub carrier_rate: Decimal,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub truck_number: Option<String>,
    pub trailer_number: Option<String>,
    pub status: Option<String>,
    pub rate_confirmation_sent: Option<bool>,
    pub rate_confirmation_signed: Option<bool>,
    pub estimated_pickup_time: Option<DateTime<Utc>>,
    pub actual_pickup_time: Option<DateTime<Utc>>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPatch {
    pub order_id: Option<u64>,
    pub carrier_id: Option<u64>,
    pub carrier_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "explicit")]
    pub driver_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub driver_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub truck_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub trailer_number: Option<Option<String>>,
    pub status: Option<String>,
    pub rate_confirmation_sent: Option<bool>,
    pub rate_confirmation_signed: Option<bool>,
    #[serde(default, deserialize_with = "explicit")]
    pub estimated_pickup_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "explicit")]
    pub actual_pickup_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "explicit")]
    pub estimated_delivery_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "explicit")]
    pub actual_delivery_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "explicit")]
    pub notes: Option<Option<String>>,
}

impl Dispatch {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_negative("carrierRate", self.carrier_rate)?;
        if let (Some(pickup), Some(delivery)) = (self.actual_pickup_time, self.actual_delivery_time)
        {
            if delivery < pickup {
                return Err(ValidationError::input(
                    "actualDeliveryTime",
                    "must not precede actualPickupTime",
                ));
            }
        }
        Ok(())
    }

    /// Pickup-to-delivery time of a delivered load with both actuals recorded.
    pub fn transit_time(&self) -> Option<Duration> {
        if self.status != DispatchStatus::Delivered {
            return None;
        }
        match (self.actual_pickup_time, self.actual_delivery_time) {
            (Some(pickup), Some(delivery)) => Some(delivery - pickup),
            _ => None,
        }
    }
}

impl Record for Dispatch {
    const KIND: EntityKind = EntityKind::Dispatch;

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

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::required("orderId", EntityKind::Order, self.order_id),
            Reference::required("carrierId", EntityKind::Carrier, self.carrier_id),
        ]
    }
}

impl Resource for Dispatch {
    type Draft = NewDispatch;
    type Patch = DispatchPatch;

    fn from_draft(draft: NewDispatch, _numbers: &NumberAllocator) -> Result<Self, ValidationError> {
        let dispatch = Self {
            id: 0,
            order_id: draft.order_id,
            carrier_id: draft.carrier_id,
            carrier_rate: draft.carrier_rate,
            driver_name: draft.driver_name,
            driver_phone: draft.driver_phone,
            truck_number: draft.truck_number,
            trailer_number: draft.trailer_number,
            status: initial_status(draft.status)?,
            rate_confirmation_sent: draft.rate_confirmation_sent.unwrap_or(false),
            rate_confirmation_signed: draft.rate_confirmation_signed.unwrap_or(false),
            estimated_pickup_time: draft.estimated_pickup_time,
            actual_pickup_time: draft.actual_pickup_time,
            estimated_delivery_time: draft.estimated_delivery_time,
            actual_delivery_time: draft.actual_delivery_time,
            notes: draft.notes,
            timestamps: Timestamps::default(),
        };
        dispatch.validate()?;
        Ok(dispatch)
    }

    fn apply_patch(&mut self, patch: DispatchPatch) -> Result<(), ValidationError> {
        self.status = next_status(self.status, patch.status)?;

        assign(&mut self.order_id, patch.order_id);
        assign(&mut self.carrier_id, patch.carrier_id);
        assign(&mut self.carrier_rate, patch.carrier_rate);
        assign(&mut self.driver_name, patch.driver_name);
        assign(&mut self.driver_phone, patch.driver_phone);
        assign(&mut self.truck_number, patch.truck_number);
        assign(&mut self.trailer_number, patch.trailer_number);
        assign(&mut self.rate_confirmation_sent, patch.rate_confirmation_sent);
        assign(&mut self.rate_confirmation_signed, patch.rate_confirmation_signed);
        assign(&mut self.estimated_pickup_time, patch.estimated_pickup_time);
        assign(&mut self.actual_pickup_time, patch.actual_pickup_time);
        assign(&mut self.estimated_delivery_time, patch.estimated_delivery_time);
        assign(&mut self.actual_delivery_time, patch.actual_delivery_time);
        assign(&mut self.notes, patch.notes);
        self.validate()
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.label())
    }

    fn status_vocabulary() -> &'static [&'static str] {
        DispatchStatus::LABELS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn chicago_to_dallas() -> NewOrder {
        NewOrder {
            order_number: None,
            customer_id: None,
            customer_name: None,
            lead_id: None,
            origin_company: None,
            origin_address: "100 Dock St".to_string(),
            origin_city: "Chicago".to_string(),
            origin_state: "IL".to_string(),
            origin_zip_code: "60601".to_string(),
            destination_company: None,
            destination_address: "200 Yard Rd".to_string(),
            destination_city: "Dallas".to_string(),
            destination_state: "TX".to_string(),
            destination_zip_code: "75201".to_string(),
            pickup_date: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
            delivery_date: None,
            equipment_type: "dry_van".to_string(),
            weight: Some(42_000.0),
            commodity: None,
            customer_rate: Decimal::new(120_000, 2),
            status: None,
            special_instructions: None,
        }
    }

    #[test]
    fn order_number_is_allocated_when_missing() {
        let order = Order::from_draft(chicago_to_dallas(), &NumberAllocator::default())
            .expect("valid order");
        assert!(order.order_number.starts_with("ORD-"));
        assert_eq!(order.status, OrderStatus::NeedsTruck);
        assert_eq!(order.lane(), "Chicago, IL -> Dallas, TX");
    }

    #[test]
    fn delivery_before_pickup_is_rejected() {
        let mut draft = chicago_to_dallas();
        draft.delivery_date = NaiveDate::from_ymd_opt(2024, 4, 30);
        assert!(matches!(
            Order::from_draft(draft, &NumberAllocator::default()),
            Err(ValidationError::InvalidInput {
                field: "deliveryDate",
                ..
            })
        ));
    }

    #[test]
    fn failed_patch_reports_terminal_transition() {
        let mut order = Order::from_draft(chicago_to_dallas(), &NumberAllocator::default())
            .expect("valid order");
        order.status = OrderStatus::Delivered;
        let patch = OrderPatch {
            status: Some("in_transit".to_string()),
            ..OrderPatch::default()
        };
        assert!(matches!(
            order.apply_patch(patch),
            Err(ValidationError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn transit_time_requires_delivered_status_and_both_actuals() {
        let pickup = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut dispatch = Dispatch::from_draft(
            NewDispatch {
                order_id: 1,
                carrier_id: 1,
                carrier_rate: Decimal::new(90_000, 2),
                actual_pickup_time: Some(pickup),
                actual_delivery_time: Some(pickup + Duration::hours(36)),
                ..NewDispatch::default()
            },
            &NumberAllocator::default(),
        )
        .expect("valid dispatch");

        assert_eq!(dispatch.transit_time(), None);
        dispatch.status = DispatchStatus::Delivered;
        assert_eq!(dispatch.transit_time(), Some(Duration::hours(36)));
    }
}
