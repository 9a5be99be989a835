use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    assign, explicit, initial_status, next_status, require_email, require_non_negative,
    require_text, EntityKind, Resource, ValidationError,
};
use crate::brokerage::ids::NumberAllocator;
use crate::brokerage::lifecycle::{LeadStatus, Vocabulary};
use crate::store::{Record, RecordKey, Timestamps};

const DEFAULT_PAYMENT_TERMS: &str = "Net 30";

/// Prospective shipper that has not signed on yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: u64,
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub origin_city: Option<String>,
    pub origin_state: Option<String>,
    pub destination_city: Option<String>,
    pub destination_state: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub equipment_type: Option<String>,
    pub commodity: Option<String>,
    pub weight: Option<u32>,
    pub notes: Option<String>,
    pub status: LeadStatus,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub origin_city: Option<String>,
    pub origin_state: Option<String>,
    pub destination_city: Option<String>,
    pub destination_state: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub equipment_type: Option<String>,
    pub commodity: Option<String>,
    pub weight: Option<u32>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    pub company_name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub origin_city: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub origin_state: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub destination_city: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub destination_state: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub pickup_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "explicit")]
    pub equipment_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub commodity: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub weight: Option<Option<u32>>,
    #[serde(default, deserialize_with = "explicit")]
    pub notes: Option<Option<String>>,
    pub status: Option<String>,
}

/// Validates the contact block shared by leads, customers and carriers.
fn check_contact(
    company_name: Option<&str>,
    contact_person: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<(), ValidationError> {
    if let Some(value) = company_name {
        require_text("companyName", value)?;
    }
    if let Some(value) = contact_person {
        require_text("contactPerson", value)?;
    }
    if let Some(value) = email {
        require_email("email", value)?;
    }
    if let Some(value) = phone {
        require_text("phone", value)?;
    }
    Ok(())
}

impl Record for Lead {
    const KIND: EntityKind = EntityKind::Lead;

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
}

impl Resource for Lead {
    type Draft = NewLead;
    type Patch = LeadPatch;

    fn from_draft(draft: NewLead, _numbers: &NumberAllocator) -> Result<Self, ValidationError> {
        check_contact(
            Some(&draft.company_name),
            Some(&draft.contact_person),
            Some(&draft.email),
            Some(&draft.phone),
        )?;

        Ok(Self {
            id: 0,
            company_name: draft.company_name,
            contact_person: draft.contact_person,
            email: draft.email,
            phone: draft.phone,
            origin_city: draft.origin_city,
            origin_state: draft.origin_state,
            destination_city: draft.destination_city,
            destination_state: draft.destination_state,
            pickup_date: draft.pickup_date,
            equipment_type: draft.equipment_type,
            commodity: draft.commodity,
            weight: draft.weight,
            notes: draft.notes,
            status: initial_status(draft.status)?,
            timestamps: Timestamps::default(),
        })
    }

    fn apply_patch(&mut self, patch: LeadPatch) -> Result<(), ValidationError> {
        check_contact(
            patch.company_name.as_deref(),
            patch.contact_person.as_deref(),
            patch.email.as_deref(),
            patch.phone.as_deref(),
        )?;
        self.status = next_status(self.status, patch.status)?;

        assign(&mut self.company_name, patch.company_name);
        assign(&mut self.contact_person, patch.contact_person);
        assign(&mut self.email, patch.email);
        assign(&mut self.phone, patch.phone);
        assign(&mut self.origin_city, patch.origin_city);
        assign(&mut self.origin_state, patch.origin_state);
        assign(&mut self.destination_city, patch.destination_city);
        assign(&mut self.destination_state, patch.destination_state);
        assign(&mut self.pickup_date, patch.pickup_date);
        assign(&mut self.equipment_type, patch.equipment_type);
        assign(&mut self.commodity, patch.commodity);
        assign(&mut self.weight, patch.weight);
        assign(&mut self.notes, patch.notes);
        Ok(())
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.label())
    }

    fn status_vocabulary() -> &'static [&'static str] {
        LeadStatus::LABELS
    }
}

/// Signed shipper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: u64,
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub billing_address: Option<String>,
    pub billing_city: Option<String>,
    pub billing_state: Option<String>,
    pub billing_zip_code: Option<String>,
    pub credit_limit: Option<Decimal>,
    pub payment_terms: String,
    pub special_instructions: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub billing_address: Option<String>,
    pub billing_city: Option<String>,
    pub billing_state: Option<String>,
    pub billing_zip_code: Option<String>,
    pub credit_limit: Option<Decimal>,
    pub payment_terms: Option<String>,
    pub special_instructions: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    pub company_name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub zip_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub billing_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub billing_city: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub billing_state: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub billing_zip_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub credit_limit: Option<Option<Decimal>>,
    pub payment_terms: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub special_instructions: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl Customer {
    /// Billing block, falling back to the street address when unset.
    pub fn billing_lines(&self) -> Vec<String> {
        let street = self.billing_address.as_ref().or(self.address.as_ref());
        let city = self.billing_city.as_ref().or(self.city.as_ref());
        let state = self.billing_state.as_ref().or(self.state.as_ref());
        let zip = self.billing_zip_code.as_ref().or(self.zip_code.as_ref());

        let mut lines = Vec::new();
        if let Some(street) = street {
            lines.push(street.clone());
        }
        let locality = [city, state, zip]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        if !locality.is_empty() {
            lines.push(locality);
        }
        lines
    }
}

impl Record for Customer {
    const KIND: EntityKind = EntityKind::Customer;

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
}

impl Resource for Customer {
    type Draft = NewCustomer;
    type Patch = CustomerPatch;

    fn from_draft(draft: NewCustomer, _numbers: &NumberAllocator) -> Result<Self, ValidationError> {
        check_contact(
            Some(&draft.company_name),
            Some(&draft.contact_person),
            Some(&draft.email),
            Some(&draft.phone),
        )?;
        if let Some(limit) = draft.credit_limit {
            require_non_negative("creditLimit", limit)?;
        }
        let payment_terms = match draft.payment_terms {
            Some(terms) => {
                require_text("paymentTerms", &terms)?;
                terms
            }
            None => DEFAULT_PAYMENT_TERMS.to_string(),
        };

        Ok(Self {
            id: 0,
            company_name: draft.company_name,
            contact_person: draft.contact_person,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            city: draft.city,
            state: draft.state,
            zip_code: draft.zip_code,
            billing_address: draft.billing_address,
            billing_city: draft.billing_city,
            billing_state: draft.billing_state,
            billing_zip_code: draft.billing_zip_code,
            credit_limit: draft.credit_limit,
            payment_terms,
            special_instructions: draft.special_instructions,
            is_active: draft.is_active.unwrap_or(true),
            timestamps: Timestamps::default(),
        })
    }

    fn apply_patch(&mut self, patch: CustomerPatch) -> Result<(), ValidationError> {
        check_contact(
            patch.company_name.as_deref(),
            patch.contact_person.as_deref(),
            patch.email.as_deref(),
            patch.phone.as_deref(),
        )?;
        if let Some(Some(limit)) = patch.credit_limit {
            require_non_negative("creditLimit", limit)?;
        }
        if let Some(terms) = &patch.payment_terms {
            require_text("paymentTerms", terms)?;
        }

        assign(&mut self.company_name, patch.company_name);
        assign(&mut self.contact_person, patch.contact_person);
        assign(&mut self.email, patch.email);
        assign(&mut self.phone, patch.phone);
        assign(&mut self.address, patch.address);
        assign(&mut self.city, patch.city);
        assign(&mut self.state, patch.state);
        assign(&mut self.zip_code, patch.zip_code);
        assign(&mut self.billing_address, patch.billing_address);
        assign(&mut self.billing_city, patch.billing_city);
        assign(&mut self.billing_state, patch.billing_state);
        assign(&mut self.billing_zip_code, patch.billing_zip_code);
        assign(&mut self.credit_limit, patch.credit_limit);
        assign(&mut self.payment_terms, patch.payment_terms);
        assign(&mut self.special_instructions, patch.special_instructions);
        assign(&mut self.is_active, patch.is_active);
        Ok(())
    }
}

/// Trucking company that hauls loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    pub id: u64,
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub mc_number: Option<String>,
    pub dot_number: Option<String>,
    pub insurance_expiry: Option<NaiveDate>,
    pub w9_on_file: bool,
    pub performance_rating: Decimal,
    pub preferred_lanes: Option<String>,
    pub equipment_types: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCarrier {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub mc_number: Option<String>,
    pub dot_number: Option<String>,
    pub insurance_expiry: Option<NaiveDate>,
    pub w9_on_file: Option<bool>,
    pub performance_rating: Option<Decimal>,
    pub preferred_lanes: Option<String>,
    pub equipment_types: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierPatch {
    pub company_name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub zip_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub mc_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub dot_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub insurance_expiry: Option<Option<NaiveDate>>,
    pub w9_on_file: Option<bool>,
    pub performance_rating: Option<Decimal>,
    #[serde(default, deserialize_with = "explicit")]
    pub preferred_lanes: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub equipment_types: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub notes: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl Record for Carrier {
    const KIND: EntityKind = EntityKind::Carrier;

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
}

impl Resource for Carrier {
    type Draft = NewCarrier;
    type Patch = CarrierPatch;

    fn from_draft(draft: NewCarrier, _numbers: &NumberAllocator) -> Result<Self, ValidationError> {
        check_contact(
            Some(&draft.company_name),
            Some(&draft.contact_person),
            Some(&draft.email),
            Some(&draft.phone),
        )?;
        let performance_rating = draft.performance_rating.unwrap_or(Decimal::ZERO);
        require_non_negative("performanceRating", performance_rating)?;

        Ok(Self {
            id: 0,
            company_name: draft.company_name,
            contact_person: draft.contact_person,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            city: draft.city,
            state: draft.state,
            zip_code: draft.zip_code,
            mc_number: draft.mc_number,
            dot_number: draft.dot_number,
            insurance_expiry: draft.insurance_expiry,
            w9_on_file: draft.w9_on_file.unwrap_or(false),
            performance_rating,
            preferred_lanes: draft.preferred_lanes,
            equipment_types: draft.equipment_types,
            notes: draft.notes,
            is_active: draft.is_active.unwrap_or(true),
            timestamps: Timestamps::default(),
        })
    }

    fn apply_patch(&mut self, patch: CarrierPatch) -> Result<(), ValidationError> {
        check_contact(
            patch.company_name.as_deref(),
            patch.contact_person.as_deref(),
            patch.email.as_deref(),
            patch.phone.as_deref(),
        )?;
        if let Some(rating) = patch.performance_rating {
            require_non_negative("performanceRating", rating)?;
        }

        assign(&mut self.company_name, patch.company_name);
        assign(&mut self.contact_person, patch.contact_person);
        assign(&mut self.email, patch.email);
        assign(&mut self.phone, patch.phone);
        assign(&mut self.address, patch.address);
        assign(&mut self.city, patch.city);
        assign(&mut self.state, patch.state);
        assign(&mut self.zip_code, patch.zip_code);
        assign(&mut self.mc_number, patch.mc_number);
        assign(&mut self.dot_number, patch.dot_number);
        assign(&mut self.insurance_expiry, patch.insurance_expiry);
        assign(&mut self.w9_on_file, patch.w9_on_file);
        assign(&mut self.performance_rating, patch.performance_rating);
        assign(&mut self.preferred_lanes, patch.preferred_lanes);
        assign(&mut self.equipment_types, patch.equipment_types);
        assign(&mut self.notes, patch.notes);
        assign(&mut self.is_active, patch.is_active);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> NewCustomer {
        NewCustomer {
            company_name: "Acme".to_string(),
            contact_person: "Road Runner".to_string(),
            email: "shipping@acme.test".to_string(),
            phone: "555-0100".to_string(),
            ..NewCustomer::default()
        }
    }

    #[test]
    fn customer_defaults_payment_terms_and_active_flag() {
        let customer =
            Customer::from_draft(acme(), &NumberAllocator::default()).expect("valid customer");
        assert_eq!(customer.payment_terms, "Net 30");
        assert!(customer.is_active);
    }

    #[test]
    fn blank_company_name_is_rejected() {
        let mut draft = acme();
        draft.company_name = "  ".to_string();
        assert_eq!(
            Customer::from_draft(draft, &NumberAllocator::default()),
            Err(ValidationError::input("companyName", "must not be blank"))
        );
    }

    #[test]
    fn lead_patch_keeps_omitted_fields() {
        let mut lead = Lead::from_draft(
            NewLead {
                company_name: "Globex".to_string(),
                contact_person: "Hank".to_string(),
                email: "hank@globex.test".to_string(),
                phone: "555-0101".to_string(),
                commodity: Some("Steel coils".to_string()),
                notes: Some("Prefers mornings".to_string()),
                ..NewLead::default()
            },
            &NumberAllocator::default(),
        )
        .expect("valid lead");

        let patch: LeadPatch =
            serde_json::from_str(r#"{"status":"contacted","notes":null}"#).expect("patch parses");
        lead.apply_patch(patch).expect("patch applies");

        assert_eq!(lead.status, LeadStatus::Contacted);
        assert_eq!(lead.company_name, "Globex");
        assert_eq!(lead.commodity.as_deref(), Some("Steel coils"));
        assert_eq!(lead.notes, None);
    }

    #[test]
    fn billing_lines_fall_back_to_street_address() {
        let mut draft = acme();
        draft.address = Some("1 Desert Rd".to_string());
        draft.city = Some("Mesa".to_string());
        draft.state = Some("AZ".to_string());
        draft.billing_zip_code = Some("85201".to_string());
        let customer =
            Customer::from_draft(draft, &NumberAllocator::default()).expect("valid customer");

        assert_eq!(
            customer.billing_lines(),
            vec!["1 Desert Rd".to_string(), "Mesa AZ 85201".to_string()]
        );
    }
}
