use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{assign, explicit, require_text, EntityKind, Resource, ValidationError};
use crate::brokerage::ids::NumberAllocator;
use crate::brokerage::integrity::Reference;
use crate::brokerage::lifecycle::{FollowUpPriority, Vocabulary};
use crate::store::{Record, RecordKey, Timestamps};

/// Reminder task, optionally attached to a lead, customer, carrier or order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub follow_up_type: String,
    pub lead_id: Option<u64>,
    pub customer_id: Option<u64>,
    pub carrier_id: Option<u64>,
    pub order_id: Option<u64>,
    pub due_date: DateTime<Utc>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub priority: FollowUpPriority,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFollowUp {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub follow_up_type: String,
    pub lead_id: Option<u64>,
    pub customer_id: Option<u64>,
    pub carrier_id: Option<u64>,
    pub order_id: Option<u64>,
    pub due_date: DateTime<Utc>,
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub description: Option<Option<String>>,
    #[serde(rename = "type")]
    pub follow_up_type: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub lead_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub customer_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub carrier_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub order_id: Option<Option<u64>>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "explicit")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub notes: Option<Option<String>>,
}

impl FollowUp {
    /// Open high-priority task.
    pub fn is_urgent(&self) -> bool {
        self.priority == FollowUpPriority::High && !self.completed
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("type", &self.follow_up_type)
    }
}

impl Record for FollowUp {
    const KIND: EntityKind = EntityKind::FollowUp;

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
        [
            Reference::optional("leadId", EntityKind::Lead, self.lead_id),
            Reference::optional("customerId", EntityKind::Customer, self.customer_id),
            Reference::optional("carrierId", EntityKind::Carrier, self.carrier_id),
            Reference::optional("orderId", EntityKind::Order, self.order_id),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn clear_reference(&mut self, field: &'static str) {
        match field {
            "leadId" => self.lead_id = None,
            "customerId" => self.customer_id = None,
            "carrierId" => self.carrier_id = None,
            "orderId" => self.order_id = None,
            _ => {}
        }
    }
}

impl Resource for FollowUp {
    type Draft = NewFollowUp;
    type Patch = FollowUpPatch;

    fn from_draft(draft: NewFollowUp, _numbers: &NumberAllocator) -> Result<Self, ValidationError> {
        let priority = match draft.priority {
            Some(raw) => FollowUpPriority::parse(&raw)?,
            None => FollowUpPriority::default(),
        };
        let completed = draft.completed.unwrap_or(false);

        let follow_up = Self {
            id: 0,
            title: draft.title,
            description: draft.description,
            follow_up_type: draft.follow_up_type,
            lead_id: draft.lead_id,
            customer_id: draft.customer_id,
            carrier_id: draft.carrier_id,
            order_id: draft.order_id,
            due_date: draft.due_date,
            completed,
            completed_at: completed.then(Utc::now),
            priority,
            assigned_to: draft.assigned_to,
            notes: draft.notes,
            timestamps: Timestamps::default(),
        };
        follow_up.validate()?;
        Ok(follow_up)
    }

    fn apply_patch(&mut self, patch: FollowUpPatch) -> Result<(), ValidationError> {
        if let Some(raw) = patch.priority {
            self.priority = FollowUpPriority::parse(&raw)?;
        }

        assign(&mut self.title, patch.title);
        assign(&mut self.description, patch.description);
        assign(&mut self.follow_up_type, patch.follow_up_type);
        assign(&mut self.lead_id, patch.lead_id);
        assign(&mut self.customer_id, patch.customer_id);
        assign(&mut self.carrier_id, patch.carrier_id);
        assign(&mut self.order_id, patch.order_id);
        assign(&mut self.due_date, patch.due_date);
        assign(&mut self.assigned_to, patch.assigned_to);
        assign(&mut self.notes, patch.notes);
        assign(&mut self.completed_at, patch.completed_at);

        match patch.completed {
            Some(true) if !self.completed => {
                self.completed = true;
                if self.completed_at.is_none() {
                    self.completed_at = Some(Utc::now());
                }
            }
            Some(false) => {
                self.completed = false;
                self.completed_at = None;
            }
            _ => {}
        }
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_back() -> FollowUp {
        let draft: NewFollowUp = serde_json::from_value(serde_json::json!({
            "title": "Call back about reefer lane",
            "type": "call",
            "dueDate": "2024-05-02T15:00:00Z",
            "priority": "high",
        }))
        .expect("draft parses");
        FollowUp::from_draft(draft, &NumberAllocator::default()).expect("valid follow-up")
    }

    #[test]
    fn completing_stamps_and_reopening_clears() {
        let mut task = call_back();
        assert!(task.is_urgent());
        assert_eq!(task.completed_at, None);

        task.apply_patch(FollowUpPatch {
            completed: Some(true),
            ..FollowUpPatch::default()
        })
        .expect("completes");
        assert!(task.completed);
        assert!(task.completed_at.is_some());
        assert!(!task.is_urgent());

        task.apply_patch(FollowUpPatch {
            completed: Some(false),
            ..FollowUpPatch::default()
        })
        .expect("reopens");
        assert_eq!(task.completed_at, None);
        assert!(task.is_urgent());
    }

    #[test]
    fn clear_reference_only_touches_named_field() {
        let mut task = call_back();
        task.lead_id = Some(3);
        task.order_id = Some(9);
        task.clear_reference("leadId");
        assert_eq!(task.lead_id, None);
        assert_eq!(task.order_id, Some(9));
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let mut task = call_back();
        let result = task.apply_patch(FollowUpPatch {
            priority: Some("urgent".to_string()),
            ..FollowUpPatch::default()
        });
        assert!(matches!(
            result,
            Err(ValidationError::InvalidInput {
                field: "priority",
                ..
            })
        ));
    }
}
