//! Foreign-key relationships between brokerage entities and the policy applied
//! when a referenced row is deleted.

use serde::Serialize;

use super::domain::EntityKind;
use crate::store::RecordKey;

/// A non-null foreign key held by a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub target: EntityKind,
    pub key: RecordKey,
}

impl Reference {
    pub fn required(field: &'static str, target: EntityKind, id: u64) -> Self {
        Self {
            field,
            target,
            key: RecordKey::Seq(id),
        }
    }

    pub fn optional(field: &'static str, target: EntityKind, id: Option<u64>) -> Option<Self> {
        id.map(|id| Self::required(field, target, id))
    }
}

/// What happens to dependents when their target row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// The delete fails while any dependent exists.
    Restrict,
    /// The dependent's foreign key is set to null.
    Nullify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    pub dependent: EntityKind,
    pub field: &'static str,
    pub target: EntityKind,
    pub on_delete: DeletePolicy,
}

const fn link(
    dependent: EntityKind,
    field: &'static str,
    target: EntityKind,
    on_delete: DeletePolicy,
) -> Relationship {
    Relationship {
        dependent,
        field,
        target,
        on_delete,
    }
}

/// Every foreign key in the model. Nullify is only declared on nullable fields.
pub const RELATIONSHIPS: &[Relationship] = &[
    link(EntityKind::Order, "customerId", EntityKind::Customer, DeletePolicy::Restrict),
    link(EntityKind::Order, "leadId", EntityKind::Lead, DeletePolicy::Restrict),
    link(EntityKind::Dispatch, "orderId", EntityKind::Order, DeletePolicy::Restrict),
    link(EntityKind::Dispatch, "carrierId", EntityKind::Carrier, DeletePolicy::Restrict),
    link(EntityKind::Quote, "leadId", EntityKind::Lead, DeletePolicy::Restrict),
    link(EntityKind::Quote, "customerId", EntityKind::Customer, DeletePolicy::Restrict),
    link(EntityKind::Invoice, "customerId", EntityKind::Customer, DeletePolicy::Restrict),
    link(EntityKind::Invoice, "carrierId", EntityKind::Carrier, DeletePolicy::Restrict),
    link(EntityKind::Invoice, "orderId", EntityKind::Order, DeletePolicy::Restrict),
    link(EntityKind::Invoice, "dispatchId", EntityKind::Dispatch, DeletePolicy::Restrict),
    link(EntityKind::FollowUp, "leadId", EntityKind::Lead, DeletePolicy::Nullify),
    link(EntityKind::FollowUp, "customerId", EntityKind::Customer, DeletePolicy::Nullify),
    link(EntityKind::FollowUp, "carrierId", EntityKind::Carrier, DeletePolicy::Nullify),
    link(EntityKind::FollowUp, "orderId", EntityKind::Order, DeletePolicy::Nullify),
];

pub fn relationship(dependent: EntityKind, field: &str) -> Option<&'static Relationship> {
    RELATIONSHIPS
        .iter()
        .find(|rel| rel.dependent == dependent && rel.field == field)
}

/// Delete policy for a dependent field. Undeclared links restrict.
pub fn delete_policy(dependent: EntityKind, field: &str) -> DeletePolicy {
    relationship(dependent, field)
        .map(|rel| rel.on_delete)
        .unwrap_or(DeletePolicy::Restrict)
}

/// A row that points at another row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependent {
    pub kind: EntityKind,
    pub key: RecordKey,
    pub field: &'static str,
}

/// Fails with [`IntegrityError::DanglingReference`] on the first reference
/// whose target is missing.
pub fn verify_references<F>(references: &[Reference], exists: F) -> Result<(), IntegrityError>
where
    F: Fn(EntityKind, &RecordKey) -> bool,
{
    for reference in references {
        if !exists(reference.target, &reference.key) {
            return Err(IntegrityError::DanglingReference {
                field: reference.field,
                target: reference.target,
                key: reference.key.clone(),
            });
        }
    }
    Ok(())
}

/// Splits the dependents of a row about to be deleted. Returns the dependents
/// whose foreign key must be nulled, or fails if any restricting dependent
/// exists.
pub fn plan_deletion(
    kind: EntityKind,
    key: &RecordKey,
    dependents: Vec<Dependent>,
) -> Result<Vec<Dependent>, IntegrityError> {
    let (nullify, restrict): (Vec<_>, Vec<_>) = dependents
        .into_iter()
        .partition(|dep| delete_policy(dep.kind, dep.field) == DeletePolicy::Nullify);

    if restrict.is_empty() {
        Ok(nullify)
    } else {
        Err(IntegrityError::ReferencedByDependents {
            kind,
            key: key.clone(),
            dependents: restrict,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationships_are_declared_once() {
        for (index, rel) in RELATIONSHIPS.iter().enumerate() {
            let duplicates = RELATIONSHIPS[index + 1..]
                .iter()
                .filter(|other| other.dependent == rel.dependent && other.field == rel.field)
                .count();
            assert_eq!(duplicates, 0, "{} {} declared twice", rel.dependent, rel.field);
        }
    }

    #[test]
    fn structural_links_restrict_and_reminders_nullify() {
        assert_eq!(
            delete_policy(EntityKind::Order, "customerId"),
            DeletePolicy::Restrict
        );
        assert_eq!(
            delete_policy(EntityKind::Dispatch, "orderId"),
            DeletePolicy::Restrict
        );
        assert_eq!(
            delete_policy(EntityKind::FollowUp, "customerId"),
            DeletePolicy::Nullify
        );
        assert_eq!(
            delete_policy(EntityKind::Lead, "unknownId"),
            DeletePolicy::Restrict
        );
    }

    #[test]
    fn verify_references_reports_first_missing_target() {
        let references = vec![
            Reference::required("orderId", EntityKind::Order, 1),
            Reference::required("carrierId", EntityKind::Carrier, 9),
        ];

        let result = verify_references(&references, |kind, key| {
            kind == EntityKind::Order && *key == RecordKey::Seq(1)
        });

        match result {
            Err(IntegrityError::DanglingReference { field, target, key }) => {
                assert_eq!(field, "carrierId");
                assert_eq!(target, EntityKind::Carrier);
                assert_eq!(key, RecordKey::Seq(9));
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn plan_deletion_restricts_when_any_dependent_restricts() {
        let key = RecordKey::Seq(4);
        let dependents = vec![
            Dependent {
                kind: EntityKind::FollowUp,
                key: RecordKey::Seq(1),
                field: "customerId",
            },
            Dependent {
                kind: EntityKind::Order,
                key: RecordKey::Seq(2),
                field: "customerId",
            },
        ];

        match plan_deletion(EntityKind::Customer, &key, dependents) {
            Err(IntegrityError::ReferencedByDependents { dependents, .. }) => {
                assert_eq!(dependents.len(), 1);
                assert_eq!(dependents[0].kind, EntityKind::Order);
            }
            other => panic!("expected restricted delete, got {other:?}"),
        }
    }

    #[test]
    fn plan_deletion_returns_nullable_dependents() {
        let key = RecordKey::Seq(4);
        let dependents = vec![Dependent {
            kind: EntityKind::FollowUp,
            key: RecordKey::Seq(1),
            field: "leadId",
        }];

        let detached =
            plan_deletion(EntityKind::Lead, &key, dependents).expect("follow-ups detach");
        assert_eq!(detached.len(), 1);
    }
}
