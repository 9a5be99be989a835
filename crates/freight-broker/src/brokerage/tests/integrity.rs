use super::common::*;
use crate::brokerage::domain::{
    Carrier, Customer, Dispatch, DispatchPatch, FollowUp, Invoice, Lead, Order, OrderPatch, Quote,
};
use crate::brokerage::{BrokerageError, EntityKind};
use crate::store::RecordKey;

#[test]
fn deleting_a_referenced_customer_is_restricted() {
    let service = build_service();
    let customer = service.create::<Customer>(acme()).expect("customer created");
    let order = service
        .create::<Order>(order_for(Some(customer.id)))
        .expect("order created");

    match service.delete::<Customer>(&customer.id.into()) {
        Err(BrokerageError::ReferencedByDependents {
            kind,
            key,
            dependents,
        }) => {
            assert_eq!(kind, EntityKind::Customer);
            assert_eq!(key, RecordKey::Seq(customer.id));
            assert_eq!(dependents.len(), 1);
            assert_eq!(dependents[0].kind, EntityKind::Order);
            assert_eq!(dependents[0].key, RecordKey::Seq(order.id));
            assert_eq!(dependents[0].field, "customerId");
        }
        other => panic!("expected restricted delete, got {other:?}"),
    }

    let still_there: Customer = service
        .get(&customer.id.into())
        .expect("customer survives");
    assert_eq!(still_there.id, customer.id);
}

#[test]
fn deleting_a_customer_detaches_follow_ups() {
    let service = build_service();
    let customer = service.create::<Customer>(acme()).expect("customer created");
    let mut draft = follow_up("Check credit", "medium", 3);
    draft.customer_id = Some(customer.id);
    let task = service.create::<FollowUp>(draft).expect("follow-up created");

    service
        .delete::<Customer>(&customer.id.into())
        .expect("follow-ups do not block deletion");

    let task_after: FollowUp = service.get(&task.id.into()).expect("follow-up kept");
    assert_eq!(task_after.customer_id, None);
    assert_eq!(task_after.title, "Check credit");
    assert!(task_after.timestamps.updated_at >= task.timestamps.updated_at);
    assert!(matches!(
        service.get::<Customer>(&customer.id.into()),
        Err(BrokerageError::NotFound { .. })
    ));
}

#[test]
fn any_restricting_dependent_blocks_detaching_the_rest() {
    let service = build_service();
    let lead = service.create::<Lead>(globex()).expect("lead created");
    let mut draft = follow_up("Send quote", "high", 4);
    draft.lead_id = Some(lead.id);
    let task = service.create::<FollowUp>(draft).expect("follow-up created");
    service
        .create::<Quote>(quote_for(Some(lead.id), None))
        .expect("quote created");

    assert!(matches!(
        service.delete::<Lead>(&lead.id.into()),
        Err(BrokerageError::ReferencedByDependents { .. })
    ));

    let task_after: FollowUp = service.get(&task.id.into()).expect("follow-up kept");
    assert_eq!(task_after.lead_id, Some(lead.id));
}

#[test]
fn orders_are_released_once_dispatches_are_gone() {
    let service = build_service();
    let carrier = service.create::<Carrier>(roadrunner()).expect("carrier created");
    let order = service.create::<Order>(order_for(None)).expect("order created");
    let dispatch = service
        .create::<Dispatch>(dispatch_for(order.id, carrier.id))
        .expect("dispatch created");

    assert!(matches!(
        service.delete::<Order>(&order.id.into()),
        Err(BrokerageError::ReferencedByDependents { .. })
    ));
    assert!(matches!(
        service.delete::<Carrier>(&carrier.id.into()),
        Err(BrokerageError::ReferencedByDependents { .. })
    ));

    service
        .delete::<Dispatch>(&dispatch.id.into())
        .expect("dispatch deleted");
    service
        .delete::<Order>(&order.id.into())
        .expect("order deleted");
    service
        .delete::<Carrier>(&carrier.id.into())
        .expect("carrier deleted");
}

#[test]
fn invoices_pin_their_dispatch() {
    let service = build_service();
    let carrier = service.create::<Carrier>(roadrunner()).expect("carrier created");
    let order = service.create::<Order>(order_for(None)).expect("order created");
    let dispatch = service
        .create::<Dispatch>(dispatch_for(order.id, carrier.id))
        .expect("dispatch created");
    let mut draft = invoice("carrier", "draft", "950.00");
    draft.carrier_id = Some(carrier.id);
    draft.dispatch_id = Some(dispatch.id);
    service.create::<Invoice>(draft).expect("invoice created");

    match service.delete::<Dispatch>(&dispatch.id.into()) {
        Err(BrokerageError::ReferencedByDependents { dependents, .. }) => {
            assert_eq!(dependents.len(), 1);
            assert_eq!(dependents[0].kind, EntityKind::Invoice);
            assert_eq!(dependents[0].field, "dispatchId");
        }
        other => panic!("expected restricted delete, got {other:?}"),
    }
}

#[test]
fn dispatch_requires_order_and_carrier() {
    let service = build_service();
    let carrier = service.create::<Carrier>(roadrunner()).expect("carrier created");

    match service.create::<Dispatch>(dispatch_for(5, carrier.id)) {
        Err(BrokerageError::DanglingReference { field, .. }) => assert_eq!(field, "orderId"),
        other => panic!("expected dangling order, got {other:?}"),
    }

    let order = service.create::<Order>(order_for(None)).expect("order created");
    match service.create::<Dispatch>(dispatch_for(order.id, 77)) {
        Err(BrokerageError::DanglingReference { field, target, .. }) => {
            assert_eq!(field, "carrierId");
            assert_eq!(target, EntityKind::Carrier);
        }
        other => panic!("expected dangling carrier, got {other:?}"),
    }
}

#[test]
fn update_cannot_introduce_a_dangling_reference() {
    let service = build_service();
    let customer = service.create::<Customer>(acme()).expect("customer created");
    let order = service
        .create::<Order>(order_for(Some(customer.id)))
        .expect("order created");

    let patch = OrderPatch {
        customer_id: Some(Some(999)),
        ..OrderPatch::default()
    };
    assert!(matches!(
        service.update::<Order>(&order.id.into(), patch),
        Err(BrokerageError::DanglingReference {
            field: "customerId",
            ..
        })
    ));

    let stored: Order = service.get(&order.id.into()).expect("order readable");
    assert_eq!(stored.customer_id, Some(customer.id));
}

#[test]
fn clearing_a_reference_releases_the_target() {
    let service = build_service();
    let customer = service.create::<Customer>(acme()).expect("customer created");
    let order = service
        .create::<Order>(order_for(Some(customer.id)))
        .expect("order created");

    let patch = OrderPatch {
        customer_id: Some(None),
        ..OrderPatch::default()
    };
    let detached = service
        .update::<Order>(&order.id.into(), patch)
        .expect("reference cleared");
    assert_eq!(detached.customer_id, None);

    service
        .delete::<Customer>(&customer.id.into())
        .expect("customer no longer referenced");
}

#[test]
fn reassigning_a_dispatch_checks_the_new_carrier() {
    let service = build_service();
    let carrier = service.create::<Carrier>(roadrunner()).expect("carrier created");
    let order = service.create::<Order>(order_for(None)).expect("order created");
    let dispatch = service
        .create::<Dispatch>(dispatch_for(order.id, carrier.id))
        .expect("dispatch created");

    let patch = DispatchPatch {
        carrier_id: Some(carrier.id + 1),
        ..DispatchPatch::default()
    };
    assert!(matches!(
        service.update::<Dispatch>(&dispatch.id.into(), patch),
        Err(BrokerageError::DanglingReference {
            field: "carrierId",
            ..
        })
    ));
}

#[test]
fn deleting_a_missing_row_is_not_found() {
    let service = build_service();
    assert!(matches!(
        service.delete::<Quote>(&RecordKey::Seq(3)),
        Err(BrokerageError::NotFound {
            kind: EntityKind::Quote,
            ..
        })
    ));
}
