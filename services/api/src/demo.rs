use crate::infra::{Brokerage, Services};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use freight_broker::brokerage::{
    BrokerageError, Carrier, Customer, Dispatch, FollowUp, Invoice, Lead, NewCarrier, NewCustomer,
    NewDispatch, NewFollowUp, NewInvoice, NewLead, NewOrder, NewQuote, Order, Quote,
};
use freight_broker::error::AppError;
use freight_broker::store::InMemoryStore;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for the seeded schedule (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip printing the rendered invoice.
    #[arg(long)]
    pub(crate) skip_documents: bool,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Rows created by [`seed`] that the demo reports on.
pub(crate) struct SeededBrokerage {
    pub(crate) order: Order,
    pub(crate) paid_invoice: Invoice,
    pub(crate) open_invoice: Invoice,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        skip_documents,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let services = Services::over(Arc::new(InMemoryStore::default()));
    let brokerage = services.brokerage;

    println!("Freight brokerage demo ({today})");
    let seeded = match seed(&brokerage, today) {
        Ok(seeded) => seeded,
        Err(err) => {
            println!("  Seeding failed: {err}");
            return Ok(());
        }
    };
    println!(
        "- Order {} booked on {}",
        seeded.order.order_number,
        seeded.order.lane()
    );

    match brokerage.dashboard() {
        Ok(stats) => {
            println!("\nDashboard");
            println!(
                "- {} active orders | {} in transit | {} pending quotes",
                stats.active_orders, stats.in_transit, stats.pending_quotes
            );
            println!(
                "- ${:.2} collected | {} invoices awaiting payment",
                stats.total_revenue, stats.pending_invoices
            );
            match stats.avg_delivery_time {
                Some(days) => println!("- {days:.1} days average delivery"),
                None => println!("- no completed deliveries yet"),
            }
            println!(
                "- {} leads | {} customers | {} carriers | {} orders",
                stats.total_leads, stats.total_customers, stats.total_carriers, stats.total_orders
            );
        }
        Err(err) => println!("  Dashboard unavailable: {err}"),
    }

    match brokerage.urgent_follow_ups() {
        Ok(tasks) if tasks.is_empty() => println!("\nNo urgent follow-ups"),
        Ok(tasks) => {
            println!("\nUrgent follow-ups");
            for task in tasks {
                println!(
                    "  - {} (due {})",
                    task.title,
                    task.due_date.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Err(err) => println!("  Follow-ups unavailable: {err}"),
    }

    println!(
        "\nInvoices: {} paid on {}, {} due {}",
        seeded.paid_invoice.invoice_number,
        seeded
            .paid_invoice
            .paid_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string()),
        seeded.open_invoice.invoice_number,
        seeded.open_invoice.due_date
    );

    if skip_documents {
        return Ok(());
    }

    match brokerage.invoice_document(seeded.open_invoice.id) {
        Ok(document) => {
            println!("\n{} ({})", document.file_name, document.content_type);
            println!("{}", String::from_utf8_lossy(&document.body));
        }
        Err(err) => println!("  Invoice rendering failed: {err}"),
    }

    Ok(())
}

fn dollars(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    date.and_hms_opt(hour, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_else(Utc::now)
}

/// Populates a small brokerage around `today`: one lead with a quote, a
/// customer with a delivered and an in-flight load, and open follow-ups.
pub(crate) fn seed(
    brokerage: &Brokerage,
    today: NaiveDate,
) -> Result<SeededBrokerage, BrokerageError> {
    let lead = brokerage.create::<Lead>(NewLead {
        company_name: "Bluestem Mills".to_string(),
        contact_person: "Dana Ortiz".to_string(),
        email: "dana@bluestem.example".to_string(),
        phone: "555-0300".to_string(),
        origin_city: Some("Omaha".to_string()),
        origin_state: Some("NE".to_string()),
        destination_city: Some("Denver".to_string()),
        destination_state: Some("CO".to_string()),
        equipment_type: Some("reefer".to_string()),
        commodity: Some("Flour".to_string()),
        weight: Some(40_000),
        ..NewLead::default()
    })?;

    brokerage.create::<Quote>(NewQuote {
        quote_number: None,
        lead_id: Some(lead.id),
        customer_id: None,
        origin_city: "Omaha".to_string(),
        origin_state: "NE".to_string(),
        destination_city: "Denver".to_string(),
        destination_state: "CO".to_string(),
        pickup_date: Some(today + Duration::days(7)),
        equipment_type: "reefer".to_string(),
        weight: Some(40_000.0),
        commodity: Some("Flour".to_string()),
        quoted_rate: dollars(185_000),
        valid_until: today + Duration::days(14),
        status: None,
        notes: None,
    })?;

    let customer = brokerage.create::<Customer>(NewCustomer {
        company_name: "Acme Anvil Co".to_string(),
        contact_person: "Wile Coyote".to_string(),
        email: "shipping@acme.example".to_string(),
        phone: "555-0100".to_string(),
        billing_address: Some("1 Mesa Way".to_string()),
        billing_city: Some("Phoenix".to_string()),
        billing_state: Some("AZ".to_string()),
        billing_zip_code: Some("85001".to_string()),
        credit_limit: Some(dollars(5_000_000)),
        ..NewCustomer::default()
    })?;

    let carrier = brokerage.create::<Carrier>(NewCarrier {
        company_name: "Roadrunner Freight".to_string(),
        contact_person: "Pat Driver".to_string(),
        email: "dispatch@roadrunner.example".to_string(),
        phone: "555-0142".to_string(),
        mc_number: Some("MC-123456".to_string()),
        w9_on_file: Some(true),
        ..NewCarrier::default()
    })?;

    let lane = |pickup: NaiveDate, status: &str| NewOrder {
        order_number: None,
        customer_id: Some(customer.id),
        customer_name: Some(customer.company_name.clone()),
        lead_id: None,
        origin_company: Some("Acme Plant 2".to_string()),
        origin_address: "100 Dock St".to_string(),
        origin_city: "Chicago".to_string(),
        origin_state: "IL".to_string(),
        origin_zip_code: "60601".to_string(),
        destination_company: None,
        destination_address: "200 Yard Rd".to_string(),
        destination_city: "Dallas".to_string(),
        destination_state: "TX".to_string(),
        destination_zip_code: "75201".to_string(),
        pickup_date: pickup,
        delivery_date: Some(pickup + Duration::days(2)),
        equipment_type: "dry_van".to_string(),
        weight: Some(42_000.0),
        commodity: Some("Anvils".to_string()),
        customer_rate: dollars(120_000),
        status: Some(status.to_string()),
        special_instructions: None,
    };

    let delivered_pickup = today - Duration::days(10);
    let delivered = brokerage.create::<Order>(lane(delivered_pickup, "delivered"))?;
    brokerage.create::<Dispatch>(NewDispatch {
        order_id: delivered.id,
        carrier_id: carrier.id,
        carrier_rate: dollars(95_000),
        status: Some("delivered".to_string()),
        actual_pickup_time: Some(at(delivered_pickup, 8)),
        actual_delivery_time: Some(at(delivered_pickup + Duration::days(1), 20)),
        rate_confirmation_sent: Some(true),
        rate_confirmation_signed: Some(true),
        ..NewDispatch::default()
    })?;

    let rolling = brokerage.create::<Order>(lane(today - Duration::days(1), "in_transit"))?;
    brokerage.create::<Dispatch>(NewDispatch {
        order_id: rolling.id,
        carrier_id: carrier.id,
        carrier_rate: dollars(95_000),
        status: Some("en_route".to_string()),
        actual_pickup_time: Some(at(today - Duration::days(1), 9)),
        driver_name: Some("Pat Driver".to_string()),
        truck_number: Some("T-42".to_string()),
        ..NewDispatch::default()
    })?;

    let paid_invoice = brokerage.create::<Invoice>(NewInvoice {
        invoice_number: None,
        invoice_type: "customer".to_string(),
        customer_id: Some(customer.id),
        carrier_id: None,
        order_id: Some(delivered.id),
        dispatch_id: None,
        amount: dollars(120_000),
        status: Some("paid".to_string()),
        due_date: delivered_pickup + Duration::days(30),
        paid_date: Some(today - Duration::days(2)),
        notes: None,
    })?;
    let open_invoice = brokerage.create::<Invoice>(NewInvoice {
        invoice_number: None,
        invoice_type: "customer".to_string(),
        customer_id: None,
        carrier_id: None,
        order_id: Some(rolling.id),
        dispatch_id: None,
        amount: dollars(120_000),
        status: Some("sent".to_string()),
        due_date: today + Duration::days(30),
        paid_date: None,
        notes: Some("Fuel surcharge included".to_string()),
    })?;

    let task = |title: &str, priority: &str, due: DateTime<Utc>| NewFollowUp {
        title: title.to_string(),
        description: None,
        follow_up_type: "call".to_string(),
        lead_id: None,
        customer_id: None,
        carrier_id: None,
        order_id: None,
        due_date: due,
        completed: None,
        priority: Some(priority.to_string()),
        assigned_to: Some("dispatcher".to_string()),
        notes: None,
    };
    brokerage.create::<FollowUp>(NewFollowUp {
        lead_id: Some(lead.id),
        ..task("Follow up on Omaha quote", "high", at(today, 10))
    })?;
    brokerage.create::<FollowUp>(NewFollowUp {
        order_id: Some(rolling.id),
        ..task("Check call with driver", "high", at(today, 15))
    })?;
    brokerage.create::<FollowUp>(NewFollowUp {
        customer_id: Some(customer.id),
        ..task("Quarterly business review", "low", at(today + Duration::days(20), 9))
    })?;

    Ok(SeededBrokerage {
        order: rolling,
        paid_invoice,
        open_invoice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid date")
    }

    #[test]
    fn seeded_brokerage_drives_the_dashboard() {
        let services = Services::over(Arc::new(InMemoryStore::default()));
        seed(&services.brokerage, reference_day()).expect("seed succeeds");

        let stats = services.brokerage.dashboard().expect("stats");
        assert_eq!(stats.active_orders, 1);
        assert_eq!(stats.in_transit, 1);
        assert_eq!(stats.pending_quotes, 1);
        assert_eq!(stats.total_revenue, dollars(120_000));
        assert_eq!(stats.pending_invoices, 1);
        assert_eq!(stats.urgent_follow_ups, 2);
        let days = stats.avg_delivery_time.expect("one delivered load");
        assert!((days - 1.5).abs() < 1e-9, "average was {days}");
    }

    #[test]
    fn open_invoice_renders_through_its_order() {
        let services = Services::over(Arc::new(InMemoryStore::default()));
        let seeded = seed(&services.brokerage, reference_day()).expect("seed succeeds");

        let document = services
            .brokerage
            .invoice_document(seeded.open_invoice.id)
            .expect("invoice renders");
        let text = String::from_utf8(document.body).expect("utf-8");
        assert!(text.contains("Acme Anvil Co"));
        assert!(text.contains("Chicago, IL -> Dallas, TX"));
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert_eq!(parse_date("2024-05-20"), Ok(reference_day()));
        assert!(parse_date("05/20/2024").is_err());
    }
}
