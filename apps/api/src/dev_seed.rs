use quire_application::{RecordQuery, RecordStore, RecordWriteStore};
use quire_core::AppResult;
use serde_json::json;
use tracing::info;

use crate::resource_catalog::{CUSTOMER_RESOURCE_TYPE, ORDER_RESOURCE_TYPE, OWNER_FIELD};

struct SeedCustomer {
    name: &'static str,
    email: &'static str,
    country: &'static str,
    owner: &'static str,
    orders: &'static [SeedOrder],
}

struct SeedOrder {
    reference: &'static str,
    status: &'static str,
    quantity: i64,
    placed_on: &'static str,
}

const DEV_SEED_CUSTOMERS: &[SeedCustomer] = &[
    SeedCustomer {
        name: "Northwind Traders",
        email: "orders@northwind.example",
        country: "DE",
        owner: "alice",
        orders: &[
            SeedOrder {
                reference: "SO-1001",
                status: "open",
                quantity: 12,
                placed_on: "2024-03-02",
            },
            SeedOrder {
                reference: "SO-1004",
                status: "shipped",
                quantity: 3,
                placed_on: "2024-03-09",
            },
        ],
    },
    SeedCustomer {
        name: "Contoso Pharmaceuticals",
        email: "procurement@contoso.example",
        country: "US",
        owner: "bob",
        orders: &[SeedOrder {
            reference: "SO-1002",
            status: "open",
            quantity: 40,
            placed_on: "2024-03-05",
        }],
    },
    SeedCustomer {
        name: "Fabrikam Logistics",
        email: "hello@fabrikam.example",
        country: "NL",
        owner: "alice",
        orders: &[SeedOrder {
            reference: "SO-1003",
            status: "cancelled",
            quantity: 1,
            placed_on: "2024-03-07",
        }],
    },
];

/// Writes demo customers and orders unless customers already exist.
pub async fn run(records: &dyn RecordStore, writer: &dyn RecordWriteStore) -> AppResult<()> {
    let existing = records
        .count_records(&RecordQuery::for_resource(CUSTOMER_RESOURCE_TYPE))
        .await?;
    if existing > 0 {
        info!(existing, "dev seed skipped, customers already present");
        return Ok(());
    }

    let mut order_count = 0_usize;
    for customer in DEV_SEED_CUSTOMERS {
        let created = writer
            .create_record(
                CUSTOMER_RESOURCE_TYPE,
                json!({
                    "name": customer.name,
                    "email": customer.email,
                    "country": customer.country,
                    "active": true,
                    OWNER_FIELD: customer.owner,
                }),
            )
            .await?;

        for order in customer.orders {
            writer
                .create_record(
                    ORDER_RESOURCE_TYPE,
                    json!({
                        "reference": order.reference,
                        "status": order.status,
                        "quantity": order.quantity,
                        "placed_on": order.placed_on,
                        "customer_id": created.record_id().as_str(),
                        OWNER_FIELD: customer.owner,
                    }),
                )
                .await?;
            order_count += 1;
        }
    }

    info!(
        customers = DEV_SEED_CUSTOMERS.len(),
        orders = order_count,
        "dev seed applied"
    );
    Ok(())
}
