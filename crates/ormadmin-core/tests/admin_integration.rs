//! Integration tests for the admin engine.

use std::fs;
use std::sync::Arc;

use ormadmin_core::admin::{AdminOptions, AdminRegistry, ExportRequest, ListRequest};
use ormadmin_core::catalog::{FieldDef, ModelDef, ScalarType, Schema};
use ormadmin_core::error::{Error, UnresolvedReason};
use ormadmin_core::query::{apply_filters, paginate, plan_joins, Query};
use ormadmin_core::{collect_dependents, resolve_path, write_json, MemoryStore, Row, Value};

struct TestContext {
    schema: Arc<Schema>,
    store: MemoryStore,
}

impl TestContext {
    fn new() -> Self {
        let schema = Arc::new(setup_shop_schema());
        let store = MemoryStore::new();
        seed_shop(&store);
        Self { schema, store }
    }

    fn registry(&self) -> AdminRegistry {
        let mut registry = AdminRegistry::new(Arc::clone(&self.schema));
        registry
            .register(
                "Customer",
                AdminOptions::new().filter_exclude(["email"]).group("sales"),
            )
            .unwrap();
        registry
            .register(
                "Order",
                AdminOptions::new()
                    .filter_paginate_by(2)
                    .foreign_key_lookup("customer", "name")
                    .group("sales"),
            )
            .unwrap();
        registry
            .register("Shipment", AdminOptions::default())
            .unwrap();
        registry
    }
}

fn setup_shop_schema() -> Schema {
    let customer = ModelDef::new("Customer", "id")
        .with_field(FieldDef::scalar("id", ScalarType::Int))
        .with_field(FieldDef::scalar("name", ScalarType::String))
        .with_field(FieldDef::scalar("email", ScalarType::String));

    let order = ModelDef::new("Order", "id")
        .with_field(FieldDef::scalar("id", ScalarType::Int))
        .with_field(FieldDef::scalar("total", ScalarType::Float))
        .with_field(FieldDef::foreign_key("customer", "Customer"))
        .with_field(FieldDef::nullable_foreign_key("gift_for", "Customer"));

    let shipment = ModelDef::new("Shipment", "id")
        .with_field(FieldDef::scalar("id", ScalarType::Int))
        .with_field(FieldDef::scalar("carrier", ScalarType::String))
        .with_field(FieldDef::foreign_key("order", "Order"));

    Schema::new(vec![customer, order, shipment]).unwrap()
}

fn seed_shop(store: &MemoryStore) {
    let names = ["ann", "bob", "cat", "dan", "eve"];
    store.insert_many(
        "Customer",
        names.iter().enumerate().map(|(i, name)| {
            Row::new()
                .with("id", i as i64 + 1)
                .with("name", *name)
                .with("email", format!("{name}@example.com"))
        }),
    );

    // 45 orders; customer 1 owns orders 1..=9
    store.insert_many(
        "Order",
        (1..=45i64).map(|i| {
            let gift_for = if i == 10 { Value::Int(1) } else { Value::Null };
            Row::new()
                .with("id", i)
                .with("total", i as f64 * 1.5)
                .with("customer", (i - 1) / 9 + 1)
                .with("gift_for", gift_for)
        }),
    );

    store.insert_many(
        "Shipment",
        vec![
            Row::new().with("id", 100).with("carrier", "ups").with("order", 1),
            Row::new().with("id", 101).with("carrier", "dhl").with("order", 2),
            Row::new().with("id", 102).with("carrier", "ups").with("order", 10),
        ],
    );
}

#[test]
fn test_resolve_and_reject_paths() {
    let ctx = TestContext::new();

    let path = resolve_path(&ctx.schema, "Shipment", "order__customer__name").unwrap();
    assert_eq!(path.hops().len(), 2);
    assert_eq!(path.terminal_model(), "Customer");

    match resolve_path(&ctx.schema, "Shipment", "order__zip").unwrap_err() {
        Error::UnresolvedPath {
            segment, reason, ..
        } => {
            assert_eq!(segment, "zip");
            assert_eq!(reason, UnresolvedReason::UnknownField);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_shared_prefix_plans_one_join() {
    let ctx = TestContext::new();
    let paths = [
        resolve_path(&ctx.schema, "Shipment", "order__customer__name").unwrap(),
        resolve_path(&ctx.schema, "Shipment", "order__customer__email").unwrap(),
        resolve_path(&ctx.schema, "Shipment", "order__total").unwrap(),
    ];
    let plan = plan_joins(&ctx.schema, "Shipment", &paths).unwrap();
    assert_eq!(plan.len(), 2);
}

#[test]
fn test_pagination_boundaries() {
    let ctx = TestContext::new();
    let pages = |page| paginate(Query::new("Order"), &ctx.store, 20).with_page(page);

    assert_eq!(pages(1).get_pages().unwrap(), 3);
    assert!(pages(4).get_list().unwrap().is_empty());
    assert_eq!(pages(0).get_list().unwrap(), pages(1).get_list().unwrap());
    assert_eq!(pages(3).get_list().unwrap().len(), 5);
}

#[test]
fn test_cascade_chain() {
    let ctx = TestContext::new();
    let groups = collect_dependents(&ctx.schema, &ctx.store, "Customer", &[Value::Int(1)]).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!((groups[0].model.as_str(), groups[0].depth), ("Order", 1));
    assert_eq!(groups[0].len(), 9);
    assert_eq!((groups[1].model.as_str(), groups[1].depth), ("Shipment", 2));
    assert_eq!(groups[1].len(), 2);
}

#[test]
fn test_nullable_reference_never_collected() {
    let ctx = TestContext::new();
    let groups = collect_dependents(&ctx.schema, &ctx.store, "Customer", &[Value::Int(1)]).unwrap();

    // order 10 names customer 1 only through the nullable gift_for field
    let collected_orders: Vec<&Value> = groups[0].rows.iter().filter_map(|r| r.get("id")).collect();
    assert!(!collected_orders.contains(&&Value::Int(10)));
    let shipments: Vec<&Value> = groups[1].rows.iter().filter_map(|r| r.get("id")).collect();
    assert!(!shipments.contains(&&Value::Int(102)));
}

#[test]
fn test_bad_filters_are_dropped() {
    let ctx = TestContext::new();
    let (query, active) = apply_filters(
        Query::new("Order"),
        &ctx.schema,
        "Order",
        [("nonexistent_field", "x"), ("customer__name", "bob")],
    )
    .unwrap();

    assert_eq!(active.len(), 1);
    assert!(active.contains_key("customer__name"));
    assert_eq!(paginate(query, &ctx.store, 100).count().unwrap(), 9);
}

#[test]
fn test_admin_list_with_ordering_and_exclusions() {
    let ctx = TestContext::new();
    let registry = ctx.registry();
    let customers = registry.admin("Customer").unwrap();

    let page = customers
        .list(
            &ctx.store,
            &ListRequest {
                page: 1,
                ordering: Some("-name".into()),
                filters: vec![
                    ("email".into(), "ann@example.com".into()),
                    ("name__in".into(), "ann,eve,bob".into()),
                ],
            },
        )
        .unwrap();

    let names: Vec<&Value> = page.rows.iter().filter_map(|r| r.get("name")).collect();
    assert_eq!(names, vec![&Value::from("eve"), &Value::from("bob"), &Value::from("ann")]);
    assert!(!page.active_filters.contains_key("email"));

    let unsorted = customers.apply_ordering(customers.base_query(), "-nickname");
    assert_eq!(unsorted, customers.base_query());
}

#[test]
fn test_export_to_file() {
    let ctx = TestContext::new();
    let registry = ctx.registry();
    let shipments = registry.admin("Shipment").unwrap();

    let export = shipments
        .export(
            &ctx.store,
            &ExportRequest {
                fields: vec!["carrier".into(), "order__customer__name".into()],
                ordering: Some("id".into()),
                filters: vec![("carrier".into(), "ups".into())],
                ..Default::default()
            },
        )
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export-shipment.json");
    let file = fs::File::create(&path).unwrap();
    assert_eq!(write_json(file, &export.projection, &export.rows).unwrap(), 2);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("[\n"));
    assert!(text.ends_with("\n]"));
    assert_eq!(text.matches(",\n").count(), 1);

    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed[0]["order__customer__name"], "ann");
    assert_eq!(parsed[1]["order__customer__name"], "bob");
}

#[test]
fn test_export_unresolvable_path_names_it() {
    let ctx = TestContext::new();
    let registry = ctx.registry();
    let err = registry
        .admin("Order")
        .unwrap()
        .export(
            &ctx.store,
            &ExportRequest {
                fields: vec!["total".into(), "customer__phone".into()],
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(err.is_unresolved_path());
    assert!(err.to_string().contains("customer__phone"));
}

#[test]
fn test_cycle_terminates() {
    let employee = ModelDef::new("Employee", "id")
        .with_field(FieldDef::scalar("id", ScalarType::Int))
        .with_field(FieldDef::foreign_key("mentor", "Employee"))
        .with_field(FieldDef::foreign_key("team", "Team"));
    let team = ModelDef::new("Team", "id")
        .with_field(FieldDef::scalar("id", ScalarType::Int))
        .with_field(FieldDef::foreign_key("lead", "Employee"));
    let schema = Schema::new(vec![employee, team]).unwrap();

    let store = MemoryStore::new();
    store.insert_many(
        "Employee",
        vec![
            Row::new().with("id", 1).with("mentor", 2).with("team", 1),
            Row::new().with("id", 2).with("mentor", 1).with("team", 1),
        ],
    );
    store.insert("Team", Row::new().with("id", 1).with("lead", 1));

    let groups = collect_dependents(&schema, &store, "Team", &[Value::Int(1)]).unwrap();
    let total: usize = groups.iter().map(|g| g.len()).sum();
    assert_eq!(total, 2);
    assert!(groups.iter().all(|g| g.model == "Employee"));
}

#[test]
fn test_lookup_navigation() {
    let ctx = TestContext::new();
    let registry = ctx.registry();
    let orders = registry.admin("Order").unwrap();

    let middle = orders.lookup(&ctx.store, "customer", None, 2).unwrap();
    assert_eq!(middle.prev_page, 1);
    assert_eq!(middle.next_page, 3);
    assert_eq!(middle.object_list[0].repr, "cat");

    let last = orders.lookup(&ctx.store, "customer", None, 3).unwrap();
    assert_eq!(last.next_page, 0);
    assert_eq!(last.object_list.len(), 1);
}

#[test]
fn test_registry_groups() {
    let ctx = TestContext::new();
    let registry = ctx.registry();

    let sales: Vec<String> = registry.group_admins("sales").iter().map(|a| a.admin_name()).collect();
    assert_eq!(sales, vec!["customer", "order"]);
    assert_eq!(registry.model_admins().len(), 3);
}
