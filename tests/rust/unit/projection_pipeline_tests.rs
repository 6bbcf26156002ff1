//! End-to-end tests: projection text and an entity catalog in, regrouped
//! results out.

use regroup::{
    config::RewriterConfig,
    entity_catalog::EntityCatalog,
    query_planner::{
        logical_expr::{ast_conversion::SourceScope, Expr, ValueType},
        plan_projection_text,
        select_rewriter::{materializer::CollectionPolicy, RewrittenProjection},
        QueryPlannerError,
    },
    result_transformer::{rows_from_json, value::Value},
};
use serde_json::json;

const SHOP: &str = r#"
entities:
  - name: Customer
    properties:
      Name: text
      Age: int
      Vip: bool
      OrderSet: set<Order>
      OrderList: list<Order>
  - name: Supplier
    properties:
      Name: text
      OrderSet: set<Order>
  - name: Order
    properties:
      Id: int
"#;

struct Fixture {
    catalog: EntityCatalog,
    scope: SourceScope,
}

impl Fixture {
    fn new(sources: &[&str]) -> Self {
        let catalog = EntityCatalog::from_yaml_str(SHOP).unwrap();
        let mut scope = SourceScope::new();
        for source in sources {
            scope.declare(&source.parse().unwrap(), &catalog).unwrap();
        }
        Self { catalog, scope }
    }

    fn plan(&self, text: &str) -> Result<RewrittenProjection, QueryPlannerError> {
        self.plan_with(text, &RewriterConfig::default())
    }

    fn plan_with(
        &self,
        text: &str,
        config: &RewriterConfig,
    ) -> Result<RewrittenProjection, QueryPlannerError> {
        plan_projection_text(text, &self.catalog, &self.scope, config)
    }
}

fn order(id: i64) -> serde_json::Value {
    json!({ "Id": id })
}

fn customer(name: &str) -> serde_json::Value {
    json!({ "Name": name })
}

#[test]
fn test_rewrite_bare_collection_plan() {
    let fixture = Fixture::new(&["customer:Customer"]);
    let planned = fixture.plan("customer.OrderSet").unwrap();

    assert_eq!(
        planned.expression.to_string(),
        "new Tuple<Customer, Order>(customer, Convert(input[1], Order))"
    );
    let transform = planned.transform.as_ref().unwrap();
    assert_eq!(
        transform.output_element_type(),
        ValueType::set_of(ValueType::entity("Order"))
    );
}

#[test]
fn test_apply_anonymous_projection_end_to_end() {
    let fixture = Fixture::new(&["customer:Customer"]);
    let planned = fixture
        .plan("new { customer.Name, orders = customer.OrderSet }")
        .unwrap();

    let rows = rows_from_json(json!([
        [customer("ann"), "ann", order(1)],
        [customer("bob"), "bob", order(2)],
        [customer("ann"), "ann", order(3)],
        [customer("ann"), "ann", order(1)],
        [customer("cy"), "cy", null],
    ]))
    .unwrap();

    let results: Vec<serde_json::Value> = planned
        .apply(rows)
        .unwrap()
        .iter()
        .map(Value::to_json)
        .collect();

    assert_eq!(
        results,
        vec![
            json!({ "Name": "ann", "orders": [order(1), order(3)] }),
            json!({ "Name": "bob", "orders": [order(2)] }),
            json!({ "Name": "cy", "orders": [] }),
        ]
    );
}

#[test]
fn test_same_name_under_different_owners_stays_apart() {
    let fixture = Fixture::new(&["customer:Customer"]);
    let planned = fixture.plan("new { customer.Name, customer.OrderList }").unwrap();

    // Two distinct customers share a name; the injected owner keeps them apart.
    let rows = rows_from_json(json!([
        [{ "Id": 1 }, "ann", order(1)],
        [{ "Id": 2 }, "ann", order(2)],
        [{ "Id": 1 }, "ann", order(1)],
    ]))
    .unwrap();

    let results = planned.apply(rows).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].field("OrderList"),
        Some(&Value::List(vec![
            Value::from(order(1)),
            Value::from(order(1))
        ]))
    );
}

#[test]
fn test_member_init_keeps_projected_owner() {
    let fixture = Fixture::new(&["customer:Customer"]);
    let planned = fixture
        .plan("new Wrapper(customer) { B = customer.OrderSet }")
        .unwrap();

    let Expr::Tuple(tuple) = &planned.expression else {
        panic!("expected a tuple, got {}", planned.expression);
    };
    assert_eq!(tuple.ty.arity(), 2);

    let rows = rows_from_json(json!([
        [customer("ann"), order(1)],
        [customer("ann"), order(2)],
    ]))
    .unwrap();
    let results = planned.apply(rows).unwrap();
    assert_eq!(
        results,
        vec![Value::Record {
            type_name: Some("Wrapper".to_string()),
            fields: vec![
                ("customer".to_string(), Value::from(customer("ann"))),
                (
                    "B".to_string(),
                    Value::Set(vec![Value::from(order(1)), Value::from(order(2))])
                ),
            ],
        }]
    );
}

#[test]
fn test_list_policy_overrides_declared_set() {
    let fixture = Fixture::new(&["customer:Customer"]);
    let config = RewriterConfig {
        collection_policy: CollectionPolicy::List,
        ..Default::default()
    };
    let planned = fixture.plan_with("customer.OrderSet", &config).unwrap();

    let rows = rows_from_json(json!([
        [customer("ann"), order(1)],
        [customer("ann"), order(1)],
    ]))
    .unwrap();
    assert_eq!(
        planned.apply(rows).unwrap(),
        vec![Value::List(vec![Value::from(order(1)), Value::from(order(1))])]
    );
}

#[test]
fn test_two_owners_fall_back_to_unrewritten_projection() {
    let fixture = Fixture::new(&["customer:Customer", "supplier:Supplier"]);
    let err = fixture
        .plan("new { customer.OrderSet, supplier.OrderSet }")
        .unwrap_err();
    // Both fields default to the member name `OrderSet`.
    assert!(matches!(err, QueryPlannerError::Conversion(_)));

    let planned = fixture
        .plan("new { mine = customer.OrderSet, theirs = supplier.OrderSet }")
        .unwrap();
    assert!(planned.transform.is_none());
    assert!(matches!(planned.expression, Expr::New(_)));

    let strict = RewriterConfig {
        fallback_on_unsupported: false,
        ..Default::default()
    };
    assert!(matches!(
        fixture.plan_with("new { mine = customer.OrderSet, theirs = supplier.OrderSet }", &strict),
        Err(QueryPlannerError::Rewrite(_))
    ));
}

#[test]
fn test_projection_without_collections_is_not_rewritten() {
    let fixture = Fixture::new(&["customer:Customer"]);
    let planned = fixture.plan("new { customer.Name, customer.Age }").unwrap();
    assert!(planned.transform.is_none());

    let rows = vec![Value::text("passthrough")];
    assert_eq!(planned.apply(rows.clone()).unwrap(), rows);
}

#[test]
fn test_plan_serialises_to_json() {
    let fixture = Fixture::new(&["customer:Customer"]);
    let planned = fixture.plan("customer.OrderSet").unwrap();
    let encoded = serde_json::to_value(&planned).unwrap();
    assert!(encoded.get("expression").is_some());
    assert!(encoded.get("transform").is_some());

    let decoded: RewrittenProjection = serde_json::from_value(encoded).unwrap();
    assert_eq!(decoded.transform, planned.transform);
}
