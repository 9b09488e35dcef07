//! Query arguments as clients send them, deserialized with serde_json.

use serde_json::json;
use sifter::{
    apply_lazy, apply_to_slice, ArgumentOptions, ClauseNode, Comparison, Connector, Filter, Hooks,
    QueryArguments, QueryError, QueryStep, Queryable,
};

#[derive(Debug, Clone, Queryable)]
#[query(rename_all = "camelCase")]
struct Ticket {
    #[query(Scalar)]
    key: String,
    #[query(Scalar)]
    title: String,
    #[query(Scalar)]
    story_points: Option<u8>,
    #[query(Scalar)]
    open: bool,
}

fn tickets() -> Vec<Ticket> {
    [
        ("T-1", "Crash on login", Some(3), true),
        ("T-2", "Typo in footer", None, false),
        ("T-3", "Login is slow", Some(8), true),
        ("T-4", "50% off banner", Some(1), true),
    ]
    .into_iter()
    .map(|(key, title, story_points, open)| Ticket {
        key: key.into(),
        title: title.into(),
        story_points,
        open,
    })
    .collect()
}

fn run(args: serde_json::Value) -> Result<Vec<String>, QueryError> {
    let args: QueryArguments = serde_json::from_value(args).unwrap();
    let data = tickets();
    let options = ArgumentOptions::new().with_key("key");
    let found = apply_to_slice(&data, &args, Hooks::new(), &options)?;
    Ok(found.into_iter().map(|t| t.key.clone()).collect())
}

#[test]
fn clause_node_shape() {
    let node: ClauseNode = serde_json::from_value(json!({
        "groupedExpressions": [
            { "path": "title", "comparison": "contains", "value": ["Login"], "connector": "or" },
            { "path": "storyPoints", "comparison": "equal", "value": [null], "negate": true }
        ],
        "negate": true
    }))
    .unwrap();

    assert!(node.is_group());
    assert!(node.negate);
    let children = node.children.as_deref().unwrap();
    assert_eq!(children[0].connector, Connector::Or);
    assert_eq!(children[0].comparison, Comparison::Contains);
    assert_eq!(children[1].values, vec![None]);
    assert_eq!(children[1].connector, Connector::And);
}

#[test]
fn where_with_or_connector() {
    let keys = run(json!({
        "where": [
            { "path": "title", "comparison": "startsWith", "value": ["Crash"], "connector": "or" },
            { "path": "title", "comparison": "endsWith", "value": ["slow"] }
        ]
    }))
    .unwrap();
    assert_eq!(keys, ["T-1", "T-3"]);
}

#[test]
fn connector_of_previous_node_joins() {
    // (open or storyPoints = null) and title contains "Login"
    let keys = run(json!({
        "where": [
            { "path": "open", "comparison": "equal", "value": ["true"], "connector": "or" },
            { "path": "storyPoints", "comparison": "equal", "value": [null], "connector": "and" },
            { "path": "title", "comparison": "contains", "value": ["Login"] }
        ]
    }))
    .unwrap();
    assert_eq!(keys, ["T-3"]);
}

#[test]
fn like_escapes_percent() {
    let keys = run(json!({
        "where": [{ "path": "title", "comparison": "like", "value": ["50\\% %"] }]
    }))
    .unwrap();
    assert_eq!(keys, ["T-4"]);

    let keys = run(json!({
        "where": [{ "path": "title", "comparison": "like", "value": ["%LOGIN%"] }]
    }))
    .unwrap();
    assert!(keys.is_empty(), "like is case-sensitive");
}

#[test]
fn nulls_sort_first_and_ids_filter() {
    let keys = run(json!({
        "ids": ["T-2", "T-3", "T-4"],
        "orderBy": [{ "path": "storyPoints" }],
        "skip": 1
    }))
    .unwrap();
    assert_eq!(keys, ["T-4", "T-3"]);
}

#[test]
fn empty_where_matches_nothing() {
    let keys = run(json!({ "where": [] })).unwrap();
    assert!(keys.is_empty());

    let keys = run(json!({ "where": [{ "groupedExpressions": [] , "negate": true }] })).unwrap();
    assert_eq!(keys.len(), 4);
}

#[test]
fn in_and_not_in_with_empty_lists() {
    let keys = run(json!({ "where": [{ "path": "key", "comparison": "in", "value": [] }] })).unwrap();
    assert!(keys.is_empty());

    let keys = run(json!({ "where": [{ "path": "key", "comparison": "notIn", "value": [] }] })).unwrap();
    assert_eq!(keys.len(), 4);
}

#[test]
fn invalid_arguments_report_errors() {
    let err = run(json!({
        "where": [{ "path": "title", "comparison": "greaterThan", "value": ["a"] }]
    }))
    .unwrap_err();
    assert!(matches!(err, QueryError::Validation { .. }));

    let err = run(json!({
        "where": [{ "path": "storyPoints", "comparison": "between", "value": ["1"] }]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("between requires exactly 2 values"));

    let err = run(json!({
        "where": [{ "path": "open", "comparison": "equal", "value": [null] }]
    }))
    .unwrap_err();
    assert!(matches!(err, QueryError::Conversion { token: None, .. }));

    let err = run(json!({
        "where": [{ "path": "assignee.name", "comparison": "equal", "value": ["x"] }]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("no property named 'assignee'"));
}

#[test]
fn lazy_steps_describe_the_query() {
    let args: QueryArguments = serde_json::from_value(json!({
        "where": [{ "path": "storyPoints", "comparison": "between", "value": ["2", "8"] }],
        "orderBy": [{ "path": "title", "descending": true }],
        "take": 5
    }))
    .unwrap();
    let query = apply_lazy::<Ticket>(&args, Hooks::new(), &ArgumentOptions::new()).unwrap();

    let steps = query.steps();
    assert_eq!(steps.len(), 3);
    match &steps[0] {
        QueryStep::Filter(p) => assert!(matches!(p.filter(), Filter::And { .. })),
        other => panic!("expected a filter step, got {other:?}"),
    }
    match &steps[1] {
        QueryStep::Order(chain) => {
            let keys = chain.description();
            assert_eq!(keys.len(), 1);
            assert_eq!(keys[0].path, "title");
            assert!(keys[0].descending);
        }
        other => panic!("expected an order step, got {other:?}"),
    }
    assert!(matches!(steps[2], QueryStep::Take(5)));

    let filter = serde_json::to_value(match &steps[0] {
        QueryStep::Filter(p) => p.filter().clone(),
        _ => unreachable!(),
    })
    .unwrap();
    assert_eq!(filter["kind"], "and");
    assert_eq!(filter["left"]["op"], "gte");
}

#[test]
fn options_deserialize_with_defaults() {
    let options: ArgumentOptions = serde_json::from_value(json!({ "applyOrder": false })).unwrap();
    assert!(!options.apply_order);
    assert!(!options.omit);
    assert!(options.key_names.is_empty());
}
