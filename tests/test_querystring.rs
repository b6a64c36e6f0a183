use jsonapi_filter::filter::{FilterError, FilterNode, Operator, compile};
use jsonapi_filter::{QueryError, filters_from_query};
use serde_json::json;

#[test]
fn test_json_filter_and_simple_filters_are_combined() {
    let nodes = filters_from_query([
        ("filter[status]", "open"),
        ("filter", r#"[{"op": "ge", "name": "priority", "val": 2}]"#),
        ("page[number]", "1"),
    ])
    .expect("valid query");

    assert_eq!(
        nodes,
        vec![
            FilterNode::comparison(Operator::Ge, "priority", json!(2)),
            FilterNode::comparison(Operator::Eq, "status", json!("open")),
        ]
    );

    let predicate = compile(&nodes).unwrap();
    assert!(predicate.matches(&json!({"priority": 3, "status": "open"})).unwrap());
    assert!(!predicate.matches(&json!({"priority": 3, "status": "closed"})).unwrap());
}

#[test]
fn test_filter_must_be_json() {
    let err = filters_from_query([("filter", "[{op: eq}")]).unwrap_err();
    assert!(matches!(err, QueryError::Parse(_)));
}

#[test]
fn test_filter_must_be_a_list() {
    let err = filters_from_query([("filter", r#"{"op": "eq", "name": "a", "val": 1}"#)])
        .unwrap_err();
    assert_eq!(err, QueryError::NotAList("object"));
    assert_eq!(
        err.to_string(),
        "Incorrect filters format, expected list of conditions but got object"
    );
}

#[test]
fn test_malformed_conditions_are_reported() {
    let err = filters_from_query([("filter", r#"[{"op": "nope", "name": "a", "val": 1}]"#)])
        .unwrap_err();
    assert_eq!(
        err,
        QueryError::Filter(FilterError::UnknownOperator("nope".to_string()))
    );
}

#[test]
fn test_unterminated_simple_filter_key() {
    let err = filters_from_query([("filter[name", "x")]).unwrap_err();
    assert!(matches!(err, QueryError::Parse(_)));
}
