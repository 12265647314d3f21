use super::*;
use serde_json::json;

fn compile(filter: Filter) -> CompiledCriteria {
    let mut set = PredicateSet::new();
    set.add_filter(filter, Connective::And).unwrap();
    set.compile(0)
}

#[test]
fn literal_and_operator_predicates() {
    let out = compile(Filter::new().eq("name", "a").gt("age", 5));
    assert_eq!(out.fragments, vec!["WHERE", "name = $1", "AND", "age > $2"]);
    assert_eq!(out.values, vec![Value::from("a"), Value::Int(5)]);
}

#[test]
fn in_list_expands_per_element() {
    let out = compile(Filter::new().in_list("tag", [1, 2, 3]));
    assert_eq!(out.fragments, vec!["WHERE", "tag IN ($1,$2,$3)"]);
    assert_eq!(out.values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn like_is_wrapped_in_lower() {
    let out = compile(Filter::new().like("email", "%@Example.com"));
    assert_eq!(
        out.fragments,
        vec!["WHERE", "LOWER(email) LIKE LOWER($1)"]
    );
    assert_eq!(out.values, vec![Value::from("%@Example.com")]);
}

#[test]
fn comparison_operators() {
    let out = compile(
        Filter::new()
            .ne("a", 1)
            .lt("b", 2)
            .lte("c", 3)
            .gte("d", 4)
            .op("e", Op::eq(5)),
    );
    assert_eq!(
        out.fragments[1..],
        [
            "a != $1", "AND", "b < $2", "AND", "c <= $3", "AND", "d >= $4", "AND", "e = $5"
        ]
    );
}

#[test]
fn zero_is_kept_and_falsy_literals_dropped() {
    let out = compile(
        Filter::new()
            .eq("count", 0)
            .eq("gone", Value::Null)
            .eq("blank", "")
            .eq("off", false)
            .eq("name", "x"),
    );
    assert_eq!(out.fragments, vec!["WHERE", "count = $1", "AND", "name = $2"]);
    assert_eq!(out.values, vec![Value::Int(0), Value::from("x")]);
}

#[test]
fn operator_objects_survive_falsy_operands() {
    let out = compile(Filter::new().op("flag", Op::eq(false)));
    assert_eq!(out.fragments, vec!["WHERE", "flag = $1"]);
}

#[test]
fn literal_only_filter_uses_one_placeholder_per_key() {
    let filter = Filter::new().eq("a", 1).eq("b", "two").eq("c", 3.5);
    let out = compile(filter);
    let placeholders = out.fragments.iter().filter(|f| f.contains('$')).count();
    assert_eq!(placeholders, 3);
    assert_eq!(
        out.values,
        vec![Value::Int(1), Value::from("two"), Value::Float(3.5)]
    );
}

#[test]
fn and_predicates_emit_before_or_predicates() {
    let mut set = PredicateSet::new();
    set.add_filter(Filter::new().eq("c", 3), Connective::Or)
        .unwrap();
    set.add_filter(Filter::new().eq("a", 1).eq("b", 2), Connective::And)
        .unwrap();
    set.add_filter(Filter::new().eq("d", 4), Connective::Or)
        .unwrap();

    let out = set.compile(0);
    assert_eq!(
        out.fragments,
        vec!["WHERE", "a = $1", "AND", "b = $2", "OR", "c = $3", "OR", "d = $4"]
    );
    assert_eq!(
        out.values,
        vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]
    );
}

#[test]
fn only_or_predicates_still_open_with_where() {
    let mut set = PredicateSet::new();
    set.add_filter(Filter::new().eq("a", 1).eq("b", 2), Connective::Or)
        .unwrap();
    assert_eq!(
        set.compile(0).fragments,
        vec!["WHERE", "a = $1", "OR", "b = $2"]
    );
}

#[test]
fn offset_continues_numbering() {
    let mut set = PredicateSet::new();
    set.add_filter(Filter::new().eq("id", 9).in_list("tag", ["x", "y"]), Connective::And)
        .unwrap();
    let out = set.compile(2);
    assert_eq!(out.fragments, vec!["WHERE", "id = $3", "AND", "tag IN ($4,$5)"]);
    assert_eq!(set.param_count(), 3);
}

#[test]
fn empty_set_compiles_to_nothing() {
    let out = PredicateSet::new().compile(4);
    assert!(out.fragments.is_empty());
    assert!(out.values.is_empty());
}

#[test]
fn empty_in_list_is_rejected() {
    let mut set = PredicateSet::new();
    let err = set
        .add_filter(Filter::new().in_list("tag", Vec::<i32>::new()), Connective::And)
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn raw_predicate_binds_nothing() {
    let mut set = PredicateSet::new();
    set.push(Predicate::raw("cte._id = users._id", Connective::And));
    let out = set.compile(2);
    assert_eq!(out.fragments, vec!["WHERE", "cte._id = users._id"]);
    assert!(out.values.is_empty());
}

// ==================== JSON filters ====================

#[test]
fn json_filter_matches_typed_filter() {
    let parsed = Filter::from_json(
        &json!({"name": "a", "age": {"$gt": 5}, "tag": {"$in": [1, 2, 3]}}),
        UnknownOperatorPolicy::Ignore,
    )
    .unwrap();
    let typed = Filter::new()
        .eq("name", "a")
        .gt("age", 5)
        .in_list("tag", [1, 2, 3]);
    assert_eq!(parsed, typed);
}

#[test]
fn json_filter_preserves_key_order() {
    let parsed = Filter::from_json(
        &json!({"zeta": 1, "alpha": 2}),
        UnknownOperatorPolicy::Ignore,
    )
    .unwrap();
    assert_eq!(
        compile(parsed).fragments,
        vec!["WHERE", "zeta = $1", "AND", "alpha = $2"]
    );
}

#[test]
fn unknown_operators_are_dropped_by_default() {
    let parsed = Filter::from_json(
        &json!({"name": {"$regex": "^a"}, "age": {"$or": [1]}, "id": 1}),
        UnknownOperatorPolicy::Ignore,
    )
    .unwrap();
    assert_eq!(compile(parsed).fragments, vec!["WHERE", "id = $1"]);
}

#[test]
fn unknown_operators_can_be_rejected() {
    let err = Filter::from_json(
        &json!({"name": {"$regex": "^a"}}),
        UnknownOperatorPolicy::Reject,
    )
    .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn non_object_where_argument_is_rejected() {
    let err = Filter::from_json(&json!([1, 2]), UnknownOperatorPolicy::Ignore).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("an array"));
}

#[test]
fn malformed_operands_are_rejected() {
    for bad in [
        json!({"tag": {"$in": 3}}),
        json!({"tag": {"$in": [[1]]}}),
        json!({"name": {"$like": 5}}),
        json!({"age": {"$gt": {"x": 1}}}),
    ] {
        let err = Filter::from_json(&bad, UnknownOperatorPolicy::Ignore).unwrap_err();
        assert!(err.is_validation(), "{bad}");
    }
}

#[test]
fn json_zero_and_null() {
    let parsed = Filter::from_json(
        &json!({"n": 0, "gone": null, "blank": ""}),
        UnknownOperatorPolicy::Ignore,
    )
    .unwrap();
    let out = compile(parsed);
    assert_eq!(out.fragments, vec!["WHERE", "n = $1"]);
    assert_eq!(out.values, vec![Value::Int(0)]);
}

#[test]
fn empty_field_names_are_dropped() {
    let typed = compile(Filter::new().eq("", 1).gt("", 2).eq("id", 3));
    assert_eq!(typed.fragments, vec!["WHERE", "id = $1"]);
    assert_eq!(typed.values, vec![Value::Int(3)]);

    let parsed = Filter::from_json(&json!({"": 1, "id": 3}), UnknownOperatorPolicy::Reject).unwrap();
    assert_eq!(compile(parsed), typed);
}
