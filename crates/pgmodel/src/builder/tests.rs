use super::*;
use crate::value::Value;
use serde_json::json;

fn users() -> TableSchema {
    TableSchema::new("users").with_fields(&["id", "name", "email"])
}

#[test]
fn select_fragments_and_values() {
    let stmt = QueryBuilder::new(users())
        .select(&["*"])
        .from("users")
        .and_where(Filter::new().op("id", crate::Op::eq(1)))
        .build_query()
        .unwrap();
    assert_eq!(stmt.fragments(), &["SELECT * FROM users", "WHERE", "id = $1"]);
    assert_eq!(stmt.values(), &[Value::Int(1)]);
}

#[test]
fn select_with_limit() {
    let stmt = QueryBuilder::new(users())
        .select(&["*"])
        .and_where(Filter::new().eq("id", 1))
        .limit(1)
        .build_query()
        .unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM users WHERE id = $1 LIMIT 1");
}

#[test]
fn default_projection_is_star() {
    let stmt = QueryBuilder::new(users()).build_query().unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM users");
    let stmt = QueryBuilder::new(users()).select(&[]).build_query().unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM users");
}

#[test]
fn projection_drops_unknown_fields() {
    let stmt = QueryBuilder::new(users())
        .select(&["name", "password", "users.email"])
        .build_query()
        .unwrap();
    assert_eq!(stmt.sql(), "SELECT name, users.email FROM users");
}

#[test]
fn projection_with_nothing_left_is_an_error() {
    let err = QueryBuilder::new(users())
        .select(&["password"])
        .build_query()
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn unchecked_projection_with_joins() {
    let stmt = QueryBuilder::new(users())
        .select_unchecked(&["users.name", "o.total"])
        .join(JoinKind::Left, "orders o", "o.user_id = users.id")
        .join(JoinKind::Inner, "plans p", "p.id = users.plan_id")
        .and_where(Filter::new().gt("o.total", 100))
        .build_query()
        .unwrap();
    assert_eq!(
        stmt.fragments(),
        &[
            "SELECT users.name, o.total FROM users",
            "LEFT JOIN orders o",
            "ON o.user_id = users.id",
            "INNER JOIN plans p",
            "ON p.id = users.plan_id",
            "WHERE",
            "o.total > $1",
        ]
    );
}

#[test]
fn full_select_clause_order() {
    let stmt = QueryBuilder::new(users())
        .select(&["id", "name"])
        .or_where(Filter::new().like("name", "%ann%"))
        .and_where(Filter::new().in_list("id", [1, 2]))
        .sort("id")
        .sort_by("name", SortDirection::Asc)
        .limit(10)
        .offset(20)
        .build_query()
        .unwrap();
    assert_eq!(
        stmt.sql(),
        "SELECT id, name FROM users WHERE id IN ($1,$2) OR LOWER(name) LIKE LOWER($3) \
         ORDER BY id DESC, name ASC LIMIT 10 OFFSET 20"
    );
    assert_eq!(
        stmt.values(),
        &[Value::Int(1), Value::Int(2), Value::from("%ann%")]
    );
}

#[test]
fn missing_join_or_sort_arguments_fail_the_build() {
    let err = QueryBuilder::new(users())
        .join(JoinKind::Left, "orders", "")
        .build_query()
        .unwrap_err();
    assert!(err.is_validation());

    let err = QueryBuilder::new(users()).sort("").build_query().unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn update_numbers_set_before_where() {
    let stmt = QueryBuilder::new(users())
        .prepare(StatementKind::Update)
        .set_fields(&Record::new().with("email", "a@b.c").with("name", "a"))
        .and_where(Filter::new().eq("id", 7))
        .build_query()
        .unwrap();
    // schema order, not argument order
    assert_eq!(
        stmt.fragments(),
        &["UPDATE users SET", "name = $1, email = $2", "WHERE", "id = $3"]
    );
    assert_eq!(
        stmt.values(),
        &[Value::from("a"), Value::from("a@b.c"), Value::Int(7)]
    );
}

#[test]
fn update_ignores_pagination_and_unknown_fields() {
    let stmt = QueryBuilder::new(users())
        .prepare(StatementKind::Update)
        .set_fields(&Record::new().with("name", "a").with("role", "admin"))
        .limit(1)
        .build_query()
        .unwrap();
    assert_eq!(stmt.sql(), "UPDATE users SET name = $1");
}

#[test]
fn update_without_known_fields_is_an_error() {
    let err = QueryBuilder::new(users())
        .prepare(StatementKind::Update)
        .set_fields(&Record::new().with("role", "admin"))
        .build_query()
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn update_offset_continues_numbering() {
    let stmt = QueryBuilder::new(users())
        .prepare(StatementKind::Update)
        .set_fields(&Record::new().with("name", "y"))
        .and_where(Filter::new().eq("email", "e"))
        .build_query_from(2)
        .unwrap();
    assert_eq!(stmt.sql(), "UPDATE users SET name = $3 WHERE email = $4");
}

#[test]
fn delete_requires_criteria() {
    let err = QueryBuilder::new(users())
        .prepare(StatementKind::Delete)
        .build_query()
        .unwrap_err();
    assert!(err.is_validation());

    let stmt = QueryBuilder::new(users())
        .prepare(StatementKind::Delete)
        .and_where(Filter::new().eq("id", 3))
        .sort("id")
        .build_query()
        .unwrap();
    assert_eq!(stmt.sql(), "DELETE FROM users WHERE id = $1");
}

#[test]
fn prepare_clears_previous_operation() {
    let used = QueryBuilder::new(users())
        .select(&["name"])
        .from("people")
        .and_where(Filter::new().eq("id", 1))
        .or_where(Filter::new().eq("name", "x"))
        .join(JoinKind::Left, "orders o", "o.user_id = users.id")
        .sort("id")
        .limit(5)
        .offset(5);

    let stmt = used.prepare(StatementKind::Select).build_query().unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM users");
    assert!(stmt.values().is_empty());
}

#[test]
fn reset_clears_build_errors() {
    let mut qb = QueryBuilder::new(users()).sort("");
    assert!(qb.build_query().is_err());
    qb.reset();
    assert!(qb.build_query().is_ok());
}

#[test]
fn reusing_without_reset_leaks_predicates() {
    let qb = QueryBuilder::new(users()).and_where(Filter::new().eq("id", 1));
    let first = qb.build_query().unwrap();
    let second = qb.and_where(Filter::new().eq("name", "b")).build_query().unwrap();
    assert_eq!(first.sql(), "SELECT * FROM users WHERE id = $1");
    assert_eq!(
        second.sql(),
        "SELECT * FROM users WHERE id = $1 AND name = $2"
    );
}

#[test]
fn json_where_uses_policy() {
    let stmt = QueryBuilder::new(users())
        .where_json(&json!({"name": "a", "age": {"$gt": 5}}))
        .build_query()
        .unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM users WHERE name = $1 AND age > $2");
    assert_eq!(stmt.values(), &[Value::from("a"), Value::Int(5)]);

    let err = QueryBuilder::new(users())
        .unknown_operators(UnknownOperatorPolicy::Reject)
        .where_json(&json!({"name": {"$regex": "a"}}))
        .build_query()
        .unwrap_err();
    assert!(err.is_validation());

    let err = QueryBuilder::new(users())
        .or_where_json(&json!("id = 1"))
        .build_query()
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn placeholders_stay_contiguous() {
    let stmt = QueryBuilder::new(users())
        .and_where(Filter::new().in_list("id", [1, 2, 3]).eq("name", "n"))
        .or_where(Filter::new().like("email", "%x%").lte("id", 0))
        .build_query()
        .unwrap();
    assert_eq!(stmt.placeholders(), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(stmt.values().len(), 6);
}

#[test]
fn dollar_literals_in_trusted_text_are_not_placeholders() {
    let stmt = QueryBuilder::new(users())
        .select_unchecked(&["users.name", "'$9' AS tag"])
        .join(JoinKind::Left, "prices p", "p.code = 'USD$1'")
        .predicate(Predicate::raw("p.note <> '$2'", Connective::And))
        .and_where(Filter::new().eq("id", 1))
        .build_query()
        .unwrap();
    assert_eq!(
        stmt.sql(),
        "SELECT users.name, '$9' AS tag FROM users LEFT JOIN prices p ON p.code = 'USD$1' \
         WHERE p.note <> '$2' AND id = $1"
    );
    assert_eq!(stmt.placeholders(), vec![1]);
    assert_eq!(stmt.values(), &[Value::Int(1)]);
}
