use super::*;
use crate::arg::ToArg;
use crate::decode::DecodeRaw;
use crate::error::XdbError;
use crate::mock::{Call, ScriptedCursor, ScriptedQuerier};
use crate::reflect::{FieldInfo, FromRow, RowSlot, ToArgs};
use crate::token::Placeholder;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Mutex;

// ===== Mapped types (what the derives generate) =====

#[derive(Debug, Default, PartialEq)]
struct Audit {
    created_by: String,
}

impl FromRow for Audit {
    const FIELDS: &'static [FieldInfo] = &[FieldInfo::field("created_by", None)];

    fn field_mut(&mut self, path: &[usize]) -> Option<&mut dyn DecodeRaw> {
        match path {
            [0] => Some(&mut self.created_by as &mut dyn DecodeRaw),
            _ => None,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct User {
    id: i64,
    name: String,
    score: f64,
    active: bool,
    audit: Audit,
}

impl FromRow for User {
    const FIELDS: &'static [FieldInfo] = &[
        FieldInfo::field("id", Some("user_id")),
        FieldInfo::field("name", None),
        FieldInfo::field("score", None),
        FieldInfo::field("active", None),
        FieldInfo::embed("audit", <Audit as FromRow>::FIELDS),
    ];

    fn field_mut(&mut self, path: &[usize]) -> Option<&mut dyn DecodeRaw> {
        match path {
            [0] => Some(&mut self.id as &mut dyn DecodeRaw),
            [1] => Some(&mut self.name as &mut dyn DecodeRaw),
            [2] => Some(&mut self.score as &mut dyn DecodeRaw),
            [3] => Some(&mut self.active as &mut dyn DecodeRaw),
            [4, rest @ ..] => self.audit.field_mut(rest),
            _ => None,
        }
    }
}

impl RowSlot for User {
    type Target = Self;

    fn new_slot() -> Self {
        Self::default()
    }

    fn target(&mut self) -> &mut Self {
        self
    }
}

struct Filter {
    id: i64,
    name: String,
}

impl ToArgs for Filter {
    const FIELDS: &'static [FieldInfo] = &[
        FieldInfo::field("ID", None),
        FieldInfo::field("Name", None),
    ];

    fn field_arg(&self, path: &[usize]) -> Option<Arg> {
        match path {
            [0] => Some(self.id.to_arg()),
            [1] => Some(self.name.to_arg()),
            _ => None,
        }
    }
}

impl ArgSource for Filter {
    fn lookup(&self, token: &str) -> Option<Arg> {
        crate::reflect::lookup_field(self, token)
    }
}

fn user_cursor(rows: &[&[Option<&str>]]) -> ScriptedCursor {
    ScriptedCursor::new(
        &["user_id", "name", "score", "active", "created_by", "extra"],
        rows,
    )
}

// ===== Rendering =====

#[test]
fn renders_full_select() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.select_distinct("u.id")
        .select("u.name")
        .from("users u")
        .inner_join("roles r ON r.id = u.role_id")
        .where_("u.age > ${age}")
        .where_("r.name = ${role}")
        .group_by("u.id")
        .group_by("u.name")
        .having("count(*) > 1")
        .order_by("u.id DESC")
        .limit("10");

    assert_eq!(
        q.to_sql(),
        "SELECT DISTINCT u.id, u.name\n\
         FROM users u\n\
         INNER JOIN roles r ON r.id = u.role_id\n\
         WHERE (u.age > ${age} and r.name = ${role})\n\
         GROUP BY u.id, u.name\n\
         HAVING (count(*) > 1)\n\
         ORDER BY u.id DESC\n\
         LIMIT 10"
    );
    assert_eq!(q.kind(), StatementKind::Select);
}

#[test]
fn or_breaks_the_where_group() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.select("*").from("t").where_("a").or().where_("b");
    assert_eq!(q.to_sql(), "SELECT *\nFROM t\nWHERE (a) \n or (b)");
}

#[test]
fn breaks_go_to_the_list_they_follow() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.select("k")
        .from("t")
        .where_("x")
        .where_("y")
        .having("c")
        .and()
        .having("d");
    q.where_("z");

    assert_eq!(
        q.to_sql(),
        "SELECT k\nFROM t\nWHERE (x and y and z)\nHAVING (c) \n and (d)"
    );
}

#[test]
fn conditions_deref_to_the_statement() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.delete_from("users").where_("id = ${id}").order_by("ignored");
    assert_eq!(q.to_sql(), "DELETE FROM users\nWHERE (id = ${id})");
}

#[test]
fn renders_update_and_insert() {
    let querier = ScriptedQuerier::default();

    let mut update = Statement::new(&querier);
    update
        .update("users")
        .set("name = ${name}")
        .set("age = ${age}")
        .where_("id = ${id}");
    assert_eq!(
        update.to_sql(),
        "UPDATE users\nSET name = ${name}, age = ${age}\nWHERE (id = ${id})"
    );

    let mut insert = Statement::new(&querier);
    insert
        .insert_into("users")
        .columns("name")
        .columns("age")
        .values("${name}")
        .values("${age}");
    assert_eq!(
        insert.to_sql(),
        "INSERT INTO users\n (name, age)\nVALUES (${name}, ${age})"
    );
    assert_eq!(insert.to_string(), insert.to_sql());
}

#[test]
fn raw_sql_overrides_clauses() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.select("a").from("t").sql("SELECT 1 WHERE x = ${x}");
    assert_eq!(q.to_sql(), "SELECT 1 WHERE x = ${x}");

    q.sql("");
    assert_eq!(q.to_sql(), "SELECT a\nFROM t");
}

#[test]
fn empty_statement_renders_nothing() {
    let querier = ScriptedQuerier::default();
    let q = Statement::new(&querier);
    assert_eq!(q.to_sql(), "");
}

#[test]
fn build_is_memoized() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.select("*").from("t").where_("id = ${id}");

    let parsed = q.build().clone();
    assert_eq!(parsed.sql, "SELECT *\nFROM t\nWHERE (id = ?)");
    assert_eq!(parsed.tokens, vec!["id"]);

    q.where_("name = ${name}");
    assert_eq!(q.build(), &parsed);
    assert!(q.to_sql().contains("name = ${name}"));
}

#[test]
fn build_uses_the_driver_placeholder() {
    let querier = ScriptedQuerier {
        placeholder: Placeholder::Dollar,
        ..Default::default()
    };
    let mut q = Statement::new(&querier);
    q.sql("a = ${a} and b = ${b}");
    assert_eq!(q.build().sql, "a = $1 and b = $2");

    let config = Arc::new(DbConfig::new().placeholder(Placeholder::Question));
    let mut q = Statement::with_config(&querier, config);
    q.sql("a = ${a}");
    assert_eq!(q.build().sql, "a = ?");
}

// ===== Arguments =====

#[test]
fn reflect_args_reads_struct_fields() {
    let querier = ScriptedQuerier::default();
    let filter = Filter {
        id: 7,
        name: "mingo".to_string(),
    };

    let mut q = Statement::new(&querier);
    q.sql("SELECT * FROM users WHERE id = ${ID}");
    q.reflect_args(&filter);
    assert_eq!(q.bound_args(), &[Arg::Int(7)]);

    let mut q = Statement::new(&querier);
    q.sql("SELECT * FROM users WHERE name = ${name} and x = ${missing}");
    q.reflect_args(&filter);
    assert_eq!(
        q.bound_args(),
        &[Arg::Text("mingo".to_string()), Arg::Null]
    );
}

#[test]
fn reflect_args_reads_maps_in_token_order() {
    let querier = ScriptedQuerier::default();
    let mut source = HashMap::new();
    source.insert("b", "two");
    source.insert("a", "one");

    let mut q = Statement::new(&querier);
    q.sql("${a} ${b} ${a} ${c}");
    q.reflect_args(&source);
    assert_eq!(
        q.bound_args(),
        &[
            Arg::Text("one".into()),
            Arg::Text("two".into()),
            Arg::Text("one".into()),
            Arg::Null,
        ]
    );
}

#[test]
fn sequences_and_explicit_args_are_verbatim() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.sql("${a} ${b}");

    q.reflect_args(&crate::args![1_i64]);
    assert_eq!(q.bound_args(), &[Arg::Int(1)]);

    q.args(["x", "y", "z"]);
    assert_eq!(q.bound_args().len(), 3);

    q.bind(None::<i64>);
    assert_eq!(q.bound_args()[3], Arg::Null);
}

// ===== Execution =====

#[tokio::test]
async fn exec_builds_and_logs() {
    let querier = ScriptedQuerier::default();
    let logged = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&logged);

    let mut q = Statement::new(&querier);
    q.logger(Arc::new(move |sql: &str, args: &[Arg]| {
        sink.lock().unwrap().push((sql.to_string(), args.to_vec()));
    }));
    q.delete_from("users").where_("id = ${id}");
    q.reflect_args(&HashMap::from([("id", 3_i64)]));

    let result = q.exec().await.unwrap();
    assert_eq!(result.rows_affected(), 1);
    assert_eq!(result.last_insert_id(), None);

    let expected_sql = "DELETE FROM users\nWHERE (id = ?)".to_string();
    assert_eq!(
        querier.calls(),
        vec![Call {
            kind: "exec",
            sql: expected_sql.clone(),
            args: vec![Arg::Int(3)],
        }]
    );
    assert_eq!(
        *logged.lock().unwrap(),
        vec![(expected_sql, vec![Arg::Int(3)])]
    );
}

#[tokio::test]
async fn prepared_statements_are_reused_until_closed() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.update("t").set("a = ${a}");

    q.prepare().await.unwrap();
    assert!(q.is_prepared());

    q.args([1_i64]);
    assert_eq!(q.exec().await.unwrap().rows_affected(), 2);
    q.args([2_i64]);
    q.exec().await.unwrap();

    let kinds: Vec<_> = querier.calls().iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec!["prepare", "exec_prepared", "exec_prepared"]);
    assert_eq!(querier.calls()[2].args, vec![Arg::Int(2)]);

    q.close().await.unwrap();
    assert!(!q.is_prepared());
    assert_eq!(*querier.closed.lock().unwrap(), vec!["UPDATE t\nSET a = ?"]);

    // Closed statements fall back to direct execution.
    q.exec().await.unwrap();
    assert_eq!(querier.calls().last().map(|c| c.kind), Some("exec"));
}

#[tokio::test]
async fn closing_without_a_handle_is_a_no_op() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.close().await.unwrap();
    q.close().await.unwrap();

    q.sql("SELECT 1");
    q.prepare().await.unwrap();
    q.close().await.unwrap();
    q.close().await.unwrap();
    assert_eq!(querier.closed.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn preparing_twice_closes_the_old_handle() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.sql("SELECT 1");
    q.prepare().await.unwrap();
    q.prepare().await.unwrap();
    assert_eq!(querier.closed.lock().unwrap().len(), 1);
    assert!(q.is_prepared());
}

// ===== Readers =====

#[tokio::test]
async fn value_reads_the_single_column() {
    let querier = ScriptedQuerier::returning(ScriptedCursor::new(
        &["count"],
        &[&[Some("42")], &[Some("43")]],
    ));
    let mut q = Statement::new(&querier);
    q.select("count(*)").from("t");
    assert_eq!(q.value().await.unwrap().as_i64(), 42);
}

#[tokio::test]
async fn value_requires_exactly_one_column() {
    let querier =
        ScriptedQuerier::returning(ScriptedCursor::new(&["a", "b"], &[&[Some("1"), Some("2")]]));
    let mut q = Statement::new(&querier);
    q.select("a, b").from("t");
    assert!(matches!(q.value().await, Err(XdbError::Scan(_))));
}

#[tokio::test]
async fn singular_readers_report_no_rows() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.select("*").from("t");

    assert!(q.value().await.unwrap_err().is_no_rows());
    assert!(q.row().await.unwrap_err().is_no_rows());

    let mut user = User::default();
    assert!(q.reflect_row(&mut user).await.unwrap_err().is_no_rows());
    assert!(q.fetch_one_as::<User>().await.unwrap_err().is_no_rows());
    assert_eq!(q.fetch_opt_as::<User>().await.unwrap(), None);
}

#[tokio::test]
async fn plural_readers_return_empty_results() {
    let querier = ScriptedQuerier::default();
    let mut q = Statement::new(&querier);
    q.select("*").from("t");

    assert!(q.rows().await.unwrap().is_empty());
    assert!(q.list("id").await.is_err());

    let mut users: Vec<User> = Vec::new();
    assert_eq!(q.reflect_rows(&mut users).await.unwrap(), 0);
    assert!(users.is_empty());
    assert!(q.fetch_all_as::<User>().await.unwrap().is_empty());
}

#[tokio::test]
async fn row_and_rows_copy_every_column() {
    let querier = ScriptedQuerier::default();
    for _ in 0..2 {
        querier.results.lock().unwrap().push_back(ScriptedCursor::new(
            &["id", "name"],
            &[&[Some("1"), Some("a")], &[Some("2"), None]],
        ));
    }
    let mut q = Statement::new(&querier);
    q.select("id, name").from("t");

    let row = q.row().await.unwrap();
    assert_eq!(row.get("name").map(Value::as_str), Some("a"));

    let rows = q.rows().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get("id").map(Value::as_i64), Some(2));
    assert!(rows[1].get("name").is_some_and(Value::is_null));
}

#[tokio::test]
async fn list_extracts_one_column_in_order() {
    let querier = ScriptedQuerier::default();
    for _ in 0..2 {
        querier.results.lock().unwrap().push_back(ScriptedCursor::new(
            &["id", "name"],
            &[&[Some("1"), Some("a")], &[Some("2"), Some("b")]],
        ));
    }
    let mut q = Statement::new(&querier);
    q.select("id, name").from("t");

    let names: Vec<String> = q
        .list("name")
        .await
        .unwrap()
        .iter()
        .map(Value::to_string)
        .collect();
    assert_eq!(names, vec!["a", "b"]);

    let err = q.list("missing").await.unwrap_err();
    assert!(err.is_column_not_found());
}

#[tokio::test]
async fn reflect_row_maps_tags_names_and_embedded_fields() {
    let querier = ScriptedQuerier::returning(user_cursor(&[&[
        Some("5"),
        Some("mingo"),
        Some("2.5e1"),
        Some("t"),
        Some("admin"),
        Some("ignored"),
    ]]));
    let mut q = Statement::new(&querier);
    q.select("*").from("users");

    let mut user = User::default();
    q.reflect_row(&mut user).await.unwrap();
    assert_eq!(
        user,
        User {
            id: 5,
            name: "mingo".into(),
            score: 25.0,
            active: true,
            audit: Audit {
                created_by: "admin".into()
            },
        }
    );
}

#[tokio::test]
async fn reflect_rows_reuses_and_grows_the_destination() {
    let querier = ScriptedQuerier::returning(user_cursor(&[
        &[Some("1"), Some("a"), None, Some("f"), None, None],
        &[Some("2"), Some("b"), Some("1"), Some("1"), Some("x"), None],
    ]));
    let mut q = Statement::new(&querier);
    q.select("*").from("users");

    let mut users = vec![User {
        id: 99,
        name: "old".into(),
        score: 3.0,
        ..Default::default()
    }];
    assert_eq!(q.reflect_rows(&mut users).await.unwrap(), 2);
    assert_eq!(users.len(), 2);
    assert_eq!((users[0].id, users[0].name.as_str()), (1, "a"));
    assert_eq!(users[0].score, 0.0);
    assert_eq!(users[1].audit.created_by, "x");
    assert!(users[1].active);
}

#[tokio::test]
async fn reflect_rows_allocates_empty_slots() {
    let querier = ScriptedQuerier::returning(user_cursor(&[
        &[Some("1"), None, None, None, None, None],
        &[Some("2"), None, None, None, None, None],
    ]));
    let mut q = Statement::new(&querier);
    q.select("*").from("users");

    let mut slots: Vec<Option<User>> = vec![None];
    assert_eq!(q.reflect_rows(&mut slots).await.unwrap(), 2);
    let ids: Vec<_> = slots.iter().flatten().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn fetch_all_as_maps_fresh_values() {
    let querier = ScriptedQuerier::returning(user_cursor(&[
        &[Some("1"), Some("a"), None, None, None, None],
        &[Some("2"), Some("b"), None, None, None, None],
    ]));
    let mut q = Statement::new(&querier);
    q.select("*").from("users");

    let users: Vec<User> = q.fetch_all_as().await.unwrap();
    let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}
