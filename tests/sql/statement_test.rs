use insta::assert_snapshot;
use kocher::model::{Schema, SchemaError};
use kocher::planner::resolve_join;
use kocher::sql::quote::{quote_ident, quote_path, unquote};
use kocher::sql::{
    CompileError, Compiler, FixedClock, Insert, Select, SelectionBuilder, SelectionExpression,
    Update,
};

const NOW: &str = "2020-01-31 14:05:09 EST";

const LAB_YAML: &str = r#"
sql:
  file: testDB.sqlite
database:
  tables:
    Table1:
      "Unique ID": { type: text, primary_key: True, join_by: True }
      Site: { type: text }
      "Last Modified (Table1)": { type: text, db_specific: True }
      "Entry Created (Table1)": { type: text, db_specific: True }
    Table2:
      "Unique ID": { type: text, join_by: True }
      Species: { type: text, not_null: True }
      "Last Modified (Table2)": { type: text, db_specific: True }
      "Entry Created (Table2)": { type: text, db_specific: True }
    Table3:
      Species: { type: text, join_by: True }
      Genus: { type: text }
"#;

fn schema() -> Schema {
    Schema::from_yaml_str(LAB_YAML).unwrap()
}

fn compiler(schema: &Schema) -> Compiler<'_> {
    Compiler::with_clock(schema, FixedClock::new(NOW))
}

#[test]
fn test_quoting_round_trip() {
    for token in ["Unique ID", "Test-1", "Lab Site-2", "\"Entry Created (Table1)\""] {
        let quoted = quote_ident(token);
        assert_eq!(quote_ident(&unquote(&quoted)), quoted);
    }
    assert_eq!(quote_path("Table1.Unique ID"), "Table1.\"Unique ID\"");
    assert_eq!(quote_path("Test-1.Species"), "\"Test-1\".Species");
}

#[test]
fn test_create_table() {
    let schema = schema();
    let sql = compiler(&schema).compile_create_table(schema.table("Table1").unwrap());
    assert_snapshot!(sql, @r#"CREATE TABLE IF NOT EXISTS Table1 ("Unique ID" text PRIMARY KEY, Site text, "Last Modified (Table1)" text, "Entry Created (Table1)" text)"#);
}

#[test]
fn test_select_direct_join() {
    let schema = schema();
    let select = Select::columns(["Table1.Unique ID", "Table2.Species"]).from(["Table1", "Table2"]);
    let stmt = compiler(&schema).compile_select(&select).unwrap();

    assert_snapshot!(stmt.sql, @r#"SELECT Table1."Unique ID", Table2.Species FROM Table1 INNER JOIN Table2 ON Table1."Unique ID" = Table2."Unique ID""#);
    assert!(stmt.params.is_empty());
}

#[test]
fn test_select_nested_join() {
    let schema = schema();
    let select = Select::columns(["Table1.Unique ID", "Table2.Species"]).from(["Table3", "Table1"]);
    let stmt = compiler(&schema).compile_select(&select).unwrap();

    assert_snapshot!(stmt.sql, @r#"SELECT Table1."Unique ID", Table2.Species FROM Table1 INNER JOIN (Table2 INNER JOIN Table3 ON Table2.Species = Table3.Species) Table2 ON Table1."Unique ID" = Table2."Unique ID""#);
}

#[test]
fn test_select_with_selection() {
    let schema = schema();
    let selection = SelectionBuilder::new()
        .is_in("Table1.Unique ID", ["ID-1", "ID-2"])
        .like("Table3.Genus", ["Canis"])
        .build();
    let select = Select::columns(["Table1.*"])
        .from(["Table1", "Table3"])
        .filter(selection);
    let stmt = compiler(&schema).compile_select(&select).unwrap();

    assert_snapshot!(stmt.sql, @r#"SELECT Table1.* FROM Table1 INNER JOIN (Table2 INNER JOIN Table3 ON Table2.Species = Table3.Species) Table2 ON Table1."Unique ID" = Table2."Unique ID" WHERE Table1."Unique ID" IN (?, ?) AND Table3.Genus LIKE ?"#);
    assert_eq!(stmt.params, vec!["\"ID-1\"", "\"ID-2\"", "%Canis%"]);
}

#[test]
fn test_select_with_explicit_plan() {
    let schema = schema();
    let plan = resolve_join(&schema, &["Table2", "Table3"]).unwrap();
    let select = Select::columns(["Table3.Genus"]).join_plan(plan);
    let stmt = compiler(&schema).compile_select(&select).unwrap();

    assert_snapshot!(stmt.sql, @"SELECT Table3.Genus FROM Table2 INNER JOIN Table3 ON Table2.Species = Table3.Species");
}

#[test]
fn test_placeholder_parity() {
    let selections = [
        SelectionExpression::empty(),
        SelectionBuilder::new().is_in("Site", ["a"]).build(),
        SelectionBuilder::new()
            .not_in("Site", ["a", "b", "c"])
            .like("Species", ["x", "y"])
            .not_like("Genus", ["z"])
            .build(),
    ];

    for selection in selections {
        let clause = selection.compile_where();
        assert_eq!(clause.sql.matches('?').count(), clause.params.len());
    }
}

#[test]
fn test_like_value_is_wildcarded() {
    let clause = SelectionBuilder::new().like("Species", ["Foo"]).build().compile_where();
    assert_eq!(clause.params, vec!["%Foo%"]);
}

#[test]
fn test_insert() {
    let schema = schema();
    let insert = Insert::into("Table1").row([("Unique ID", "ID-1"), ("Site", "North Field")]);
    let stmt = compiler(&schema).compile_insert(&insert).unwrap();

    assert_snapshot!(stmt.sql, @r#"INSERT INTO Table1 ("Unique ID", Site, "Last Modified (Table1)", "Entry Created (Table1)") VALUES (?, ?, ?, ?)"#);
    assert_eq!(
        stmt.params,
        vec![
            "\"ID-1\"",
            "\"North Field\"",
            "\"2020-01-31 14:05:09 EST\"",
            "\"2020-01-31 14:05:09 EST\"",
        ]
    );
}

#[test]
fn test_write_to_table_without_audit_columns() {
    let schema = schema();
    let insert = Insert::into("Table3").row([("Species", "Canis"), ("Genus", "Canidae")]);
    match compiler(&schema).compile_insert(&insert) {
        Err(CompileError::Schema(SchemaError::UnknownColumn(column))) => {
            assert_eq!(column, "Table3.Last Modified (Table3)")
        }
        other => panic!("expected missing audit column, got {:?}", other),
    }

    let update = Update::table("Table3").set("Genus", "Vulpes");
    assert!(matches!(
        compiler(&schema).compile_update(&update),
        Err(CompileError::Schema(SchemaError::UnknownColumn(_)))
    ));
}

#[test]
fn test_insert_unknown_column() {
    let schema = schema();
    let insert = Insert::into("Table1").row([("Genus", "Canis")]);
    assert!(matches!(
        compiler(&schema).compile_insert(&insert),
        Err(CompileError::Schema(_))
    ));
}

#[test]
fn test_update() {
    let schema = schema();
    let update = Update::table("Table1")
        .set("Site", "South")
        .filter(SelectionBuilder::new().is_in("Unique ID", ["ID-1"]).build());
    let stmt = compiler(&schema).compile_update(&update).unwrap();

    assert_snapshot!(stmt.sql, @r#"UPDATE Table1 SET Site = ?, "Last Modified (Table1)" = ? WHERE "Unique ID" IN (?)"#);
    assert_eq!(stmt.params, vec!["South", "\"2020-01-31 14:05:09 EST\"", "\"ID-1\""]);
}

#[test]
fn test_update_without_selection_has_no_where() {
    let schema = schema();
    let stmt = compiler(&schema)
        .compile_update(&Update::table("Table2").set("Species", "Canis"))
        .unwrap();
    assert_snapshot!(stmt.sql, @r#"UPDATE Table2 SET Species = ?, "Last Modified (Table2)" = ?"#);
}

#[test]
fn test_update_through_join() {
    let schema = schema();
    let plan = resolve_join(&schema, &["Table1", "Table3"]).unwrap();
    let update = Update::table("Table1")
        .set("Site", "North Field")
        .filter(SelectionBuilder::new().is_in("Table3.Genus", ["Canis"]).build())
        .join_key("Unique ID")
        .join_plan(plan);
    let stmt = compiler(&schema).compile_update(&update).unwrap();

    assert_snapshot!(stmt.sql, @r#"UPDATE Table1 SET Site = ?, "Last Modified (Table1)" = ? WHERE "Unique ID" IN (SELECT Table1."Unique ID" FROM Table1 INNER JOIN (Table2 INNER JOIN Table3 ON Table2.Species = Table3.Species) Table2 ON Table1."Unique ID" = Table2."Unique ID" WHERE Table3.Genus IN (?))"#);
    assert_eq!(
        stmt.params,
        vec!["\"North Field\"", "\"2020-01-31 14:05:09 EST\"", "Canis"]
    );
}

#[test]
fn test_update_partial_join_spec() {
    let schema = schema();
    let compiler = compiler(&schema);

    let key_only = Update::table("Table1").set("Site", "x").join_key("Unique ID");
    let plan_only = Update::table("Table1")
        .set("Site", "x")
        .join_plan(resolve_join(&schema, &["Table1", "Table2"]).unwrap());

    for update in [key_only, plan_only] {
        let err = compiler.compile_update(&update).unwrap_err();
        assert!(matches!(err, CompileError::InvalidJoinSpec(_)));
        assert!(err.to_string().contains("unable to create FROM statement"));
    }
}

#[test]
fn test_unknown_table() {
    let schema = schema();
    let err = compiler(&schema)
        .compile_select(&Select::columns(["Site"]).from(["Table1", "Table9"]))
        .unwrap_err();
    assert!(matches!(err, CompileError::Join(_)));
}

#[test]
fn test_selection_qualify_and_tables() {
    let schema = schema();
    let selection = SelectionBuilder::new()
        .is_in("Site", ["North"])
        .like("Genus", ["Can"])
        .build();

    assert_eq!(selection.tables(&schema).unwrap(), vec!["Table1", "Table3"]);

    let qualified = selection.qualify(&schema).unwrap();
    assert_eq!(qualified.columns(), vec!["Table1.Site", "Table3.Genus"]);
    assert_snapshot!(qualified.compile_where().sql, @"Table1.Site IN (?) AND Table3.Genus LIKE ?");

    let unknown = SelectionBuilder::new().is_in("Colour", ["red"]).build();
    assert!(unknown.qualify(&schema).is_err());
}

#[test]
fn test_select_quoted_table_path() {
    let yaml = r#"
sql: { file: testDB.sqlite }
database:
  tables:
    "Test-1":
      Species: { type: text, join_by: True }
"#;
    let schema = Schema::from_yaml_str(yaml).unwrap();
    let select = Select::columns(["\"Test-1\".Species"]).from(["Test-1"]);
    let stmt = compiler(&schema).compile_select(&select).unwrap();

    assert_snapshot!(stmt.sql, @r#"SELECT "Test-1".Species FROM "Test-1""#);
}
