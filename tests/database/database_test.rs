use std::fs;
use std::path::Path;

use kocher::database::{value_to_string, Database, DatabaseError, Row};
use kocher::model::Schema;
use kocher::planner::resolve_join;
use kocher::sql::{Compiler, FixedClock, Insert, Select, SelectionBuilder, Update};
use tempfile::TempDir;

const NOW: &str = "2020-01-31 14:05:09 EST";

fn write_schema(dir: &Path) -> Schema {
    let yaml = format!(
        r#"
sql:
  file: "{}"
database:
  tables:
    Table1:
      "Unique ID": {{ type: text, primary_key: True, join_by: True }}
      Site: {{ type: text }}
      "Last Modified (Table1)": {{ type: text, db_specific: True }}
      "Entry Created (Table1)": {{ type: text, db_specific: True }}
    Table2:
      "Unique ID": {{ type: text, primary_key: True, join_by: True }}
      Species: {{ type: text }}
      "Last Modified (Table2)": {{ type: text, db_specific: True }}
      "Entry Created (Table2)": {{ type: text, db_specific: True }}
    Table3:
      Species: {{ type: text, primary_key: True, join_by: True }}
      "Common Name": {{ type: text }}
      "Last Modified (Table3)": {{ type: text, db_specific: True }}
      "Entry Created (Table3)": {{ type: text, db_specific: True }}
"#,
        dir.join("kocher.sqlite").display()
    );
    let path = dir.join("kocher.yml");
    fs::write(&path, yaml).unwrap();
    Schema::from_yaml_file(&path).unwrap()
}

fn seeded() -> (TempDir, Schema) {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(dir.path());
    let compiler = Compiler::with_clock(&schema, FixedClock::new(NOW));

    let db = Database::create(schema.database()).unwrap();
    db.create_tables(&compiler).unwrap();
    let samples = [
        ("S1", "North", "Canis", "Wolf"),
        ("S2", "South", "Vulpes", "Red Fox"),
    ];
    for (id, site, species, common) in samples {
        db.insert(&compiler, &Insert::into("Table1").row([("Unique ID", id), ("Site", site)]))
            .unwrap();
        db.insert(
            &compiler,
            &Insert::into("Table2").row([("Unique ID", id), ("Species", species)]),
        )
        .unwrap();
        db.insert(
            &compiler,
            &Insert::into("Table3").row([("Species", species), ("Common Name", common)]),
        )
        .unwrap();
    }
    (dir, schema)
}

fn text(row: &Row, column: &str) -> String {
    value_to_string(&row[column])
}

#[test]
fn test_retrieve_across_join() {
    let (_dir, schema) = seeded();
    let compiler = Compiler::with_clock(&schema, FixedClock::new(NOW));
    let db = Database::open(schema.database()).unwrap();

    let select = Select::columns(["Table1.Unique ID", "Table1.Site", "Table2.Species"])
        .from(["Table1", "Table2"])
        .filter(SelectionBuilder::new().like("Species", ["ulp"]).build());
    let rows = db.retrieve(&compiler, &select).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].keys().collect::<Vec<_>>(),
        vec!["Unique ID", "Site", "Species"]
    );
    assert_eq!(text(&rows[0], "Unique ID"), "S2");
    assert_eq!(text(&rows[0], "Site"), "South");
}

#[test]
fn test_retrieve_across_nested_join() {
    let (_dir, schema) = seeded();
    let compiler = Compiler::with_clock(&schema, FixedClock::new(NOW));
    let db = Database::open(schema.database()).unwrap();

    let select = Select::columns(["Table1.Unique ID", "Table1.Site"])
        .from(["Table1", "Table3"])
        .filter(SelectionBuilder::new().is_in("Table3.Common Name", ["Red Fox"]).build());
    let rows = db.retrieve(&compiler, &select).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(text(&rows[0], "Unique ID"), "S2");
    assert_eq!(text(&rows[0], "Site"), "South");
}

#[test]
fn test_repeated_column_names_keep_every_value() {
    let (_dir, schema) = seeded();
    let compiler = Compiler::with_clock(&schema, FixedClock::new(NOW));
    let db = Database::open(schema.database()).unwrap();

    let select = Select::columns(["Table1.Unique ID", "Table2.Unique ID", "Table2.Species"])
        .from(["Table1", "Table2"])
        .filter(SelectionBuilder::new().is_in("Table1.Unique ID", ["S1"]).build());

    let rows = db.retrieve(&compiler, &select).unwrap();
    assert_eq!(
        rows[0].keys().collect::<Vec<_>>(),
        vec!["Table1.Unique ID", "Table2.Unique ID", "Species"]
    );
    assert_eq!(text(&rows[0], "Table1.Unique ID"), "S1");
    assert_eq!(text(&rows[0], "Table2.Unique ID"), "S1");

    let statement = compiler.compile_select(&select).unwrap();
    let rows = db.query(&statement).unwrap();
    assert_eq!(
        rows[0].keys().collect::<Vec<_>>(),
        vec!["Unique ID", "Unique ID (2)", "Species"]
    );
}

#[test]
fn test_retrieve_with_exclusion() {
    let (_dir, schema) = seeded();
    let compiler = Compiler::with_clock(&schema, FixedClock::new(NOW));
    let db = Database::open(schema.database()).unwrap();

    let select = Select::columns(["Table2.Species"])
        .filter(SelectionBuilder::new().not_in("Table2.Unique ID", ["S1"]).build());
    let rows = db.retrieve(&compiler, &select).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(text(&rows[0], "Species"), "Vulpes");
}

#[test]
fn test_audit_columns_share_a_timestamp() {
    let (_dir, schema) = seeded();
    let compiler = Compiler::with_clock(&schema, FixedClock::new(NOW));
    let db = Database::open(schema.database()).unwrap();

    let rows = db
        .retrieve(&compiler, &Select::columns(["Table1.*"]).from(["Table1"]))
        .unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(text(row, "Entry Created (Table1)"), format!("\"{}\"", NOW));
        assert_eq!(text(row, "Last Modified (Table1)"), format!("\"{}\"", NOW));
    }
}

#[test]
fn test_duplicate_entry_names_value_and_column() {
    let (_dir, schema) = seeded();
    let compiler = Compiler::with_clock(&schema, FixedClock::new(NOW));
    let db = Database::open(schema.database()).unwrap();

    let err = db
        .insert(&compiler, &Insert::into("Table1").row([("Unique ID", "S1"), ("Site", "East")]))
        .unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateEntry { .. }));
    assert_eq!(
        err.to_string(),
        "S1 already exists. Table1.Unique ID does not support duplicate entries"
    );
}

#[test]
fn test_update_through_join() {
    let (_dir, schema) = seeded();
    let db = Database::open(schema.database()).unwrap();
    let later = Compiler::with_clock(&schema, FixedClock::new("2020-02-03 08:30:00 EST"));

    let update = Update::table("Table1")
        .set("Site", "West")
        .filter(SelectionBuilder::new().is_in("Table2.Species", ["Canis"]).build())
        .join_key("Unique ID")
        .join_plan(resolve_join(&schema, &["Table1", "Table2"]).unwrap());
    assert_eq!(db.update(&later, &update).unwrap(), 1);

    let select = Select::columns(["Site", "Last Modified (Table1)", "Entry Created (Table1)"])
        .from(["Table1"])
        .filter(SelectionBuilder::new().is_in("Unique ID", ["S1"]).build());
    let rows = db.retrieve(&later, &select).unwrap();

    assert_eq!(text(&rows[0], "Site"), "West");
    assert_eq!(
        text(&rows[0], "Last Modified (Table1)"),
        "\"2020-02-03 08:30:00 EST\""
    );
    assert_eq!(text(&rows[0], "Entry Created (Table1)"), format!("\"{}\"", NOW));
}

#[test]
fn test_update_through_nested_join() {
    let (_dir, schema) = seeded();
    let db = Database::open(schema.database()).unwrap();
    let later = Compiler::with_clock(&schema, FixedClock::new("2020-02-03 08:30:00 EST"));

    let update = Update::table("Table1")
        .set("Site", "Den")
        .filter(SelectionBuilder::new().is_in("Table3.Common Name", ["Wolf"]).build())
        .join_key("Unique ID")
        .join_plan(resolve_join(&schema, &["Table1", "Table3"]).unwrap());
    assert_eq!(db.update(&later, &update).unwrap(), 1);

    let rows = db
        .retrieve(&later, &Select::columns(["Unique ID", "Site"]).from(["Table1"]))
        .unwrap();
    let sites: Vec<(String, String)> = rows
        .iter()
        .map(|row| (text(row, "Unique ID"), text(row, "Site")))
        .collect();
    assert_eq!(
        sites,
        vec![
            ("S1".to_string(), "Den".to_string()),
            ("S2".to_string(), "South".to_string())
        ]
    );
}

#[test]
fn test_open_requires_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(dir.path());
    assert!(matches!(
        Database::open(schema.database()),
        Err(DatabaseError::NotFound(_))
    ));
}
