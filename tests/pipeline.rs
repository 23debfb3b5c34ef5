mod common;

use common::{TestWorkspace, dump_table, table_columns};
use csv_to_sql::{
    config::LoaderConfig,
    data::DateOrder,
    loader::{self, ReadOptions},
    store::SqliteStore,
};
use encoding_rs::UTF_8;

const ORDERS: &str = "\
id,name,amount,ordered_at,active,notes
1,Alice,12.50,2024-01-05,true,
2,O'Brien,3,01/06/2024 10:30,FALSE,late
3,,\"1,000.25\",,,\"said \"\"hi\"\"\"
";

fn options() -> ReadOptions {
    ReadOptions {
        delimiter: None,
        encoding: UTF_8,
        date_order: DateOrder::MonthFirst,
    }
}

#[test]
fn orders_file_is_typed_and_loaded_into_sqlite() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("orders.csv", ORDERS);
    let mut store = SqliteStore::open_in_memory().expect("open sqlite");

    let summary = loader::load_file(&mut store, &path, "_csv_orders", &options()).expect("load");
    assert_eq!(summary.columns, 6);
    assert_eq!(summary.rows, 3);

    let columns = table_columns(store.connection(), "_csv_orders");
    assert_eq!(
        columns,
        vec![
            ("id".to_string(), "INTEGER".to_string()),
            ("name".to_string(), "VARCHAR(50)".to_string()),
            ("amount".to_string(), "DECIMAL(18,2)".to_string()),
            ("ordered_at".to_string(), "DATETIME".to_string()),
            ("active".to_string(), "BOOLEAN".to_string()),
            ("notes".to_string(), "VARCHAR(50)".to_string()),
        ]
    );

    let rows = dump_table(store.connection(), "_csv_orders");
    assert_eq!(
        rows,
        vec![
            vec!["1", "Alice", "12.5", "2024-01-05 00:00:00", "1", ""],
            vec!["2", "O'Brien", "3", "2024-01-06 10:30:00", "0", "late"],
            vec!["3", "", "1000.25", "NULL", "NULL", "said \"hi\""],
        ]
    );
}

#[test]
fn day_first_order_changes_how_dates_load() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("events.csv", "at\n05/06/2024\n");
    let mut store = SqliteStore::open_in_memory().expect("open sqlite");
    let options = ReadOptions {
        date_order: DateOrder::DayFirst,
        ..options()
    };
    loader::load_file(&mut store, &path, "events", &options).expect("load");
    assert_eq!(
        dump_table(store.connection(), "events"),
        vec![vec!["2024-06-05 00:00:00"]]
    );
}

#[test]
fn folder_load_creates_one_table_per_file_in_name_order() {
    let workspace = TestWorkspace::new();
    workspace.write("in/b_people.csv", "id,name,active\n1,Alice,true\n2,Bob,false\n");
    workspace.write("in/a_codes.tsv", "ignored\n1\n");
    workspace.write("in/a_codes.csv", "code\nX1\n");
    let database = workspace.path().join("loaded.db");

    let config = LoaderConfig {
        source_folder: Some(workspace.path().join("in")),
        database: Some(database.clone()),
        ..LoaderConfig::default()
    }
    .validate()
    .expect("valid config");

    let summaries = loader::load_into_sqlite(&config).expect("load folder");
    let tables = summaries.iter().map(|s| s.table.as_str()).collect::<Vec<_>>();
    assert_eq!(tables, vec!["_csv_a_codes", "_csv_b_people"]);

    let store = SqliteStore::open(&database).expect("reopen");
    assert_eq!(
        dump_table(store.connection(), "_csv_b_people"),
        vec![vec!["1", "Alice", "1"], vec!["2", "Bob", "0"]]
    );
    assert_eq!(
        dump_table(store.connection(), "_csv_a_codes"),
        vec![vec!["X1"]]
    );
}

#[test]
fn existing_table_aborts_the_file_without_inserting() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("dupe.csv", "id\n1\n2\n");
    let mut store = SqliteStore::open_in_memory().expect("open sqlite");
    loader::load_file(&mut store, &path, "dupe", &options()).expect("first load");

    let err = loader::load_file(&mut store, &path, "dupe", &options()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Creating table 'dupe'"), "{message}");
    assert!(message.contains("already exists"), "{message}");
    assert_eq!(dump_table(store.connection(), "dupe").len(), 2);
}

#[test]
fn failing_insert_stops_remaining_rows_of_the_file() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("ids.csv", "id\n1\n2\n3\n");
    let mut store = SqliteStore::open_in_memory().expect("open sqlite");

    let data = csv_to_sql::record::read_dataset(&path, b',', UTF_8).expect("read");
    let schema = loader::resolve_schema("ids", &data, DateOrder::MonthFirst).expect("schema");
    loader::create_table(&mut store, &schema).expect("create");
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER refuse_two BEFORE INSERT ON ids WHEN NEW.id = 2 \
             BEGIN SELECT RAISE(ABORT, 'row two refused'); END;",
        )
        .expect("create trigger");

    let err = loader::insert_records(&mut store, &schema, &data, DateOrder::MonthFirst)
        .unwrap_err();
    assert!(format!("{err:#}").contains("row two refused"));
    assert_eq!(dump_table(store.connection(), "ids"), vec![vec!["1"]]);
}
