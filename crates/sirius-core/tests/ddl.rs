//! `CREATE`/`ALTER`/`DROP TABLE` coverage beyond the single ALTER COLUMN
//! TYPE scenario already covered in `end_to_end_scenarios.rs`.

mod common;
use common::*;

#[test]
fn create_table_with_options_is_honored() {
    let engine = engine();
    let response = run_one(
        &engine,
        "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR)
         WITH OPTIONS (MAX_COLUMN_LENGTH = 8, GC_FREQUENCY = 30 DAYS);",
    );
    assert_done(&response);

    let rejected = run_one(&engine, "CREATE TABLE t2 (a_very_long_column_name INT) WITH OPTIONS (MAX_COLUMN_LENGTH = 8);");
    assert_error(&rejected);
}

#[test]
fn create_table_rejects_a_column_type_outside_allowed_types() {
    let engine = engine();
    let response = run_one(
        &engine,
        "CREATE TABLE t (id INT PRIMARY KEY, note VARCHAR) WITH OPTIONS (TYPES = (INT));",
    );
    assert_error(&response);
}

#[test]
fn create_table_twice_is_a_schema_error() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (id INT PRIMARY KEY);");
    let response = run_one(&engine, "CREATE TABLE t (id INT PRIMARY KEY);");
    assert_error(&response);
}

#[test]
fn drop_table_if_exists_tolerates_a_missing_table() {
    let engine = engine();
    let response = run_one(&engine, "DROP TABLE IF EXISTS ghost;");
    assert_done(&response);

    let hard_fail = run_one(&engine, "DROP TABLE ghost;");
    assert_error(&hard_fail);
}

#[test]
fn rename_table_and_rename_column() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR);");
    run(&engine, "INSERT INTO t VALUES (1, 'Ann');");

    assert_done(&run_one(&engine, "ALTER TABLE t RENAME TO people;"));
    assert_done(&run_one(&engine, "ALTER TABLE people RENAME COLUMN name TO full_name;"));

    let response = run_one(&engine, "SELECT full_name FROM people;");
    assert_ok(&response);
    assert_eq!(row_contents(&response, 0)[0], "Ann");
}

#[test]
fn add_column_backfills_existing_rows() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (id INT PRIMARY KEY);");
    run(&engine, "INSERT INTO t VALUES (1), (2);");

    assert_done(&run_one(&engine, "ALTER TABLE t ADD COLUMN active BOOLEAN NOT NULL;"));

    let response = run_one(&engine, "SELECT * FROM t;");
    assert_eq!(row_contents(&response, 0)[1], false);
    assert_eq!(row_contents(&response, 1)[1], false);
}

#[test]
fn drop_column_removes_it_from_every_row() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (id INT PRIMARY KEY, note VARCHAR);");
    run(&engine, "INSERT INTO t VALUES (1, 'x');");

    assert_done(&run_one(&engine, "ALTER TABLE t DROP COLUMN note;"));
    let response = run_one(&engine, "SELECT * FROM t;");
    assert_eq!(response["header"].as_array().unwrap().len(), 1);
}

#[test]
fn drop_column_cannot_remove_the_primary_key() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (id INT PRIMARY KEY, note VARCHAR);");
    let response = run_one(&engine, "ALTER TABLE t DROP COLUMN id;");
    assert_error(&response);
}

#[test]
fn drop_column_cannot_remove_the_last_column() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (note VARCHAR);");
    let response = run_one(&engine, "ALTER TABLE t DROP COLUMN note;");
    assert_error(&response);
}

#[test]
fn add_column_refuses_a_primary_key_on_a_nonempty_table() {
    let engine1 = engine();
    run(&engine1, "CREATE TABLE t (id INT PRIMARY KEY);");
    run(&engine1, "INSERT INTO t VALUES (1);");

    let response = run_one(&engine1, "ALTER TABLE t ADD COLUMN id2 INT PRIMARY KEY NOT NULL;");
    assert_error(&response);

    // An empty table still accepts a new primary key column.
    let engine2 = engine();
    run(&engine2, "CREATE TABLE t2 (note VARCHAR);");
    let ok = run_one(&engine2, "ALTER TABLE t2 ADD COLUMN id INT PRIMARY KEY NOT NULL;");
    assert_done(&ok);
}
