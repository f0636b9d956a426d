//! Edge-of-range behavior that a careful implementation gets right by
//! construction rather than by special-casing.

mod common;
use common::*;

#[test]
fn empty_where_yields_every_row() {
    let engine = engine();
    run(
        &engine,
        "CREATE TABLE t (id INT PRIMARY KEY);
         INSERT INTO t VALUES (1), (2), (3);",
    );
    let response = run_one(&engine, "SELECT * FROM t;");
    assert_eq!(row_count(&response), 3);
}

#[test]
fn select_star_from_empty_table_has_a_header_and_no_rows() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR);");
    let response = run_one(&engine, "SELECT * FROM t;");
    assert_ok(&response);
    assert_eq!(response["header"].as_array().unwrap().len(), 2);
    assert_eq!(row_count(&response), 0);
}

#[test]
fn update_with_no_matches_succeeds_with_zero_affected() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR);");
    let response = run_one(&engine, "UPDATE t SET name = 'x' WHERE id = 99;");
    assert_affected(&response, 0);
}

#[test]
fn insert_into_a_nonexistent_table_is_an_error() {
    let engine = engine();
    let response = run_one(&engine, "INSERT INTO ghost VALUES (1);");
    assert_error(&response);
}

#[test]
fn column_name_at_the_length_limit_is_accepted_one_more_is_rejected() {
    let engine = engine();
    let at_limit = "a".repeat(16);
    let over_limit = "a".repeat(17);

    let ok = run_one(&engine, &format!("CREATE TABLE t1 ({at_limit} INT);"));
    assert_done(&ok);

    let rejected = run_one(&engine, &format!("CREATE TABLE t2 ({over_limit} INT);"));
    assert_error(&rejected);
}

#[test]
fn insert_then_select_round_trips_a_row() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR, age INT);");
    run(&engine, "INSERT INTO t VALUES (1, 'Ann', 40);");
    let response = run_one(&engine, "SELECT * FROM t;");
    assert_eq!(row_count(&response), 1);
    let cells = row_contents(&response, 0);
    assert_eq!(cells, vec![
        serde_json::json!(1),
        serde_json::json!("Ann"),
        serde_json::json!(40),
    ]);
}

#[test]
fn every_insert_grows_the_row_count_by_one_every_delete_shrinks_by_k() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (id INT PRIMARY KEY);");
    run(&engine, "INSERT INTO t VALUES (1), (2), (3), (4);");
    assert_eq!(row_count(&run_one(&engine, "SELECT * FROM t;")), 4);

    let deleted = run_one(&engine, "DELETE FROM t WHERE id <= 2;");
    assert_affected(&deleted, 2);
    assert_eq!(row_count(&run_one(&engine, "SELECT * FROM t;")), 2);
}

#[test]
fn null_never_equals_null() {
    let engine = engine();
    run(&engine, "CREATE TABLE t (id INT PRIMARY KEY, note VARCHAR);");
    run(&engine, "INSERT INTO t VALUES (1, NULL);");
    let response = run_one(&engine, "SELECT * FROM t WHERE note = NULL;");
    assert_eq!(row_count(&response), 0);
}
