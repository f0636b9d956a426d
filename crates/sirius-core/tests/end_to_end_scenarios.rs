//! The concrete end-to-end scenarios an embeddable SQL engine is expected
//! to handle: a schema, some data, and a query or mutation against it.

mod common;
use common::*;

#[test]
fn schema_then_data_and_a_filtered_select() {
    let engine = engine();
    run(
        &engine,
        "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR NOT NULL, age INT); \
         INSERT INTO users VALUES (1,'John',25),(2,'Jane',30);",
    );

    let response = run_one(&engine, "SELECT * FROM users WHERE age > 26;");
    assert_ok(&response);
    assert_eq!(row_count(&response), 1);
    assert_eq!(row_contents(&response, 0)[0], 2);
    assert_eq!(row_contents(&response, 0)[1], "Jane");
    assert_eq!(row_contents(&response, 0)[2], 30);
}

#[test]
fn primary_key_collision_is_silently_skipped() {
    let engine = engine();
    run(
        &engine,
        "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR NOT NULL, age INT); \
         INSERT INTO users VALUES (1,'John',25),(2,'Jane',30);",
    );

    let response = run_one(&engine, "INSERT INTO users VALUES (1,'Eve',0);");
    assert_affected(&response, 0);

    let select = run_one(&engine, "SELECT * FROM users;");
    assert_eq!(row_count(&select), 2);
    assert_eq!(row_contents(&select, 0)[1], "John");
}

#[test]
fn not_null_violation_is_silently_skipped() {
    let engine = engine();
    run(
        &engine,
        "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR NOT NULL, age INT); \
         INSERT INTO users VALUES (1,'John',25);",
    );

    let response = run_one(&engine, "INSERT INTO users VALUES (3,NULL,0);");
    assert_affected(&response, 0);

    let select = run_one(&engine, "SELECT * FROM users;");
    assert_eq!(row_count(&select), 1);
}

#[test]
fn like_combined_with_and_or() {
    let engine = engine();
    run(
        &engine,
        "CREATE TABLE people (id INT PRIMARY KEY, email VARCHAR);
         INSERT INTO people VALUES
            (1, 'a@gmail.com'), (2, 'b@gmail.com'), (3, 'c@gmail.com'), (4, 'd@gmail.com'),
            (5, 'e@yahoo.com'), (6, 'f@yahoo.com'), (7, 'g@hotmail.com');",
    );

    let response = run_one(
        &engine,
        "SELECT * FROM people WHERE email LIKE '%@gmail.com' OR email LIKE '%@yahoo.com';",
    );
    assert_ok(&response);
    assert_eq!(row_count(&response), 6);
}

#[test]
fn in_subquery_against_active_categories() {
    let engine = engine();
    run(
        &engine,
        "CREATE TABLE categories (id INT PRIMARY KEY, active BOOLEAN);
         INSERT INTO categories VALUES (1, true), (2, false), (3, true);
         CREATE TABLE products (id INT PRIMARY KEY, category_id INT);
         INSERT INTO products VALUES (1, 1), (2, 2), (3, 3), (4, 2), (5, 1);",
    );

    let response = run_one(
        &engine,
        "SELECT id FROM products WHERE category_id IN (SELECT id FROM categories WHERE active = true);",
    );
    assert_ok(&response);
    let ids: Vec<i64> = (0..row_count(&response))
        .map(|r| row_contents(&response, r)[0].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3, 5]);
}

#[test]
fn alter_column_type_coerces_existing_values() {
    let engine = engine();
    run(
        &engine,
        "CREATE TABLE t (id INT PRIMARY KEY, price VARCHAR);
         INSERT INTO t VALUES (1, '12.5'), (2, 'abc'), (3, '7');",
    );

    let altered = run_one(&engine, "ALTER TABLE t ALTER COLUMN price TYPE DOUBLE;");
    assert_done(&altered);

    let select = run_one(&engine, "SELECT price FROM t;");
    assert_eq!(select["header"][0]["type"], "DOUBLE");
    assert_eq!(row_contents(&select, 0)[0], 12.5);
    assert!(row_contents(&select, 1)[0].is_null());
    assert_eq!(row_contents(&select, 2)[0], 7.0);
}
