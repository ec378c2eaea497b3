mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::write_items_csv;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

fn place(items: &std::path::Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("order-reconciler"));
    cmd.env_remove("RUST_LOG")
        .args(["place", "--buyer", "b1", "--method", "cod", "--items"])
        .arg(items);
    cmd
}

#[test]
fn test_malformed_items_csv_handling() {
    let dir = tempdir().unwrap();
    let items = dir.path().join("items.csv");
    write_items_csv(
        &items,
        &[("Ring", "42.50", "1"), ("Polish", "not_a_number", "1")],
    )
    .unwrap();

    place(&items)
        .assert()
        .failure()
        .stderr(predicate::str::contains("CSV error"));
}

#[test]
fn test_invalid_line_values() {
    let dir = tempdir().unwrap();

    let zero_price = dir.path().join("zero_price.csv");
    write_items_csv(&zero_price, &[("Ring", "0", "1")]).unwrap();
    place(&zero_price)
        .assert()
        .failure()
        .stderr(predicate::str::contains("CSV error"));

    let zero_quantity = dir.path().join("zero_quantity.csv");
    write_items_csv(&zero_quantity, &[("Ring", "42.50", "0")]).unwrap();
    place(&zero_quantity)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation error"));
}

#[test]
fn test_overflowing_total_is_reported() {
    let dir = tempdir().unwrap();
    let items = dir.path().join("huge.csv");
    write_items_csv(&items, &[("Ring", "79228162514264337593543950335", "2")]).unwrap();

    place(&items)
        .assert()
        .failure()
        .stdout(predicate::str::contains("out of range"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_sub_cent_price_is_rejected() {
    let dir = tempdir().unwrap();
    let items = dir.path().join("sub_cent.csv");
    write_items_csv(&items, &[("Pin", "0.015", "1")]).unwrap();

    place(&items)
        .assert()
        .failure()
        .stderr(predicate::str::contains("below one cent"));
}

#[test]
fn test_empty_order_is_rejected() {
    let dir = tempdir().unwrap();
    let items = dir.path().join("empty.csv");
    write_items_csv(&items, &[]).unwrap();

    place(&items)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"));
}

#[test]
fn test_unknown_payment_method() {
    let mut cmd = Command::new(cargo_bin!("order-reconciler"));
    cmd.args([
        "place",
        "--buyer",
        "b1",
        "--items",
        "tests/fixtures/items.csv",
        "--method",
        "barter",
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown payment method"));
}

#[test]
fn test_malformed_address_json() {
    let mut cmd = Command::new(cargo_bin!("order-reconciler"));
    cmd.args([
        "place",
        "--buyer",
        "b1",
        "--items",
        "tests/fixtures/items.csv",
        "--method",
        "cod",
        "--address",
        "{not json",
    ]);

    cmd.assert().failure();
}

#[test]
fn test_blank_buyer_is_rejected() {
    let mut cmd = Command::new(cargo_bin!("order-reconciler"));
    cmd.args(["cart-show", "--buyer", "  "]);

    cmd.assert().failure();
}
