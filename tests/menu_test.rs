mod common;

use std::io::Cursor;

use bestellverwaltung::{console::Console, menu::Menu};
use common::{TestDb, LAPTOP, LAPTOP_STOCK};

/// Runs the menu over `script` and returns everything it printed.
async fn run_script(test_db: &TestDb, script: &str) -> String {
    let console = Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
    let mut menu = Menu::new(
        console,
        test_db.services.clone(),
        test_db.db.clone(),
        test_db.backups(),
    );
    menu.run().await.unwrap();
    String::from_utf8(menu.into_console().into_output()).unwrap()
}

#[tokio::test]
async fn lists_and_exits() {
    let test_db = TestDb::seeded().await;
    let output = run_script(&test_db, "1\n2\n3\n0\n").await;

    assert!(output.contains("Max Mustermann"));
    assert!(output.contains("Kopfhörer"));
    assert!(output.contains("999.99"));
    assert!(output.contains("ElektroPartner AG"));
    assert!(output.trim_end().ends_with("Goodbye!"));
}

#[tokio::test]
async fn closed_input_ends_the_session() {
    let test_db = TestDb::seeded().await;
    let output = run_script(&test_db, "1\n").await;
    assert!(output.contains("Max Mustermann"));
    assert!(!output.contains("Goodbye!"));
}

#[tokio::test]
async fn invoice_is_rendered_with_totals() {
    let test_db = TestDb::seeded().await;
    let output = run_script(&test_db, "11\n1\n0\n").await;

    assert!(output.contains("INVOICE for order no. 1"));
    assert!(output.contains("1299.97 €"));
    assert!(output.contains("1546.96 €"));
}

#[tokio::test]
async fn errors_are_reported_and_the_menu_continues() {
    let test_db = TestDb::seeded().await;
    let output = run_script(&test_db, "11\n999\n42\n7\nabc\n0\n").await;

    assert!(output.contains("Error: Not found: order 999"));
    assert!(output.contains("Invalid choice."));
    assert!(output.contains("is not a whole number"));
    assert!(output.contains("Goodbye!"));
}

#[tokio::test]
async fn new_customer_and_search() {
    let test_db = TestDb::seeded().await;
    let output = run_script(&test_db, "6\nErika Beispiel\nRingstraße 7\n4\nbeisp\n0\n").await;

    assert!(output.contains("Customer 'Erika Beispiel' added (ID 4)."));
    assert!(output.contains("1 customer(s) found"));
    assert_eq!(test_db.count("Kunden").await, 4);
}

#[tokio::test]
async fn new_order_is_booked_from_the_menu() {
    let test_db = TestDb::seeded().await;
    // customer 1; one laptop line (asked twice, second exceeds stock); finish;
    // default discount and VAT
    let script = format!("10\n1\n{laptop}\n2\n{laptop}\n{too_many}\nf\n\n\n0\n", laptop = LAPTOP, too_many = LAPTOP_STOCK);
    let output = run_script(&test_db, &script).await;

    assert!(output.contains("Added 2x Laptop."));
    assert!(output.contains("Error: Insufficient stock"));
    assert!(output.contains("Order 2 for Max Mustermann created"));
    assert_eq!(test_db.stock_of(LAPTOP).await, LAPTOP_STOCK - 2);
}

#[tokio::test]
async fn line_deletion_needs_confirmation() {
    let test_db = TestDb::seeded().await;
    let output = run_script(&test_db, "12\n1\n3\n1\nn\n12\n1\n3\n1\nj\n0\n").await;

    assert!(output.contains("Cancelled."));
    assert!(output.contains("Line deleted; 1 unit(s) back in stock."));
    assert_eq!(test_db.stock_of(LAPTOP).await, LAPTOP_STOCK + 1);
}

#[tokio::test]
async fn status_and_terms_are_changed_after_confirmation() {
    let test_db = TestDb::seeded().await;
    let output = run_script(&test_db, "13\n1\nj\n14\n1\n5\n\nj\n12\n1\n0\n").await;

    assert!(output.contains("Status changed: open -> shipped"));
    assert!(output.contains("Discount 0.00% -> 5.00%, VAT 19.00% -> 19.00%"));
    assert!(output.contains("lines can only be changed while it is open"));
}

#[tokio::test]
async fn backup_and_dry_cleanup_from_the_menu() {
    let test_db = TestDb::seeded().await;
    let output = run_script(&test_db, "18\n19\n\n16\n0\n").await;

    assert!(output.contains("Backup created:"));
    assert!(output.contains("No prices to clean up."));
    assert!(output.contains("All stock levels are above their minimum."));
}
