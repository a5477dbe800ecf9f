//! Interactive main menu.

use crate::{
    backup::{BackupKind, BackupManager},
    console::Console,
    db::DbPool,
    entities::OrderStatus,
    errors::ServiceError,
    services::{
        customers::{CustomerUpdate, NewCustomer},
        invoicing::Invoice,
        orders::{LineChange, NewOrder, NewOrderLine, TermsUpdate},
        prices::CleanupReport,
        products::{InitialStock, NewProduct},
        suppliers::NewSupplier,
        Services,
    },
};
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{error, info, warn};

const MENU: &str = "
=== BESTELLVERWALTUNG ===
--- View ---
 1. Customers
 2. Products & stock
 3. Suppliers
--- Search ---
 4. Search customers
 5. Search products
--- Master data ---
 6. New customer
 7. Edit customer
 8. New supplier
 9. New product
--- Orders ---
10. New order
11. Show invoice
12. Edit order lines
13. Advance order status
14. Change discount & VAT
--- Reports & maintenance ---
15. Customer order history
16. Low-stock report
17. Stock correction (physical count)
18. Back up database
19. Clean up prices
 0. Exit";

fn money(amount: Decimal) -> String {
    format!("{:.2} €", amount)
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub struct Menu<R, W> {
    console: Console<R, W>,
    services: Services,
    db: Arc<DbPool>,
    backups: BackupManager,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(
        console: Console<R, W>,
        services: Services,
        db: Arc<DbPool>,
        backups: BackupManager,
    ) -> Self {
        Self {
            console,
            services,
            db,
            backups,
        }
    }

    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Runs until the user exits or input ends. Failed operations are
    /// reported and the menu continues.
    pub async fn run(&mut self) -> Result<(), ServiceError> {
        loop {
            self.console.say(MENU)?;
            let choice = match self.console.prompt("Choice: ") {
                Ok(choice) => choice,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };

            if choice == "0" {
                self.console.say("Goodbye!")?;
                break;
            }

            match self.dispatch(&choice).await {
                Ok(()) => {}
                Err(e) if e.is_end_of_input() => break,
                Err(e) if e.is_user_error() => {
                    warn!("Menu choice {} failed: {}", choice, e);
                    self.console.say(format!("Error: {}", e))?;
                }
                Err(e) => {
                    error!("Menu choice {} failed: {}", choice, e);
                    self.console.say(format!("Error: {}", e))?;
                }
            }
        }
        info!("Menu closed");
        Ok(())
    }

    async fn dispatch(&mut self, choice: &str) -> Result<(), ServiceError> {
        match choice {
            "1" => self.list_customers().await,
            "2" => self.list_products().await,
            "3" => self.list_suppliers().await,
            "4" => self.search_customers().await,
            "5" => self.search_products().await,
            "6" => self.new_customer().await,
            "7" => self.edit_customer().await,
            "8" => self.new_supplier().await,
            "9" => self.new_product().await,
            "10" => self.new_order().await,
            "11" => self.show_invoice().await,
            "12" => self.edit_order_lines().await,
            "13" => self.advance_status().await,
            "14" => self.change_terms().await,
            "15" => self.order_history().await,
            "16" => self.low_stock_report().await,
            "17" => self.correct_stock().await,
            "18" => self.backup().await,
            "19" => self.clean_prices().await,
            _ => {
                self.console.say("Invalid choice.")?;
                Ok(())
            }
        }
    }

    async fn list_customers(&mut self) -> Result<(), ServiceError> {
        let customers = self.services.customers.list_customers().await?;
        self.console.say("\n--- Customers ---")?;
        let rows: Vec<Vec<String>> = customers
            .into_iter()
            .map(|c| vec![c.id.to_string(), c.name, c.address])
            .collect();
        self.console.table(&["ID", "Name", "Address"], &rows)?;
        Ok(())
    }

    async fn list_products(&mut self) -> Result<(), ServiceError> {
        let products = self.services.products.list_products().await?;
        self.console.say("\n--- Products & stock ---")?;
        let rows: Vec<Vec<String>> = products
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.name.clone(),
                    p.price_label(),
                    p.stock.to_string(),
                ]
            })
            .collect();
        self.console.table(&["ID", "Name", "Price", "Stock"], &rows)?;
        Ok(())
    }

    async fn list_suppliers(&mut self) -> Result<(), ServiceError> {
        let suppliers = self.services.suppliers.list_suppliers().await?;
        self.console.say("\n--- Suppliers ---")?;
        let rows: Vec<Vec<String>> = suppliers
            .into_iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.name,
                    or_dash(s.contact),
                    or_dash(s.lead_time_days),
                ]
            })
            .collect();
        self.console
            .table(&["ID", "Name", "Contact", "Lead time (days)"], &rows)?;
        Ok(())
    }

    async fn search_customers(&mut self) -> Result<(), ServiceError> {
        let term = self.console.prompt("Customer name (part): ")?;
        let customers = self.services.customers.search_customers(&term).await?;
        if customers.is_empty() {
            self.console
                .say(format!("No customers containing '{}'.", term))?;
            return Ok(());
        }
        self.console
            .say(format!("\n--- {} customer(s) found ---", customers.len()))?;
        let rows: Vec<Vec<String>> = customers
            .into_iter()
            .map(|c| vec![c.id.to_string(), c.name, c.address])
            .collect();
        self.console.table(&["ID", "Name", "Address"], &rows)?;
        Ok(())
    }

    async fn search_products(&mut self) -> Result<(), ServiceError> {
        let term = self.console.prompt("Product name (part): ")?;
        let products = self.services.products.search_products(&term).await?;
        if products.is_empty() {
            self.console
                .say(format!("No products containing '{}'.", term))?;
            return Ok(());
        }
        self.console
            .say(format!("\n--- {} product(s) found ---", products.len()))?;
        let rows: Vec<Vec<String>> = products
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.name.clone(),
                    p.price_label(),
                    p.stock.to_string(),
                ]
            })
            .collect();
        self.console.table(&["ID", "Name", "Price", "Stock"], &rows)?;
        Ok(())
    }

    async fn new_customer(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- New customer ---")?;
        let name = self.console.prompt_required("Name: ", "name")?;
        let address = self.console.prompt_required("Address: ", "address")?;

        let customer = self
            .services
            .customers
            .create_customer(NewCustomer { name, address })
            .await?;
        self.console.say(format!(
            "Customer '{}' added (ID {}).",
            customer.name, customer.id
        ))?;
        Ok(())
    }

    async fn edit_customer(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- Edit customer ---")?;
        let customer_id = self.console.prompt_int("Customer ID: ")?;
        let customer = self.services.customers.get_customer(customer_id).await?;
        self.console
            .say(format!("Current: {} / {}", customer.name, customer.address))?;

        let update = CustomerUpdate {
            name: self.console.prompt_optional("New name (Enter keeps): ")?,
            address: self.console.prompt_optional("New address (Enter keeps): ")?,
        };
        if update.is_empty() {
            self.console.say("Nothing changed.")?;
            return Ok(());
        }

        let updated = self
            .services
            .customers
            .update_customer(customer_id, update)
            .await?;
        self.console.say(format!(
            "Customer {} updated: {} / {}",
            updated.id, updated.name, updated.address
        ))?;
        Ok(())
    }

    async fn new_supplier(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- New supplier ---")?;
        let name = self.console.prompt_required("Company name: ", "company name")?;
        let contact = self
            .console
            .prompt_required("Contact (e-mail/phone): ", "contact")?;
        let lead_time_days = self.console.prompt_int("Lead time in days: ")?;

        let supplier = self
            .services
            .suppliers
            .create_supplier(NewSupplier {
                name,
                contact,
                lead_time_days,
            })
            .await?;
        self.console.say(format!(
            "Supplier '{}' added (ID {}).",
            supplier.name, supplier.id
        ))?;
        Ok(())
    }

    async fn new_product(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- New product ---")?;
        let name = self.console.prompt_required("Product name: ", "product name")?;
        let price = self
            .console
            .prompt_optional_decimal("Price: ")?
            .ok_or_else(|| ServiceError::ValidationError("price must not be empty".into()))?;

        let initial_stock = if self.console.confirm("Create stock entry? (j/n): ")? {
            let quantity = self.console.prompt_int("Quantity: ")?;
            let minimum_quantity = self.console.prompt_int("Minimum stock: ")?;
            let suppliers = self.services.suppliers.list_suppliers().await?;
            if suppliers.is_empty() {
                return Err(ServiceError::InvalidOperation(
                    "no suppliers yet; add a supplier first".into(),
                ));
            }
            let rows: Vec<Vec<String>> = suppliers
                .into_iter()
                .map(|s| vec![s.id.to_string(), s.name])
                .collect();
            self.console.table(&["ID", "Name"], &rows)?;
            let supplier_id = self.console.prompt_int("Supplier ID: ")?;
            Some(InitialStock {
                quantity,
                minimum_quantity,
                supplier_id,
            })
        } else {
            None
        };

        let product = self
            .services
            .products
            .create_product(NewProduct {
                name,
                price,
                initial_stock,
            })
            .await?;
        self.console.say(format!(
            "Product '{}' added (ID {}, stock {}).",
            product.name, product.id, product.stock
        ))?;
        Ok(())
    }

    async fn new_order(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- New order ---")?;
        self.list_customers().await?;
        let customer_id = self.console.prompt_int("Customer ID: ")?;
        let customer = self.services.customers.get_customer(customer_id).await?;

        let mut lines: Vec<NewOrderLine> = Vec::new();
        loop {
            self.list_products().await?;
            let input = self
                .console
                .prompt("Product ID (f = finish): ")?
                .to_lowercase();
            if input.is_empty() || input == "f" {
                break;
            }
            match self.collect_line(&input, &lines).await {
                Ok(line) => lines.push(line),
                Err(e) if e.is_user_error() => self.console.say(format!("Error: {}", e))?,
                Err(e) => return Err(e),
            }
        }

        let discount_percent = self
            .console
            .prompt_optional_decimal("Discount in % (Enter = 0): ")?
            .unwrap_or(0.0);
        let default_vat = self.services.orders.default_vat_rate();
        let vat_rate_percent = self
            .console
            .prompt_optional_decimal(&format!("VAT rate in % (Enter = {}): ", default_vat))?;

        let created = self
            .services
            .orders
            .create_order(NewOrder {
                customer_id,
                lines,
                discount_percent,
                vat_rate_percent,
            })
            .await?;
        self.console.say(format!(
            "Order {} for {} created on {} with {} line(s).",
            created.order.id,
            customer.name,
            created.order.order_date,
            created.lines.len()
        ))?;
        self.console.say(format!(
            "  Discount: {:.2}% | VAT: {:.2}%",
            created.order.discount_percent, created.order.vat_rate_percent
        ))?;
        Ok(())
    }

    /// Asks for the quantity of one order line, checking stock against the
    /// lines already collected
    async fn collect_line(
        &mut self,
        product_input: &str,
        pending: &[NewOrderLine],
    ) -> Result<NewOrderLine, ServiceError> {
        let product_id = crate::console::parse_int(product_input)?;
        let product = self.services.products.get_product(product_id).await?;
        product.numeric_price()?;

        let reserved: i32 = pending
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .sum();
        let available = product.stock - reserved;

        let quantity = self.console.prompt_int(&format!(
            "Quantity of '{}' (available: {}): ",
            product.name, available
        ))?;
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be greater than zero".into(),
            ));
        }
        if quantity > available {
            warn!(
                "Line rejected: {} of product {} requested, {} available",
                quantity, product_id, available
            );
            return Err(ServiceError::InsufficientStock(format!(
                "'{}': requested {}, available {}",
                product.name, quantity, available
            )));
        }

        self.console
            .say(format!("Added {}x {}.", quantity, product.name))?;
        Ok(NewOrderLine {
            product_id,
            quantity,
        })
    }

    async fn show_invoice(&mut self) -> Result<(), ServiceError> {
        let order_id = self.console.prompt_int("Order ID: ")?;
        let invoice = self.services.invoices.invoice_for_order(order_id).await?;
        self.render_invoice(&invoice)?;
        Ok(())
    }

    fn render_invoice(&mut self, invoice: &Invoice) -> Result<(), ServiceError> {
        let rule = "=".repeat(60);
        self.console.say(format!("\n{}", rule))?;
        self.console
            .say(format!("INVOICE for order no. {}", invoice.order.id))?;
        self.console
            .say(format!("Date: {}", invoice.order.order_date))?;
        self.console.say(format!(
            "Status: {}",
            invoice.order.status.label().to_uppercase()
        ))?;
        self.console
            .say(format!("Customer: {}", invoice.customer.name))?;
        self.console
            .say(format!("          {}", invoice.customer.address))?;
        self.console.say(&rule)?;

        if invoice.lines.is_empty() {
            self.console.say("No lines in this order.")?;
        } else {
            let rows: Vec<Vec<String>> = invoice
                .lines
                .iter()
                .map(|l| {
                    vec![
                        l.line_id.to_string(),
                        l.product_name.clone(),
                        l.quantity.to_string(),
                        format!("{:.2}", l.unit_price),
                        format!("{:.2}", l.line_total),
                    ]
                })
                .collect();
            self.console
                .table(&["ID", "Product", "Qty", "Unit", "Total"], &rows)?;
        }

        let totals = &invoice.totals;
        self.console
            .say(format!("{:<40} {:>14}", "Subtotal:", money(totals.subtotal)))?;
        if !invoice.discount_percent.is_zero() {
            self.console.say(format!(
                "{:<40} {:>14}",
                format!("Discount ({}%):", invoice.discount_percent),
                format!("-{}", money(totals.discount_amount))
            ))?;
        }
        self.console
            .say(format!("{:<40} {:>14}", "Net:", money(totals.net)))?;
        self.console.say(format!(
            "{:<40} {:>14}",
            format!("VAT ({}%):", invoice.vat_rate_percent),
            money(totals.vat_amount)
        ))?;
        self.console.say(&rule)?;
        self.console
            .say(format!("{:<40} {:>14}", "TOTAL:", money(totals.total)))?;
        self.console.say(&rule)?;
        Ok(())
    }

    async fn edit_order_lines(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- Edit order lines ---")?;
        let order_id = self.console.prompt_int("Order ID: ")?;
        let order = self.services.orders.get_order(order_id).await?;
        if !order.status.allows_line_changes() {
            return Err(ServiceError::InvalidOperation(format!(
                "order {} is {}; lines can only be changed while it is open",
                order.id, order.status
            )));
        }

        let lines = self.services.orders.order_lines(order_id).await?;
        let rows: Vec<Vec<String>> = lines
            .iter()
            .map(|l| {
                vec![
                    l.line_id.to_string(),
                    l.product_name.clone(),
                    l.quantity.to_string(),
                    l.unit_price
                        .map(|p| format!("{:.2}", p))
                        .unwrap_or_else(|| "?".into()),
                ]
            })
            .collect();
        self.console
            .table(&["Line ID", "Product", "Qty", "Unit"], &rows)?;

        self.console.say("1. Add line\n2. Change quantity\n3. Delete line")?;
        match self.console.prompt("Choice (1/2/3): ")?.as_str() {
            "1" => {
                let product_id = self.console.prompt_int("Product ID: ")?;
                let quantity = self.console.prompt_int("Quantity: ")?;
                let line = self
                    .services
                    .orders
                    .add_line(order_id, product_id, quantity)
                    .await?;
                self.console
                    .say(format!("Line {} added.", line.id))?;
            }
            "2" => {
                let line_id = self.console.prompt_int("Line ID: ")?;
                let line = lines
                    .iter()
                    .find(|l| l.line_id == line_id)
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("line {} in order {}", line_id, order_id))
                    })?;
                let quantity = self.console.prompt_int(&format!(
                    "New quantity for '{}' (currently {}): ",
                    line.product_name, line.quantity
                ))?;
                if quantity == 0
                    && !self
                        .console
                        .confirm("Quantity 0 deletes the line. Confirm? (j/n): ")?
                {
                    self.console.say("Cancelled.")?;
                    return Ok(());
                }
                match self
                    .services
                    .orders
                    .change_line_quantity(line_id, quantity)
                    .await?
                {
                    LineChange::Updated { line, previous } => self.console.say(format!(
                        "Quantity changed: {} -> {}",
                        previous, line.quantity
                    ))?,
                    LineChange::Removed { line } => self.console.say(format!(
                        "Line deleted; {} unit(s) back in stock.",
                        line.quantity
                    ))?,
                }
            }
            "3" => {
                let line_id = self.console.prompt_int("Line ID: ")?;
                let line = lines
                    .iter()
                    .find(|l| l.line_id == line_id)
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("line {} in order {}", line_id, order_id))
                    })?;
                if !self.console.confirm(&format!(
                    "Really delete '{}' ({}x)? (j/n): ",
                    line.product_name, line.quantity
                ))? {
                    self.console.say("Cancelled.")?;
                    return Ok(());
                }
                let removed = self.services.orders.remove_line(line_id).await?;
                self.console.say(format!(
                    "Line deleted; {} unit(s) back in stock.",
                    removed.quantity
                ))?;
            }
            _ => self.console.say("Invalid choice.")?,
        }
        Ok(())
    }

    async fn advance_status(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- Advance order status ---")?;
        let order_id = self.console.prompt_int("Order ID: ")?;
        let order = self.services.orders.get_order(order_id).await?;
        self.console
            .say(format!("Current status: {}", order.status.label().to_uppercase()))?;

        let Some(next) = order.status.next() else {
            self.console
                .say("The order is delivered; its status is final.")?;
            return Ok(());
        };
        if !self
            .console
            .confirm(&format!("Change to {}? (j/n): ", next))?
        {
            self.console.say("Cancelled.")?;
            return Ok(());
        }

        let change = self.services.order_status.advance_status(order_id).await?;
        self.console
            .say(format!("Status changed: {} -> {}", change.from, change.to))?;
        if change.to == OrderStatus::Shipped {
            self.console.say("Lines of this order can no longer be changed.")?;
        }
        Ok(())
    }

    async fn change_terms(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- Change discount & VAT ---")?;
        let order_id = self.console.prompt_int("Order ID: ")?;
        let order = self.services.orders.get_order(order_id).await?;
        self.console.say(format!(
            "Current discount: {:.2}% | VAT: {:.2}%",
            order.discount_percent, order.vat_rate_percent
        ))?;

        let update = TermsUpdate {
            discount_percent: self
                .console
                .prompt_optional_decimal("New discount in % (Enter keeps): ")?,
            vat_rate_percent: self
                .console
                .prompt_optional_decimal("New VAT rate in % (Enter keeps): ")?,
        };
        if update.discount_percent.is_none() && update.vat_rate_percent.is_none() {
            self.console.say("Nothing changed.")?;
            return Ok(());
        }
        if !self.console.confirm("Confirm? (j/n): ")? {
            self.console.say("Cancelled.")?;
            return Ok(());
        }

        let change = self.services.orders.update_terms(order_id, update).await?;
        self.console.say(format!(
            "Discount {:.2}% -> {:.2}%, VAT {:.2}% -> {:.2}%",
            change.previous.discount_percent,
            change.current.discount_percent,
            change.previous.vat_rate_percent,
            change.current.vat_rate_percent
        ))?;
        Ok(())
    }

    async fn order_history(&mut self) -> Result<(), ServiceError> {
        let customer_id = self.console.prompt_int("Customer ID: ")?;
        let history = self.services.orders.customer_history(customer_id).await?;
        self.console
            .say(format!("\n--- Order history of {} ---", history.customer.name))?;
        if history.orders.is_empty() {
            self.console.say("No orders yet.")?;
            return Ok(());
        }
        let rows: Vec<Vec<String>> = history
            .orders
            .iter()
            .map(|s| {
                vec![
                    s.order.id.to_string(),
                    s.order.order_date.to_string(),
                    s.order.status.to_string(),
                    s.line_count.to_string(),
                    s.total.map(money).unwrap_or_else(|| "?".into()),
                ]
            })
            .collect();
        self.console
            .table(&["Order", "Date", "Status", "Lines", "Total"], &rows)?;
        Ok(())
    }

    async fn low_stock_report(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- Low-stock report ---")?;
        let rows = self.services.inventory.low_stock_report().await?;
        if rows.is_empty() {
            self.console.say("All stock levels are above their minimum.")?;
            return Ok(());
        }

        self.console
            .say(format!("{} product(s) at or below minimum:", rows.len()))?;
        let table: Vec<Vec<String>> = rows
            .iter()
            .map(|r| {
                vec![
                    r.product_id.to_string(),
                    r.product_name.clone(),
                    r.on_hand.to_string(),
                    r.minimum.to_string(),
                    or_dash(r.supplier_name.clone()),
                    r.lead_time_days
                        .map(|d| format!("{}d", d))
                        .unwrap_or_else(|| "-".into()),
                ]
            })
            .collect();
        self.console.table(
            &["Product ID", "Product", "On hand", "Min", "Supplier", "Lead time"],
            &table,
        )?;

        self.console.say("\n--- Suggested reorders ---")?;
        for row in &rows {
            self.console.say(format!(
                "* {}: {} unit(s) from {} (lead time: {} days)",
                row.product_name,
                row.suggested_quantity(),
                row.supplier_name.as_deref().unwrap_or("unknown supplier"),
                or_dash(row.lead_time_days)
            ))?;
        }
        Ok(())
    }

    async fn correct_stock(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- Stock correction (physical count) ---")?;
        self.list_products().await?;
        let product_id = self.console.prompt_int("Product ID: ")?;
        let product = self.services.products.get_product(product_id).await?;
        self.console.say(format!(
            "Product: {}\nStock on record: {}",
            product.name, product.stock
        ))?;
        let counted = self.console.prompt_int("Counted stock: ")?;

        let correction = self
            .services
            .inventory
            .correct_stock(product_id, counted)
            .await?;
        self.console.say(format!(
            "Stock of '{}' corrected: {} -> {}",
            correction.product_name, correction.previous, correction.current
        ))?;
        Ok(())
    }

    async fn backup(&mut self) -> Result<(), ServiceError> {
        let backup = self
            .backups
            .create_backup(&self.db, BackupKind::Regular)
            .await?;
        self.console
            .say(format!("Backup created: {}", backup.path.display()))?;
        Ok(())
    }

    async fn clean_prices(&mut self) -> Result<(), ServiceError> {
        self.console.say("\n--- Clean up prices ---")?;
        let answer = self
            .console
            .prompt("Dry run? (j = only show, n = apply) [j/n]: ")?
            .to_lowercase();
        let dry_run = answer.is_empty() || answer == "j" || answer == "y";

        let report = self
            .services
            .prices
            .clean_prices(dry_run, &self.backups)
            .await?;
        self.render_cleanup(&report)?;
        Ok(())
    }

    fn render_cleanup(&mut self, report: &CleanupReport) -> Result<(), ServiceError> {
        if report.changes.is_empty() && report.skipped.is_empty() {
            self.console.say("No prices to clean up.")?;
            return Ok(());
        }
        for fix in &report.changes {
            self.console.say(format!(
                "ID {} - {}: '{}' -> {}",
                fix.product_id, fix.product_name, fix.original, fix.cleaned
            ))?;
        }
        for skipped in &report.skipped {
            self.console.say(format!(
                "ID {} - {}: '{}' skipped ({})",
                skipped.product_id, skipped.product_name, skipped.original, skipped.reason
            ))?;
        }
        if let Some(path) = &report.backup {
            self.console
                .say(format!("Database saved as: {}", path.display()))?;
        }
        if report.dry_run {
            self.console
                .say(format!("Dry run: {} price(s) would change.", report.changes.len()))?;
        } else {
            self.console
                .say(format!("{} price(s) cleaned.", report.applied))?;
        }
        Ok(())
    }
}
