use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251201_000001_create_base_tables::Migration),
            Box::new(m20251201_000002_add_order_terms_columns::Migration),
            Box::new(m20251201_000003_add_line_item_unit_price::Migration),
            Box::new(m20251201_000004_install_stock_triggers::Migration),
        ]
    }
}

/// Schema identifiers shared by the migrations. The names are those of the
/// existing database files.
mod idens {
    use sea_orm_migration::prelude::*;

    #[derive(DeriveIden)]
    pub enum Customers {
        #[sea_orm(iden = "Kunden")]
        Table,
        #[sea_orm(iden = "KundeID")]
        Id,
        #[sea_orm(iden = "Name")]
        Name,
        #[sea_orm(iden = "Adresse")]
        Address,
    }

    #[derive(DeriveIden)]
    pub enum Suppliers {
        #[sea_orm(iden = "Lieferanten")]
        Table,
        #[sea_orm(iden = "LieferantID")]
        Id,
        #[sea_orm(iden = "Name")]
        Name,
        #[sea_orm(iden = "Kontakt")]
        Contact,
        #[sea_orm(iden = "Lieferzeit")]
        LeadTime,
    }

    #[derive(DeriveIden)]
    pub enum Products {
        #[sea_orm(iden = "Produkte")]
        Table,
        #[sea_orm(iden = "ProduktID")]
        Id,
        #[sea_orm(iden = "Produktname")]
        Name,
        #[sea_orm(iden = "Preis")]
        Price,
    }

    #[derive(DeriveIden, Clone, Copy)]
    pub enum Orders {
        #[sea_orm(iden = "Bestellungen")]
        Table,
        #[sea_orm(iden = "BestellID")]
        Id,
        #[sea_orm(iden = "KundeID")]
        CustomerId,
        #[sea_orm(iden = "Bestelldatum")]
        OrderDate,
        #[sea_orm(iden = "Status")]
        Status,
        #[sea_orm(iden = "Rabatt")]
        Discount,
        #[sea_orm(iden = "Mwst_Satz")]
        VatRate,
    }

    #[derive(DeriveIden, Clone, Copy)]
    pub enum OrderItems {
        #[sea_orm(iden = "Bestellpositionen")]
        Table,
        #[sea_orm(iden = "PositionID")]
        Id,
        #[sea_orm(iden = "BestellID")]
        OrderId,
        #[sea_orm(iden = "ProduktID")]
        ProductId,
        #[sea_orm(iden = "Menge")]
        Quantity,
        #[sea_orm(iden = "Einzelpreis")]
        UnitPrice,
    }

    #[derive(DeriveIden)]
    pub enum StockLevels {
        #[sea_orm(iden = "Lagerbestand")]
        Table,
        #[sea_orm(iden = "LagerID")]
        Id,
        #[sea_orm(iden = "ProduktID")]
        ProductId,
        #[sea_orm(iden = "Menge")]
        Quantity,
        #[sea_orm(iden = "LieferantID")]
        SupplierId,
        #[sea_orm(iden = "Mindestbestand")]
        MinimumQuantity,
    }

    pub const STATUS_VALUES: [&str; 3] = ["offen", "versendet", "geliefert"];
    pub const DEFAULT_STATUS: &str = "offen";
    pub const DEFAULT_DISCOUNT: f64 = 0.0;
    pub const DEFAULT_VAT_RATE: f64 = 19.0;
}

mod m20251201_000001_create_base_tables {
    use super::idens::*;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20251201_000001_create_base_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Every statement is IF NOT EXISTS so files created by older
            // versions keep their tables and rows.
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Customers::Name).text().not_null())
                        .col(ColumnDef::new(Customers::Address).text().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).text().not_null())
                        .col(ColumnDef::new(Suppliers::Contact).text())
                        .col(ColumnDef::new(Suppliers::LeadTime).integer())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Name).text().not_null())
                        .col(ColumnDef::new(Products::Price).double().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).integer().not_null())
                        .col(ColumnDef::new(Orders::OrderDate).date().not_null())
                        .col(
                            ColumnDef::new(Orders::Status)
                                .text()
                                .default(DEFAULT_STATUS)
                                .check(Expr::col(Orders::Status).is_in(STATUS_VALUES)),
                        )
                        .col(
                            ColumnDef::new(Orders::Discount)
                                .double()
                                .default(DEFAULT_DISCOUNT),
                        )
                        .col(
                            ColumnDef::new(Orders::VatRate)
                                .double()
                                .default(DEFAULT_VAT_RATE),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_customer")
                                .from(Orders::Table, Orders::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).integer().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).integer().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(OrderItems::UnitPrice).double())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_product")
                                .from(OrderItems::Table, OrderItems::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockLevels::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockLevels::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockLevels::ProductId).integer().not_null())
                        .col(ColumnDef::new(StockLevels::Quantity).integer().not_null())
                        .col(ColumnDef::new(StockLevels::SupplierId).integer().not_null())
                        .col(
                            ColumnDef::new(StockLevels::MinimumQuantity)
                                .integer()
                                .default(5),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_levels_product")
                                .from(StockLevels::Table, StockLevels::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_levels_supplier")
                                .from(StockLevels::Table, StockLevels::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                OrderItems::Table.into_iden(),
                StockLevels::Table.into_iden(),
                Orders::Table.into_iden(),
                Products::Table.into_iden(),
                Suppliers::Table.into_iden(),
                Customers::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }
}

mod m20251201_000002_add_order_terms_columns {
    use super::idens::*;
    use sea_orm_migration::prelude::*;
    use tracing::info;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20251201_000002_add_order_terms_columns"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let table = Orders::Table.to_string();

            if !manager
                .has_column(&table, Orders::Status.to_string().as_str())
                .await?
            {
                let mut col = ColumnDef::new(Orders::Status);
                col.text().default(DEFAULT_STATUS);
                manager
                    .alter_table(Table::alter().table(Orders::Table).add_column(col).to_owned())
                    .await?;
                info!("Added column {}.Status", table);
            }

            if !manager
                .has_column(&table, Orders::Discount.to_string().as_str())
                .await?
            {
                let mut col = ColumnDef::new(Orders::Discount);
                col.double().default(DEFAULT_DISCOUNT);
                manager
                    .alter_table(Table::alter().table(Orders::Table).add_column(col).to_owned())
                    .await?;
                info!("Added column {}.Rabatt", table);
            }

            if !manager
                .has_column(&table, Orders::VatRate.to_string().as_str())
                .await?
            {
                let mut col = ColumnDef::new(Orders::VatRate);
                col.double().default(DEFAULT_VAT_RATE);
                manager
                    .alter_table(Table::alter().table(Orders::Table).add_column(col).to_owned())
                    .await?;
                info!("Added column {}.Mwst_Satz", table);
            }

            // Rows written before the columns existed may still hold NULL.
            let backfills = [
                (Orders::Status, Expr::value(DEFAULT_STATUS)),
                (Orders::Discount, Expr::value(DEFAULT_DISCOUNT)),
                (Orders::VatRate, Expr::value(DEFAULT_VAT_RATE)),
            ];
            for (column, default) in backfills {
                let update = Query::update()
                    .table(Orders::Table)
                    .value(column, default)
                    .and_where(Expr::col(column).is_null())
                    .to_owned();
                manager.exec_stmt(update).await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for column in [Orders::VatRate, Orders::Discount] {
                if manager
                    .has_column(&Orders::Table.to_string(), column.to_string().as_str())
                    .await?
                {
                    manager
                        .alter_table(
                            Table::alter()
                                .table(Orders::Table)
                                .drop_column(column)
                                .to_owned(),
                        )
                        .await?;
                }
            }
            // Status belongs to the base table and stays.
            Ok(())
        }
    }
}

mod m20251201_000003_add_line_item_unit_price {
    use super::idens::*;
    use sea_orm::ConnectionTrait;
    use sea_orm_migration::prelude::*;
    use tracing::info;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20251201_000003_add_line_item_unit_price"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            if !manager
                .has_column(
                    &OrderItems::Table.to_string(),
                    OrderItems::UnitPrice.to_string().as_str(),
                )
                .await?
            {
                let mut col = ColumnDef::new(OrderItems::UnitPrice);
                col.double().null();
                manager
                    .alter_table(
                        Table::alter()
                            .table(OrderItems::Table)
                            .add_column(col)
                            .to_owned(),
                    )
                    .await?;
                info!("Added column Bestellpositionen.Einzelpreis");
            }

            // Snapshot the current price for lines that have none. Prices
            // still stored as text are left for the price cleanup.
            manager
                .get_connection()
                .execute_unprepared(
                    "UPDATE Bestellpositionen \
                     SET Einzelpreis = (SELECT P.Preis FROM Produkte P WHERE P.ProduktID = Bestellpositionen.ProduktID) \
                     WHERE Einzelpreis IS NULL \
                     AND (SELECT typeof(P.Preis) FROM Produkte P WHERE P.ProduktID = Bestellpositionen.ProduktID) IN ('real', 'integer')",
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            if manager
                .has_column(
                    &OrderItems::Table.to_string(),
                    OrderItems::UnitPrice.to_string().as_str(),
                )
                .await?
            {
                manager
                    .alter_table(
                        Table::alter()
                            .table(OrderItems::Table)
                            .drop_column(OrderItems::UnitPrice)
                            .to_owned(),
                    )
                    .await?;
            }
            Ok(())
        }
    }
}

mod m20251201_000004_install_stock_triggers {
    use crate::errors::{QUANTITY_GUARD_MESSAGE, STOCK_GUARD_MESSAGE};
    use sea_orm::ConnectionTrait;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20251201_000004_install_stock_triggers"
        }
    }

    /// Triggers written by earlier versions. They adjusted every stock row
    /// of a product and had no guard, so they are replaced.
    const LEGACY_TRIGGERS: [&str; 3] = [
        "nach_bestellung_abziehen",
        "nach_menge_aenderung_gutschreiben",
        "nach_menge_reduktion_gutschreiben",
    ];

    pub const TRIGGERS: [&str; 5] = [
        "stock_guard_position_insert",
        "stock_deduct_position_insert",
        "stock_guard_position_update",
        "stock_adjust_position_update",
        "stock_release_position_delete",
    ];

    /// The stock row a product's quantity is read from and written to.
    const STOCK_ROW: &str =
        "(SELECT L.LagerID FROM Lagerbestand L WHERE L.ProduktID = {product} ORDER BY L.LagerID LIMIT 1)";
    const STOCK_ON_HAND: &str =
        "COALESCE((SELECT L.Menge FROM Lagerbestand L WHERE L.ProduktID = {product} ORDER BY L.LagerID LIMIT 1), 0)";

    fn stock_row(product: &str) -> String {
        STOCK_ROW.replace("{product}", product)
    }

    fn stock_on_hand(product: &str) -> String {
        STOCK_ON_HAND.replace("{product}", product)
    }

    pub fn trigger_sql() -> Vec<String> {
        vec![
            format!(
                "CREATE TRIGGER IF NOT EXISTS stock_guard_position_insert
                BEFORE INSERT ON Bestellpositionen
                FOR EACH ROW
                BEGIN
                    SELECT RAISE(ABORT, '{quantity_guard}') WHERE NEW.Menge <= 0;
                    SELECT RAISE(ABORT, '{stock_guard}') WHERE NEW.Menge > {on_hand};
                END;",
                quantity_guard = QUANTITY_GUARD_MESSAGE,
                stock_guard = STOCK_GUARD_MESSAGE,
                on_hand = stock_on_hand("NEW.ProduktID"),
            ),
            format!(
                "CREATE TRIGGER IF NOT EXISTS stock_deduct_position_insert
                AFTER INSERT ON Bestellpositionen
                FOR EACH ROW
                BEGIN
                    UPDATE Lagerbestand SET Menge = Menge - NEW.Menge
                    WHERE LagerID = {row};
                END;",
                row = stock_row("NEW.ProduktID"),
            ),
            format!(
                "CREATE TRIGGER IF NOT EXISTS stock_guard_position_update
                BEFORE UPDATE OF Menge ON Bestellpositionen
                FOR EACH ROW
                BEGIN
                    SELECT RAISE(ABORT, '{quantity_guard}') WHERE NEW.Menge <= 0;
                    SELECT RAISE(ABORT, '{stock_guard}') WHERE NEW.Menge - OLD.Menge > {on_hand};
                END;",
                quantity_guard = QUANTITY_GUARD_MESSAGE,
                stock_guard = STOCK_GUARD_MESSAGE,
                on_hand = stock_on_hand("NEW.ProduktID"),
            ),
            format!(
                "CREATE TRIGGER IF NOT EXISTS stock_adjust_position_update
                AFTER UPDATE OF Menge ON Bestellpositionen
                FOR EACH ROW
                WHEN NEW.Menge <> OLD.Menge
                BEGIN
                    UPDATE Lagerbestand SET Menge = Menge - (NEW.Menge - OLD.Menge)
                    WHERE LagerID = {row};
                END;",
                row = stock_row("NEW.ProduktID"),
            ),
            format!(
                "CREATE TRIGGER IF NOT EXISTS stock_release_position_delete
                AFTER DELETE ON Bestellpositionen
                FOR EACH ROW
                BEGIN
                    UPDATE Lagerbestand SET Menge = Menge + OLD.Menge
                    WHERE LagerID = {row};
                END;",
                row = stock_row("OLD.ProduktID"),
            ),
        ]
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let db = manager.get_connection();
            for name in LEGACY_TRIGGERS {
                db.execute_unprepared(&format!("DROP TRIGGER IF EXISTS {}", name))
                    .await?;
            }
            for sql in trigger_sql() {
                db.execute_unprepared(&sql).await?;
            }
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let db = manager.get_connection();
            for name in TRIGGERS {
                db.execute_unprepared(&format!("DROP TRIGGER IF EXISTS {}", name))
                    .await?;
            }
            Ok(())
        }
    }

}

pub use m20251201_000004_install_stock_triggers::TRIGGERS as STOCK_TRIGGERS;
