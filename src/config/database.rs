//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! It provides functions for establishing database connections and creating all necessary tables
//! based on the entity definitions. The module uses `SeaORM`'s `Schema::create_table_from_entity`
//! method to automatically generate SQL statements from the entity models, ensuring that the
//! database schema matches the Rust struct definitions without requiring manual SQL. The
//! uniqueness of one pay slip per employee and period is enforced here with a dedicated
//! unique index, created alongside the tables.

use crate::entities::{
    Advance, Contribution, Employee, LineItem, PayConfig, PaySlip, Repayment, SlipHistory,
    pay_slip,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from the environment or returns the default
/// `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/payroll.sqlite".to_string())
}

/// Establishes a connection to the database selected by `DATABASE_URL`.
///
/// Falls back to a default local `SQLite` file if no environment variable is
/// set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all tables and indexes from the entity definitions.
///
/// Safe to call on an existing database: every statement is issued with
/// `IF NOT EXISTS`. The unique index on (`employee_id`, `month`, `year`)
/// is the serialization point for duplicate slip creation.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        schema.create_table_from_entity(Employee),
        schema.create_table_from_entity(PayConfig),
        schema.create_table_from_entity(Contribution),
        schema.create_table_from_entity(Advance),
        schema.create_table_from_entity(PaySlip),
        schema.create_table_from_entity(LineItem),
        schema.create_table_from_entity(Repayment),
        schema.create_table_from_entity(SlipHistory),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    let slip_period_index = Index::create()
        .name("idx_pay_slips_employee_period")
        .table(PaySlip)
        .col(pay_slip::Column::EmployeeId)
        .col(pay_slip::Column::Month)
        .col(pay_slip::Column::Year)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&slip_period_index)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        employee::Model as EmployeeModel, line_item::Model as LineItemModel,
        pay_slip::Model as PaySlipModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_connection() -> Result<()> {
        // Use in-memory database for testing to avoid clashing with a real file
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<EmployeeModel> = Employee::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Tables exist if querying them succeeds
        let _: Vec<EmployeeModel> = Employee::find().limit(1).all(&db).await?;
        let _: Vec<PaySlipModel> = PaySlip::find().limit(1).all(&db).await?;
        let _: Vec<LineItemModel> = LineItem::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_rerunnable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
