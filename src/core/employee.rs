//! Minimal employee registry.
//!
//! The engine mostly reads employees; creation exists so the system is
//! operable end to end without an external HR feed.

use crate::{
    entities::{Employee, EmployeeColumn, employee},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter,
};
use tracing::info;

/// Details for a new employee record.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    /// Unique staff number
    pub staff_no: String,
    /// Family name, also feeds the slip number prefix
    pub last_name: String,
    /// Given name
    pub first_name: String,
    /// Contact address for notifications
    pub email: Option<String>,
    /// Contractual monthly base salary
    pub base_salary: Decimal,
}

/// Registers an employee. New employees start active.
///
/// # Errors
/// Returns `Error::Configuration` for blank identifying fields or a staff
/// number already in use, `Error::InvalidAmount` for a negative salary.
pub async fn create_employee(
    db: &DatabaseConnection,
    new: NewEmployee,
) -> Result<employee::Model> {
    let staff_no = new.staff_no.trim().to_string();
    let last_name = new.last_name.trim().to_string();
    let first_name = new.first_name.trim().to_string();
    for (field, value) in [
        ("staff_no", &staff_no),
        ("last_name", &last_name),
        ("first_name", &first_name),
    ] {
        if value.is_empty() {
            return Err(Error::Configuration {
                message: format!("{field} cannot be empty"),
            });
        }
    }
    if new.base_salary < Decimal::ZERO {
        return Err(Error::InvalidAmount {
            amount: new.base_salary,
        });
    }
    if get_employee_by_staff_no(db, &staff_no).await?.is_some() {
        return Err(Error::Configuration {
            message: format!("staff number '{staff_no}' is already in use"),
        });
    }

    let created = employee::ActiveModel {
        staff_no: Set(staff_no),
        last_name: Set(last_name),
        first_name: Set(first_name),
        email: Set(new.email),
        base_salary: Set(new.base_salary),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(employee_id = created.id, staff_no = %created.staff_no, "employee created");
    Ok(created)
}

/// Fetches an employee by id.
///
/// # Errors
/// Returns `Error::EmployeeNotFound` for an unknown id.
pub async fn get_employee<C: ConnectionTrait>(db: &C, id: i64) -> Result<employee::Model> {
    Employee::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::EmployeeNotFound { id })
}

/// Looks an employee up by staff number.
pub async fn get_employee_by_staff_no<C: ConnectionTrait>(
    db: &C,
    staff_no: &str,
) -> Result<Option<employee::Model>> {
    Employee::find()
        .filter(EmployeeColumn::StaffNo.eq(staff_no))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;
    use rust_decimal_macros::dec;

    fn new_employee(staff_no: &str) -> NewEmployee {
        NewEmployee {
            staff_no: staff_no.to_string(),
            last_name: "Mbarga".to_string(),
            first_name: "Alice".to_string(),
            email: Some("alice@example.test".to_string()),
            base_salary: dec!(500000),
        }
    }

    #[tokio::test]
    async fn test_create_employee_roundtrip() {
        let db = setup_test_db().await.unwrap();

        let created = create_employee(&db, new_employee("EMP001")).await.unwrap();
        assert!(created.is_active);
        assert_eq!(created.base_salary, dec!(500000));

        let fetched = get_employee(&db, created.id).await.unwrap();
        assert_eq!(fetched.staff_no, "EMP001");
        assert_eq!(fetched.last_name, "Mbarga");
    }

    #[tokio::test]
    async fn test_create_employee_trims_fields() {
        let db = setup_test_db().await.unwrap();
        let mut new = new_employee("EMP001");
        new.staff_no = "  EMP001 ".to_string();
        new.last_name = " Mbarga ".to_string();

        let created = create_employee(&db, new).await.unwrap();
        assert_eq!(created.staff_no, "EMP001");
        assert_eq!(created.last_name, "Mbarga");
    }

    #[tokio::test]
    async fn test_blank_staff_no_rejected() {
        let db = setup_test_db().await.unwrap();
        let mut new = new_employee("EMP001");
        new.staff_no = "   ".to_string();

        let result = create_employee(&db, new).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Configuration { message: _ }
        ));
    }

    #[tokio::test]
    async fn test_duplicate_staff_no_rejected() {
        let db = setup_test_db().await.unwrap();
        create_employee(&db, new_employee("EMP001")).await.unwrap();

        let result = create_employee(&db, new_employee("EMP001")).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Configuration { message: _ }
        ));
    }

    #[tokio::test]
    async fn test_negative_salary_rejected() {
        let db = setup_test_db().await.unwrap();
        let mut new = new_employee("EMP001");
        new.base_salary = dec!(-1);

        let result = create_employee(&db, new).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));
    }

    #[tokio::test]
    async fn test_get_missing_employee() {
        let db = setup_test_db().await.unwrap();

        let result = get_employee(&db, 99).await;
        assert!(matches!(result.unwrap_err(), Error::EmployeeNotFound { id: 99 }));
    }

    #[tokio::test]
    async fn test_lookup_by_staff_no() {
        let db = setup_test_db().await.unwrap();
        create_employee(&db, new_employee("EMP001")).await.unwrap();

        let found = get_employee_by_staff_no(&db, "EMP001").await.unwrap();
        assert!(found.is_some());
        let missing = get_employee_by_staff_no(&db, "EMP999").await.unwrap();
        assert!(missing.is_none());
    }
}
