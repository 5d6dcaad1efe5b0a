//! Reading and updating the payroll parameters.
//!
//! Parameters live in a single row; changing one takes effect for every
//! calculation that runs afterwards. Slips that were already calculated
//! keep their persisted figures until they are recalculated.

use crate::{
    entities::{PayConfig, pay_config},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel,
};
use tracing::info;

/// A partial update to the payroll parameters. `None` fields keep their
/// current value.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    /// Standard weekly working hours
    pub weekly_hours: Option<Decimal>,
    /// First-tier overtime premium in percent
    pub overtime_rate25: Option<Decimal>,
    /// Second-tier overtime premium in percent
    pub overtime_rate50: Option<Decimal>,
    /// Income tax rate in percent
    pub tax_rate: Option<Decimal>,
    /// Professional deduction rate in percent
    pub professional_deduction_rate: Option<Decimal>,
    /// Paid-leave accrual rate in percent
    pub leave_accrual_rate: Option<Decimal>,
    /// Day of month salaries are paid
    pub payment_day: Option<i32>,
}

/// Fetches the payroll parameters.
///
/// # Errors
/// Returns `Error::Configuration` if the parameters have not been seeded.
pub async fn active_config<C: ConnectionTrait>(db: &C) -> Result<pay_config::Model> {
    PayConfig::find().one(db).await?.ok_or_else(|| Error::Configuration {
        message: "payroll parameters have not been seeded".to_string(),
    })
}

/// Applies a partial update to the payroll parameters and stamps who made
/// the change.
pub async fn update_config(
    db: &DatabaseConnection,
    patch: ConfigPatch,
    updated_by: Option<i64>,
) -> Result<pay_config::Model> {
    validate_patch(&patch)?;
    let ConfigPatch {
        weekly_hours,
        overtime_rate25,
        overtime_rate50,
        tax_rate,
        professional_deduction_rate,
        leave_accrual_rate,
        payment_day,
    } = patch;

    let mut model = active_config(db).await?.into_active_model();
    if let Some(hours) = weekly_hours {
        model.weekly_hours = Set(hours);
    }
    if let Some(rate) = overtime_rate25 {
        model.overtime_rate25 = Set(rate);
    }
    if let Some(rate) = overtime_rate50 {
        model.overtime_rate50 = Set(rate);
    }
    if let Some(rate) = tax_rate {
        model.tax_rate = Set(rate);
    }
    if let Some(rate) = professional_deduction_rate {
        model.professional_deduction_rate = Set(rate);
    }
    if let Some(rate) = leave_accrual_rate {
        model.leave_accrual_rate = Set(rate);
    }
    if let Some(day) = payment_day {
        model.payment_day = Set(day);
    }
    model.updated_at = Set(Utc::now());
    model.updated_by = Set(updated_by);

    let updated = model.update(db).await?;
    info!(updated_by, "payroll parameters updated");
    Ok(updated)
}

fn validate_patch(patch: &ConfigPatch) -> Result<()> {
    if let Some(weekly_hours) = patch.weekly_hours {
        if weekly_hours <= Decimal::ZERO {
            return Err(Error::Configuration {
                message: format!("weekly_hours must be positive, got {weekly_hours}"),
            });
        }
    }
    if let Some(payment_day) = patch.payment_day {
        if !(1..=31).contains(&payment_day) {
            return Err(Error::Configuration {
                message: format!("payment_day must be between 1 and 31, got {payment_day}"),
            });
        }
    }
    for (name, value) in [
        ("overtime_rate25", patch.overtime_rate25),
        ("overtime_rate50", patch.overtime_rate50),
        ("tax_rate", patch.tax_rate),
        (
            "professional_deduction_rate",
            patch.professional_deduction_rate,
        ),
        ("leave_accrual_rate", patch.leave_accrual_rate),
    ] {
        if let Some(value) = value {
            if value < Decimal::ZERO || value > dec!(100) {
                return Err(Error::Configuration {
                    message: format!("{name} must be between 0 and 100, got {value}"),
                });
            }
        }
    }
    Ok(())
}
