//! Payroll seed configuration loading from payroll.toml
//!
//! This module loads the initial payroll parameters and the default
//! contribution rules from a TOML file and seeds the database with them.
//! Seeding is insert-if-missing: existing parameters and rules are never
//! overwritten, so running the bootstrap repeatedly is safe.

use crate::entities::{Contribution, ContributionBase, PayConfig, contribution, pay_config};
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use serde::Deserialize;
use std::path::Path;

/// Structure of the entire payroll.toml file
#[derive(Debug, Deserialize)]
pub struct SeedConfig {
    /// Company-wide payroll parameters
    pub parameters: ParameterSeed,
    /// Contribution rules to seed, listed in display order
    #[serde(default)]
    pub contributions: Vec<ContributionSeed>,
}

/// Seed values for the payroll parameter row
#[derive(Debug, Deserialize, Clone)]
pub struct ParameterSeed {
    /// Standard contractual hours per week
    pub weekly_hours: Decimal,
    /// First overtime tier premium, percentage points
    pub overtime_rate25: Decimal,
    /// Second overtime tier premium, percentage points
    pub overtime_rate50: Decimal,
    /// Income tax rate, 0-100
    pub tax_rate: Decimal,
    /// Professional deduction rate, 0-100
    pub professional_deduction_rate: Decimal,
    /// Paid-leave accrual rate, percentage of gross
    pub leave_accrual_rate: Decimal,
    /// Day of the month salaries are paid, 1-31
    pub payment_day: i32,
}

/// Seed values for one contribution rule
#[derive(Debug, Deserialize, Clone)]
pub struct ContributionSeed {
    /// Unique rule mnemonic
    pub code: String,
    /// Label shown on slips
    pub label: String,
    /// Employee share rate, percentage points
    pub employee_rate: Decimal,
    /// Employer share rate, percentage points
    pub employer_rate: Decimal,
    /// What the rates apply to; defaults to the full gross
    #[serde(default = "default_base")]
    pub base: ContributionBase,
    /// Base cap for capped rules
    #[serde(default)]
    pub cap: Option<Decimal>,
    /// Minimum computed share, if any
    #[serde(default)]
    pub floor: Option<Decimal>,
    /// Maximum computed share, if any
    #[serde(default)]
    pub ceiling: Option<Decimal>,
}

const fn default_base() -> ContributionBase {
    ContributionBase::Gross
}

/// What [`seed_payroll`] ended up doing.
#[derive(Debug, Clone, Copy)]
pub struct SeedOutcome {
    /// Whether the parameter row was created by this run
    pub parameters_created: bool,
    /// How many contribution rules this run added
    pub rules_added: usize,
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_seed_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Configuration {
        message: format!("failed to read seed file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Configuration {
        message: format!("failed to parse payroll.toml: {e}"),
    })
}

/// The built-in seed used when no payroll.toml is present: a 40-hour week
/// with 25%/50% overtime tiers, 11% tax after a 30% professional deduction,
/// and the four standard contribution rules.
#[must_use]
pub fn default_seed() -> SeedConfig {
    SeedConfig {
        parameters: ParameterSeed {
            weekly_hours: dec!(40),
            overtime_rate25: dec!(25),
            overtime_rate50: dec!(50),
            tax_rate: dec!(11),
            professional_deduction_rate: dec!(30),
            leave_accrual_rate: dec!(8.33),
            payment_day: 30,
        },
        contributions: vec![
            flat_rule("CNPS", dec!(2.8), dec!(7.0)),
            flat_rule("CRTV", dec!(1.0), dec!(1.0)),
            flat_rule("CFE", dec!(1.0), dec!(2.0)),
            flat_rule("FAC", dec!(0.0), dec!(2.5)),
        ],
    }
}

fn flat_rule(code: &str, employee_rate: Decimal, employer_rate: Decimal) -> ContributionSeed {
    ContributionSeed {
        code: code.to_string(),
        label: code.to_string(),
        employee_rate,
        employer_rate,
        base: ContributionBase::Gross,
        cap: None,
        floor: None,
        ceiling: None,
    }
}

/// Seeds the payroll parameters and contribution rules, inserting only what
/// is missing. The whole run is one transaction.
pub async fn seed_payroll(db: &DatabaseConnection, seed: &SeedConfig) -> Result<SeedOutcome> {
    validate_seed(seed)?;

    let txn = db.begin().await?;
    let now = chrono::Utc::now();

    let parameters_created = if PayConfig::find().one(&txn).await?.is_none() {
        let p = &seed.parameters;
        pay_config::ActiveModel {
            weekly_hours: Set(p.weekly_hours),
            overtime_rate25: Set(p.overtime_rate25),
            overtime_rate50: Set(p.overtime_rate50),
            tax_rate: Set(p.tax_rate),
            professional_deduction_rate: Set(p.professional_deduction_rate),
            leave_accrual_rate: Set(p.leave_accrual_rate),
            payment_day: Set(p.payment_day),
            updated_at: Set(now),
            updated_by: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        true
    } else {
        false
    };

    let mut rules_added = 0;
    for (position, rule) in seed.contributions.iter().enumerate() {
        let existing = Contribution::find()
            .filter(contribution::Column::Code.eq(rule.code.as_str()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            continue;
        }

        // Display order follows the position in the seed file
        #[allow(clippy::cast_possible_truncation)]
        let display_order = position as i32;
        contribution::ActiveModel {
            code: Set(rule.code.clone()),
            label: Set(rule.label.clone()),
            employee_rate: Set(rule.employee_rate),
            employer_rate: Set(rule.employer_rate),
            base: Set(rule.base),
            cap: Set(rule.cap),
            floor: Set(rule.floor),
            ceiling: Set(rule.ceiling),
            active: Set(true),
            display_order: Set(display_order),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        rules_added += 1;
    }

    txn.commit().await?;
    Ok(SeedOutcome {
        parameters_created,
        rules_added,
    })
}

fn validate_seed(seed: &SeedConfig) -> Result<()> {
    let p = &seed.parameters;
    if p.weekly_hours <= Decimal::ZERO {
        return Err(Error::Configuration {
            message: format!("weekly_hours must be positive, got {}", p.weekly_hours),
        });
    }
    if !(1..=31).contains(&p.payment_day) {
        return Err(Error::Configuration {
            message: format!("payment_day must be between 1 and 31, got {}", p.payment_day),
        });
    }
    for (name, value) in [
        ("overtime_rate25", p.overtime_rate25),
        ("overtime_rate50", p.overtime_rate50),
        ("tax_rate", p.tax_rate),
        ("professional_deduction_rate", p.professional_deduction_rate),
        ("leave_accrual_rate", p.leave_accrual_rate),
    ] {
        if value < Decimal::ZERO || value > dec!(100) {
            return Err(Error::Configuration {
                message: format!("{name} must be between 0 and 100, got {value}"),
            });
        }
    }
    for rule in &seed.contributions {
        if rule.code.trim().is_empty() {
            return Err(Error::Configuration {
                message: "contribution rule code cannot be empty".to_string(),
            });
        }
        if rule.base == ContributionBase::CappedGross && rule.cap.is_none() {
            return Err(Error::Configuration {
                message: format!("rule '{}' uses a capped base but sets no cap", rule.code),
            });
        }
    }
    Ok(())
}
