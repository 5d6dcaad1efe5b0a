//! Line item construction - the algorithmic heart of the payroll engine.
//!
//! [`build_line_items`] is a pure function: no database access, no clock, no
//! randomness. Given the slip inputs, the payroll parameters, the active
//! contribution rules and the employee's due advances, it derives the full
//! ordered list of line items plus every aggregate the slip stores. The
//! position of an item in the returned list is its display order; there is
//! no separately managed order counter. Internal arithmetic is
//! full-precision decimal throughout, rounding happens only at display time.

use crate::{
    entities::{ContributionBase, ItemCategory, ItemKind, contribution, pay_config},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const WEEKS_PER_YEAR: Decimal = dec!(52);
const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// Worked-time and variable-pay figures for one employee in one period.
#[derive(Debug, Clone)]
pub struct SlipInputs {
    /// Contractual monthly base salary
    pub base_salary: Decimal,
    /// Days actually worked, may be fractional
    pub worked_days: Decimal,
    /// Working days in the period, the pro-rata denominator
    pub standard_days: i32,
    /// Overtime hours worked
    pub overtime_hours: Decimal,
    /// Bonus amount
    pub bonuses: Decimal,
    /// Allowances
    pub allowances: Decimal,
    /// Benefits in kind
    pub benefits_in_kind: Decimal,
    /// Miscellaneous deductions
    pub misc_deductions: Decimal,
}

/// One advance due for repayment, as the builder sees it.
#[derive(Debug, Clone)]
pub struct DueAdvance {
    /// The advance being repaid
    pub advance_id: i64,
    /// Scheduled per-period repayment
    pub installment_amount: Decimal,
    /// Balance still owed before this slip
    pub outstanding: Decimal,
}

/// One computed line before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedItem {
    /// Short mnemonic (e.g. `"SAL_BASE"`)
    pub code: String,
    /// Label shown on the slip
    pub label: String,
    /// Which step produced the item
    pub category: ItemCategory,
    /// Gain or deduction
    pub kind: ItemKind,
    /// Base a rate was applied to, where meaningful
    pub base: Option<Decimal>,
    /// Rate in percentage points, where meaningful
    pub rate: Option<Decimal>,
    /// Quantity (days, hours), where meaningful
    pub quantity: Option<Decimal>,
    /// Monetary effect, non-negative
    pub amount: Decimal,
    /// Employee share for contribution items
    pub employee_share: Option<Decimal>,
    /// Employer share for contribution items
    pub employer_share: Option<Decimal>,
}

// Line items are only ever built through these constructors, one per
// category, so a malformed field combination cannot be assembled.
impl ComputedItem {
    fn base_salary(base: Decimal, worked_days: Decimal, amount: Decimal) -> Self {
        Self {
            code: "SAL_BASE".to_string(),
            label: "Base salary".to_string(),
            category: ItemCategory::Salary,
            kind: ItemKind::Gain,
            base: Some(base),
            rate: None,
            quantity: Some(worked_days),
            amount,
            employee_share: None,
            employer_share: None,
        }
    }

    fn overtime(
        hourly_rate: Decimal,
        premium_rate: Decimal,
        hours: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            code: "HEURES_SUP".to_string(),
            label: "Overtime".to_string(),
            category: ItemCategory::Salary,
            kind: ItemKind::Gain,
            base: Some(hourly_rate),
            rate: Some(premium_rate),
            quantity: Some(hours),
            amount,
            employee_share: None,
            employer_share: None,
        }
    }

    fn variable_gain(category: ItemCategory, code: &str, label: &str, amount: Decimal) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
            category,
            kind: ItemKind::Gain,
            base: None,
            rate: None,
            quantity: None,
            amount,
            employee_share: None,
            employer_share: None,
        }
    }

    fn contribution(
        rule: &contribution::Model,
        base: Decimal,
        employee: Decimal,
        employer: Decimal,
    ) -> Self {
        Self {
            code: format!("{}_SAL", rule.code),
            label: format!("{} (employee share)", rule.label),
            category: ItemCategory::Contribution,
            kind: ItemKind::Deduction,
            base: Some(base),
            rate: Some(rule.employee_rate),
            quantity: None,
            amount: employee,
            employee_share: Some(employee),
            employer_share: Some(employer),
        }
    }

    fn misc_deductions(amount: Decimal) -> Self {
        Self {
            code: "RETENUES".to_string(),
            label: "Miscellaneous deductions".to_string(),
            category: ItemCategory::Other,
            kind: ItemKind::Deduction,
            base: None,
            rate: None,
            quantity: None,
            amount,
            employee_share: None,
            employer_share: None,
        }
    }

    fn tax(taxable_after_deduction: Decimal, rate: Decimal, amount: Decimal) -> Self {
        Self {
            code: "IMPOT".to_string(),
            label: "Income tax".to_string(),
            category: ItemCategory::Tax,
            kind: ItemKind::Deduction,
            base: Some(taxable_after_deduction),
            rate: Some(rate),
            quantity: None,
            amount,
            employee_share: None,
            employer_share: None,
        }
    }

    fn advance_repayment(advance_id: i64, amount: Decimal) -> Self {
        Self {
            code: format!("REMBOURS_{advance_id}"),
            label: format!("Advance repayment #{advance_id}"),
            category: ItemCategory::AdvanceRepayment,
            kind: ItemKind::Deduction,
            base: None,
            rate: None,
            quantity: None,
            amount,
            employee_share: None,
            employer_share: None,
        }
    }
}

/// A repayment the calculator must record against an advance.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedRepayment {
    /// The advance the repayment belongs to
    pub advance_id: i64,
    /// Amount repaid on this slip
    pub amount: Decimal,
}

/// Everything one run of the builder derives from one set of inputs.
#[derive(Debug, Clone)]
pub struct ComputedSlip {
    /// The ordered line items
    pub items: Vec<ComputedItem>,
    /// Repayments to record against advances, in item order
    pub repayments: Vec<ComputedRepayment>,
    /// Sum of all gain items
    pub gross: Decimal,
    /// Total employee-side contributions
    pub employee_contributions: Decimal,
    /// Total employer-side contributions
    pub employer_contributions: Decimal,
    /// Gross minus employee contributions, floored at zero
    pub taxable_base: Decimal,
    /// Income tax
    pub tax: Decimal,
    /// Gross minus all deductions
    pub net: Decimal,
    /// Paid-leave provision accrued this period
    pub leave_accrual: Decimal,
}

/// Derives the full line item set and aggregates for one pay slip.
///
/// The fixed sequence is: pro-rated base salary, overtime, bonuses,
/// allowances, benefits in kind, one deduction per contribution rule,
/// miscellaneous deductions, income tax, one repayment per due advance.
/// Zero-amount items are suppressed; the base salary item alone is always
/// present. Contribution rules are processed in the order given, so callers
/// load them sorted by display order. Employer shares accumulate into the
/// employer total even when the employee share is zero and no item is
/// emitted.
///
/// # Errors
/// `Configuration` when `standard_days` is below 1, `weekly_hours` is not
/// positive while overtime is present, or a capped rule lacks its cap.
/// `InvalidAmount` when any monetary or quantity input is negative.
pub fn build_line_items(
    inputs: &SlipInputs,
    config: &pay_config::Model,
    rules: &[contribution::Model],
    advances: &[DueAdvance],
) -> Result<ComputedSlip> {
    validate_inputs(inputs)?;

    let mut items = Vec::new();

    // 1. Base salary, pro-rated by days actually worked
    let prorated_base =
        inputs.base_salary * inputs.worked_days / Decimal::from(inputs.standard_days);
    items.push(ComputedItem::base_salary(
        inputs.base_salary,
        inputs.worked_days,
        prorated_base,
    ));
    let mut gross = prorated_base;

    // 2. Overtime at the first tier premium
    if inputs.overtime_hours > Decimal::ZERO {
        let monthly_hours = config.weekly_hours * WEEKS_PER_YEAR / MONTHS_PER_YEAR;
        if monthly_hours <= Decimal::ZERO {
            return Err(Error::Configuration {
                message: format!("weekly hours must be positive, got {}", config.weekly_hours),
            });
        }
        let hourly_rate = inputs.base_salary / monthly_hours;
        let amount =
            inputs.overtime_hours * hourly_rate * (Decimal::ONE + config.overtime_rate25 / PERCENT);
        items.push(ComputedItem::overtime(
            hourly_rate,
            config.overtime_rate25,
            inputs.overtime_hours,
            amount,
        ));
        gross += amount;
    }

    // 3. Variable gains, suppressed when zero
    for (category, code, label, amount) in [
        (ItemCategory::Bonus, "PRIMES", "Bonuses", inputs.bonuses),
        (
            ItemCategory::Allowance,
            "INDEMNITES",
            "Allowances",
            inputs.allowances,
        ),
        (
            ItemCategory::Benefit,
            "AVANTAGES",
            "Benefits in kind",
            inputs.benefits_in_kind,
        ),
    ] {
        if amount > Decimal::ZERO {
            items.push(ComputedItem::variable_gain(category, code, label, amount));
            gross += amount;
        }
    }

    // 4. Contributions in the given (display) order
    let mut employee_contributions = Decimal::ZERO;
    let mut employer_contributions = Decimal::ZERO;
    for rule in rules {
        let base = match rule.base {
            ContributionBase::Gross => gross,
            ContributionBase::CappedGross => {
                let cap = rule.cap.ok_or_else(|| Error::Configuration {
                    message: format!("rule '{}' uses a capped base but sets no cap", rule.code),
                })?;
                gross.min(cap)
            }
            // Rules whose base the engine cannot derive are inert here
            ContributionBase::Other => continue,
        };
        let employee = share(base, rule.employee_rate, rule.floor, rule.ceiling);
        let employer = share(base, rule.employer_rate, rule.floor, rule.ceiling);
        employee_contributions += employee;
        employer_contributions += employer;
        if employee > Decimal::ZERO {
            items.push(ComputedItem::contribution(rule, base, employee, employer));
        }
    }

    // 5. Miscellaneous deductions
    if inputs.misc_deductions > Decimal::ZERO {
        items.push(ComputedItem::misc_deductions(inputs.misc_deductions));
    }

    // 6. Income tax on the abated taxable base
    let taxable_base = (gross - employee_contributions).max(Decimal::ZERO);
    let taxable_after_deduction =
        taxable_base * (Decimal::ONE - config.professional_deduction_rate / PERCENT);
    let tax = taxable_after_deduction * config.tax_rate / PERCENT;
    if tax > Decimal::ZERO {
        items.push(ComputedItem::tax(
            taxable_after_deduction,
            config.tax_rate,
            tax,
        ));
    }

    // 7. Advance repayments, capped at the outstanding balance
    let mut repayments = Vec::new();
    let mut repayment_total = Decimal::ZERO;
    for advance in advances {
        let due = advance.installment_amount.min(advance.outstanding);
        if due <= Decimal::ZERO {
            continue;
        }
        items.push(ComputedItem::advance_repayment(advance.advance_id, due));
        repayments.push(ComputedRepayment {
            advance_id: advance.advance_id,
            amount: due,
        });
        repayment_total += due;
    }

    let net = gross - employee_contributions - tax - inputs.misc_deductions - repayment_total;
    let leave_accrual = gross * config.leave_accrual_rate / PERCENT;

    Ok(ComputedSlip {
        items,
        repayments,
        gross,
        employee_contributions,
        employer_contributions,
        taxable_base,
        tax,
        net,
        leave_accrual,
    })
}

/// Applies a rate to a base and clamps the result. A zero rate yields a
/// zero share; floors never turn a rate-free share into a charge.
fn share(
    base: Decimal,
    rate: Decimal,
    floor: Option<Decimal>,
    ceiling: Option<Decimal>,
) -> Decimal {
    if rate <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut amount = base * rate / PERCENT;
    if let Some(floor) = floor {
        amount = amount.max(floor);
    }
    if let Some(ceiling) = ceiling {
        amount = amount.min(ceiling);
    }
    amount
}

pub(crate) fn validate_inputs(inputs: &SlipInputs) -> Result<()> {
    if inputs.standard_days < 1 {
        return Err(Error::Configuration {
            message: format!(
                "standard days must be at least 1, got {}",
                inputs.standard_days
            ),
        });
    }
    for amount in [
        inputs.base_salary,
        inputs.worked_days,
        inputs.overtime_hours,
        inputs.bonuses,
        inputs.allowances,
        inputs.benefits_in_kind,
        inputs.misc_deductions,
    ] {
        if amount < Decimal::ZERO {
            return Err(Error::InvalidAmount { amount });
        }
    }
    Ok(())
}
