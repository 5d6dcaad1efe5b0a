//! Period reporting and display formatting.
//!
//! Aggregation reads persisted slip totals; nothing here recalculates.
//! This module is also the single place amounts get rounded, everything
//! upstream carries full precision.

use crate::{
    core::advance,
    entities::{
        Advance, AdvanceColumn, AdvanceStatus, PaySlip, PaySlipColumn, SlipStatus, pay_slip,
    },
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::fmt::Write;

/// Aggregates across every slip of one payroll period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodSummary {
    /// Period month, 1-12
    pub month: i32,
    /// Period year
    pub year: i32,
    /// Slips opened for the period
    pub slip_count: usize,
    /// Of which still draft
    pub draft_count: usize,
    /// Of which validated, awaiting payment
    pub validated_count: usize,
    /// Of which paid out
    pub paid_count: usize,
    /// Sum of slip gross amounts
    pub total_gross: Decimal,
    /// Sum of slip net amounts
    pub total_net: Decimal,
    /// Sum of employee-side contributions
    pub total_employee_contributions: Decimal,
    /// Sum of employer-side contributions
    pub total_employer_contributions: Decimal,
    /// Sum of income tax withheld
    pub total_tax: Decimal,
    /// Company-wide outstanding advance balance, derived
    pub outstanding_advances: Decimal,
}

/// Aggregates one period: counts by status, summed totals, and the derived
/// outstanding advance exposure across all employees.
pub async fn period_summary(
    db: &DatabaseConnection,
    month: i32,
    year: i32,
) -> Result<PeriodSummary> {
    let mut summary = PeriodSummary {
        month,
        year,
        ..PeriodSummary::default()
    };

    for slip in list_slips_for_period(db, month, year).await? {
        summary.slip_count += 1;
        match slip.status {
            SlipStatus::Draft => summary.draft_count += 1,
            SlipStatus::Validated => summary.validated_count += 1,
            SlipStatus::Paid => summary.paid_count += 1,
        }
        summary.total_gross += slip.gross;
        summary.total_net += slip.net;
        summary.total_employee_contributions += slip.employee_contributions;
        summary.total_employer_contributions += slip.employer_contributions;
        summary.total_tax += slip.tax;
    }

    let open_advances = Advance::find()
        .filter(AdvanceColumn::Status.is_in([AdvanceStatus::Granted, AdvanceStatus::Disbursed]))
        .all(db)
        .await?;
    for open in &open_advances {
        summary.outstanding_advances += advance::outstanding_balance(db, open).await?;
    }

    Ok(summary)
}

/// Lists the slips of one period in creation order.
pub async fn list_slips_for_period(
    db: &DatabaseConnection,
    month: i32,
    year: i32,
) -> Result<Vec<pay_slip::Model>> {
    PaySlip::find()
        .filter(PaySlipColumn::Month.eq(month))
        .filter(PaySlipColumn::Year.eq(year))
        .order_by_asc(PaySlipColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists every slip of one employee, most recent period first.
pub async fn list_slips_for_employee(
    db: &DatabaseConnection,
    employee_id: i64,
) -> Result<Vec<pay_slip::Model>> {
    PaySlip::find()
        .filter(PaySlipColumn::EmployeeId.eq(employee_id))
        .order_by_desc(PaySlipColumn::Year)
        .order_by_desc(PaySlipColumn::Month)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Renders an amount with exactly two decimals. The sole rounding point of
/// the engine.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{amount:.2}")
}

/// Renders a period summary as a plain-text block.
#[must_use]
pub fn format_period_summary(summary: &PeriodSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Payroll period {:02}/{}",
        summary.month, summary.year
    );
    let _ = writeln!(
        output,
        "Slips: {} ({} draft, {} validated, {} paid)",
        summary.slip_count, summary.draft_count, summary.validated_count, summary.paid_count
    );
    let _ = writeln!(output, "Gross total: {}", format_amount(summary.total_gross));
    let _ = writeln!(output, "Net total: {}", format_amount(summary.total_net));
    let _ = writeln!(
        output,
        "Employee contributions: {}",
        format_amount(summary.total_employee_contributions)
    );
    let _ = writeln!(
        output,
        "Employer contributions: {}",
        format_amount(summary.total_employer_contributions)
    );
    let _ = writeln!(output, "Income tax: {}", format_amount(summary.total_tax));
    let _ = writeln!(
        output,
        "Outstanding advances: {}",
        format_amount(summary.outstanding_advances)
    );
    output
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::slip::{calculate_slip, validate_slip},
        test_utils::{
            RecordingNotifier, create_test_employee, draft_slip_for, granted_advance,
            setup_payroll,
        },
    };
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_period_summary_empty_period() {
        let (db, _) = setup_payroll().await.unwrap();

        let summary = period_summary(&db, 3, 2026).await.unwrap();

        assert_eq!(summary.slip_count, 0);
        assert_eq!(summary.total_gross, Decimal::ZERO);
        assert_eq!(summary.outstanding_advances, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_period_summary_aggregates() {
        let (db, first) = setup_payroll().await.unwrap();
        let second = create_test_employee(&db, "Essomba").await.unwrap();

        let slip_one = draft_slip_for(&db, first.id, 3, 2026).await.unwrap();
        calculate_slip(&db, slip_one.id).await.unwrap();
        let slip_two = draft_slip_for(&db, second.id, 3, 2026).await.unwrap();
        calculate_slip(&db, slip_two.id).await.unwrap();
        validate_slip(&db, slip_two.id, 9, &RecordingNotifier::default())
            .await
            .unwrap();

        // Granted after the calculations, so nothing is repaid yet
        granted_advance(&db, second.id, dec!(30000), 3).await.unwrap();

        let summary = period_summary(&db, 3, 2026).await.unwrap();

        assert_eq!(summary.slip_count, 2);
        assert_eq!(summary.draft_count, 1);
        assert_eq!(summary.validated_count, 1);
        assert_eq!(summary.paid_count, 0);
        assert_eq!(summary.total_gross, dec!(1000000));
        assert_eq!(summary.total_net, dec!(884234));
        assert_eq!(summary.total_employee_contributions, dec!(42000));
        assert_eq!(summary.total_employer_contributions, dec!(162000));
        assert_eq!(summary.total_tax, dec!(73766));
        assert_eq!(summary.outstanding_advances, dec!(30000));
    }

    #[tokio::test]
    async fn test_list_slips_for_employee_most_recent_first() {
        let (db, employee) = setup_payroll().await.unwrap();
        draft_slip_for(&db, employee.id, 1, 2026).await.unwrap();
        draft_slip_for(&db, employee.id, 12, 2025).await.unwrap();
        draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();

        let slips = list_slips_for_employee(&db, employee.id).await.unwrap();
        let periods: Vec<(i32, i32)> = slips.iter().map(|s| (s.year, s.month)).collect();
        assert_eq!(periods, vec![(2026, 3), (2026, 1), (2025, 12)]);
    }

    #[test]
    fn test_format_amount_two_decimals() {
        assert_eq!(format_amount(dec!(442117)), "442117.00");
        assert_eq!(format_amount(dec!(16666.666)), "16666.67");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_format_period_summary() {
        let summary = PeriodSummary {
            month: 3,
            year: 2026,
            slip_count: 2,
            draft_count: 1,
            validated_count: 1,
            paid_count: 0,
            total_gross: dec!(1000000),
            total_net: dec!(884234),
            total_employee_contributions: dec!(42000),
            total_employer_contributions: dec!(162000),
            total_tax: dec!(73766),
            outstanding_advances: dec!(30000),
        };

        let text = format_period_summary(&summary);
        assert!(text.contains("Payroll period 03/2026"));
        assert!(text.contains("Slips: 2 (1 draft, 1 validated, 0 paid)"));
        assert!(text.contains("Gross total: 1000000.00"));
        assert!(text.contains("Outstanding advances: 30000.00"));
    }
}
