//! Notification seam for validated slips.
//!
//! The engine computes; telling the employee their slip is ready belongs to
//! the outside world. `SlipNotifier` is that boundary. Delivery is
//! fire-and-forget from the engine's point of view: `validate_slip` logs a
//! failed notification and moves on.

use crate::{entities::pay_slip, errors::Result};
use tracing::info;

/// Receives word that a slip has been validated and may be shown to the
/// employee.
pub trait SlipNotifier: Send + Sync {
    /// Called once per successful validation, after the commit.
    ///
    /// # Errors
    /// Implementations may fail; the caller logs the error and continues.
    fn slip_available(&self, slip: &pay_slip::Model) -> Result<()>;
}

/// Default notifier: emits a structured log event and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl SlipNotifier for LogNotifier {
    fn slip_available(&self, slip: &pay_slip::Model) -> Result<()> {
        info!(
            slip_id = slip.id,
            slip_no = %slip.slip_no,
            employee_id = slip.employee_id,
            net = %slip.net,
            "slip available for employee"
        );
        Ok(())
    }
}
