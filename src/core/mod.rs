/// Salary advance lifecycle and balance derivation
pub mod advance;

/// Payroll parameter access and administration
pub mod config;

/// Contribution rule administration
pub mod contribution;

/// Minimal employee registry
pub mod employee;

/// Pure line item construction
pub mod line_items;

/// Period reporting and display formatting
pub mod report;

/// Pay slip lifecycle and calculation
pub mod slip;
