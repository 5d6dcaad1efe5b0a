/// Database configuration and connection management
pub mod database;

/// Payroll parameter and contribution seeding from payroll.toml
pub mod payroll;
