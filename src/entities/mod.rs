//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod advance;
pub mod contribution;
pub mod employee;
pub mod line_item;
pub mod pay_config;
pub mod pay_slip;
pub mod repayment;
pub mod slip_history;

// Re-export specific types to avoid conflicts
pub use advance::{AdvanceStatus, Column as AdvanceColumn, Entity as Advance, Model as AdvanceModel};
pub use contribution::{
    Column as ContributionColumn, ContributionBase, Entity as Contribution,
    Model as ContributionModel,
};
pub use employee::{Column as EmployeeColumn, Entity as Employee, Model as EmployeeModel};
pub use line_item::{
    Column as LineItemColumn, Entity as LineItem, ItemCategory, ItemKind, Model as LineItemModel,
};
pub use pay_config::{Column as PayConfigColumn, Entity as PayConfig, Model as PayConfigModel};
pub use pay_slip::{
    Column as PaySlipColumn, Entity as PaySlip, Model as PaySlipModel, PaymentMethod, SlipStatus,
};
pub use repayment::{Column as RepaymentColumn, Entity as Repayment, Model as RepaymentModel};
pub use slip_history::{
    Column as SlipHistoryColumn, Entity as SlipHistory, Model as SlipHistoryModel, SlipAction,
};
