//! `SeaORM` entity definitions.

pub mod approval_rules;
pub mod approval_steps;
pub mod companies;
pub mod expense_approvals;
pub mod expenses;
pub mod sea_orm_active_enums;
pub mod users;
