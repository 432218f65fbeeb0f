//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod approval_rule;
pub mod company;
pub mod expense;
mod mapping;
pub mod user;

pub use approval_rule::{ApprovalRuleRepository, CreateApprovalRuleInput, CreateApprovalStepInput};
pub use company::CompanyRepository;
pub use expense::ExpenseRepository;
pub use user::{CreateUserInput, UserRepository};
