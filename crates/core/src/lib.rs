//! Core business logic for Outlay.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `workflow` - Expense approval rules, lifecycle and decisions
//! - `currency` - Currency conversion into a company's base currency

pub mod currency;
pub mod workflow;
