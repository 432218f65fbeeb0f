//! Database seeder for Outlay development and testing.
//!
//! Seeds a demo company with an admin, a manager and an employee, two
//! approval rules and a couple of expenses so every workflow path can be
//! tried locally. Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use outlay_core::currency::{CachedConverter, ExchangeRate, RateTable};
use outlay_core::workflow::{NewExpense, UserRole};
use outlay_db::repositories::{
    ApprovalRuleRepository, CompanyRepository, CreateApprovalRuleInput, CreateApprovalStepInput,
    CreateUserInput, ExpenseRepository, UserRepository,
};
use outlay_shared::AppConfig;
use outlay_shared::telemetry::init_tracing;
use outlay_shared::types::{CompanyId, Currency, UserId};

/// Admin login, also used to detect an already seeded database.
const ADMIN_EMAIL: &str = "admin@acme.test";
const MANAGER_EMAIL: &str = "manager@acme.test";
const EMPLOYEE_EMAIL: &str = "employee@acme.test";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    info!("Connecting to database...");
    let db = outlay_db::connect_with(&config.database).await?;

    let users = UserRepository::new(db.clone());
    if users.find_by_email(ADMIN_EMAIL).await?.is_some() {
        info!("Demo company already seeded, nothing to do");
        return Ok(());
    }

    let rates = CachedConverter::with_config(
        seed_rates(),
        config.workflow.rate_cache_capacity,
        config.workflow.rate_cache_ttl_secs,
    );
    let expenses = ExpenseRepository::new(db.clone(), Arc::new(rates));

    info!("Seeding company and users...");
    let companies = CompanyRepository::new(db.clone());
    let company = companies.create_company("Acme Corp", Currency::Usd).await?;
    let admin =
        seed_user(&users, company.id, ADMIN_EMAIL, "Ada Admin", UserRole::Admin, None).await?;
    companies.set_admin(company.id, admin).await?;
    let manager =
        seed_user(&users, company.id, MANAGER_EMAIL, "Max Manager", UserRole::Manager, None).await?;
    let employee = seed_user(
        &users,
        company.id,
        EMPLOYEE_EMAIL,
        "Eve Employee",
        UserRole::Employee,
        Some(manager),
    )
    .await?;

    info!("Seeding approval rules...");
    seed_rules(&ApprovalRuleRepository::new(db.clone()), company.id).await?;

    info!("Seeding expenses...");
    let date = Utc::now().date_naive();
    let small = expenses
        .create_expense(NewExpense {
            employee_id: employee,
            amount: Decimal::new(30000, 2),
            currency: "USD".to_string(),
            expense_date: date,
            merchant: Some("Office Depot".to_string()),
            description: "Monitor stand".to_string(),
        })
        .await?;
    info!(expense_id = %small.id, status = %small.status, "Manager-approved expense created");

    let large = expenses
        .create_expense(NewExpense {
            employee_id: employee,
            amount: Decimal::new(95000, 2),
            currency: "EUR".to_string(),
            expense_date: date,
            merchant: Some("Lufthansa".to_string()),
            description: "Conference flight".to_string(),
        })
        .await?;
    info!(
        expense_id = %large.id,
        converted = ?large.converted_amount,
        status = %large.status,
        "Two-step expense created"
    );

    info!("Seeding complete!");
    Ok(())
}

async fn seed_user(
    users: &UserRepository,
    company_id: CompanyId,
    email: &str,
    full_name: &str,
    role: UserRole,
    manager_id: Option<UserId>,
) -> anyhow::Result<UserId> {
    let model = users
        .create_user(CreateUserInput {
            company_id: Some(company_id),
            email: email.to_string(),
            full_name: full_name.to_string(),
            role,
            manager_id,
        })
        .await?;
    Ok(UserId::from_uuid(model.id))
}

/// The two rules of the demo: manager sign-off up to 500, then manager and
/// admin in sequence above it.
async fn seed_rules(rules: &ApprovalRuleRepository, company_id: CompanyId) -> anyhow::Result<()> {
    rules
        .create_rule(
            company_id,
            CreateApprovalRuleInput {
                name: "Manager sign-off".to_string(),
                min_amount: Some(Decimal::ZERO),
                max_amount: Some(Decimal::new(500, 0)),
                is_manager_approver: true,
                steps: vec![],
            },
        )
        .await?;

    let role_step = |step_number, role| CreateApprovalStepInput {
        step_number,
        approver_id: None,
        approver_role: Some(role),
    };
    rules
        .create_rule(
            company_id,
            CreateApprovalRuleInput {
                name: "Large spend".to_string(),
                min_amount: Some(Decimal::new(500, 0)),
                max_amount: None,
                is_manager_approver: false,
                steps: vec![
                    role_step(1, UserRole::Manager),
                    role_step(2, UserRole::Admin),
                ],
            },
        )
        .await?;
    Ok(())
}

fn seed_rates() -> RateTable {
    let effective = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap_or_default();
    [
        (Currency::Eur, Decimal::new(108, 2)),
        (Currency::Gbp, Decimal::new(127, 2)),
        (Currency::Inr, Decimal::new(12, 3)),
        (Currency::Jpy, Decimal::new(67, 4)),
    ]
    .into_iter()
    .map(|(from, rate)| ExchangeRate::new(from, Currency::Usd, rate, effective))
    .collect()
}
