//! Initial database migration.
//!
//! Creates the enums and tables of the expense approval workflow.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: COMPANIES & USERS
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: APPROVAL RULES
        // ============================================================
        db.execute_unprepared(APPROVAL_RULES_SQL).await?;
        db.execute_unprepared(APPROVAL_STEPS_SQL).await?;

        // ============================================================
        // PART 4: EXPENSES & APPROVAL TRAIL
        // ============================================================
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(EXPENSE_APPROVALS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('admin', 'manager', 'employee');

CREATE TYPE expense_status AS ENUM ('pending', 'in_progress', 'approved', 'rejected');

CREATE TYPE approval_status AS ENUM ('pending', 'approved', 'rejected');
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    currency VARCHAR(3) NOT NULL DEFAULT 'USD',
    admin_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

// The company admin FK is added once users exists.
const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID REFERENCES companies(id) ON DELETE CASCADE,
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'employee',
    manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_not_own_manager CHECK (manager_id IS NULL OR manager_id <> id)
);

CREATE INDEX idx_users_company_role ON users(company_id, role);
CREATE INDEX idx_users_manager ON users(manager_id) WHERE manager_id IS NOT NULL;

ALTER TABLE companies
    ADD CONSTRAINT fk_companies_admin
    FOREIGN KEY (admin_id) REFERENCES users(id) ON DELETE SET NULL;
";

const APPROVAL_RULES_SQL: &str = r"
CREATE TABLE approval_rules (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    min_amount NUMERIC(19, 4),
    max_amount NUMERIC(19, 4),
    is_active BOOLEAN NOT NULL DEFAULT true,
    is_manager_approver BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_amount_range CHECK (max_amount IS NULL OR min_amount IS NULL OR max_amount >= min_amount),
    CONSTRAINT chk_amount_non_negative CHECK ((min_amount IS NULL OR min_amount >= 0) AND (max_amount IS NULL OR max_amount >= 0))
);

CREATE INDEX idx_approval_rules_company ON approval_rules(company_id) WHERE is_active = true;
";

const APPROVAL_STEPS_SQL: &str = r"
CREATE TABLE approval_steps (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    rule_id UUID NOT NULL REFERENCES approval_rules(id) ON DELETE CASCADE,
    step_number INTEGER NOT NULL CHECK (step_number >= 1),
    approver_id UUID REFERENCES users(id) ON DELETE RESTRICT,
    approver_role user_role,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_approval_steps_rule_step UNIQUE (rule_id, step_number),
    CONSTRAINT chk_step_has_approver CHECK (approver_id IS NOT NULL OR approver_role IS NOT NULL)
);
";

// Rules referenced by an expense cannot be deleted; deactivate them instead.
const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    employee_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount >= 0),
    currency VARCHAR(3) NOT NULL,
    converted_amount NUMERIC(19, 4),
    expense_date DATE NOT NULL,
    merchant VARCHAR(255),
    description TEXT NOT NULL DEFAULT '',
    status expense_status NOT NULL DEFAULT 'pending',
    approval_rule_id UUID REFERENCES approval_rules(id) ON DELETE RESTRICT,
    current_approver_id UUID REFERENCES users(id) ON DELETE SET NULL,
    current_step INTEGER NOT NULL DEFAULT 0 CHECK (current_step >= 0),
    current_rule_step INTEGER,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_terminal_has_no_approver CHECK (
        status IN ('pending', 'in_progress') OR current_approver_id IS NULL
    )
);

CREATE INDEX idx_expenses_company ON expenses(company_id, created_at DESC);
CREATE INDEX idx_expenses_employee ON expenses(employee_id);
";

const EXPENSE_APPROVALS_SQL: &str = r"
CREATE TABLE expense_approvals (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    expense_id UUID NOT NULL REFERENCES expenses(id) ON DELETE CASCADE,
    approver_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    step_number INTEGER NOT NULL CHECK (step_number >= 0),
    status approval_status NOT NULL DEFAULT 'pending',
    comment TEXT,
    decided_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_expense_approvals_step UNIQUE (expense_id, step_number),
    CONSTRAINT chk_decided_at CHECK ((status = 'pending') = (decided_at IS NULL))
);

-- At most one open request per expense.
CREATE UNIQUE INDEX uq_expense_approvals_one_pending
    ON expense_approvals(expense_id) WHERE status = 'pending';

CREATE INDEX idx_expense_approvals_pending_approver
    ON expense_approvals(approver_id, created_at) WHERE status = 'pending';
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS expense_approvals CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS approval_steps CASCADE;
DROP TABLE IF EXISTS approval_rules CASCADE;
ALTER TABLE IF EXISTS companies DROP CONSTRAINT IF EXISTS fk_companies_admin;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

DROP TYPE IF EXISTS approval_status;
DROP TYPE IF EXISTS expense_status;
DROP TYPE IF EXISTS user_role;
";
