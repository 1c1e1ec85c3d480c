//! Initial database migration.
//!
//! Creates the enums, the project tables and the financial tables.

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
        // PART 2: USERS & PROJECTS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(PROJECTS_SQL).await?;
        db.execute_unprepared(PROJECT_TEAM_SQL).await?;

        // ============================================================
        // PART 3: BUDGET & CASH FLOW
        // ============================================================
        db.execute_unprepared(BUDGET_LINES_SQL).await?;
        db.execute_unprepared(CASH_FLOW_PROJECTIONS_SQL).await?;

        // ============================================================
        // PART 4: INCOME & EXPENSE
        // ============================================================
        db.execute_unprepared(INCOMES_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;

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
CREATE TYPE settlement_state AS ENUM ('pending', 'partial', 'settled', 'cancelled');

CREATE TYPE payment_method AS ENUM ('transfer', 'check', 'cash', 'card', 'other');

CREATE TYPE income_type AS ENUM (
    'advance',
    'progress_payment',
    'final_payment',
    'additional',
    'contract_adjustment',
    'other'
);

CREATE TYPE expense_type AS ENUM (
    'material',
    'labor',
    'subcontract',
    'equipment',
    'administrative',
    'service',
    'transport',
    'tax',
    'other'
);

CREATE TYPE budget_category AS ENUM (
    'materials',
    'labor',
    'equipment',
    'subcontracts',
    'administrative',
    'indirect',
    'contingency',
    'other'
);

CREATE TYPE project_status AS ENUM ('planning', 'active', 'on_hold', 'completed', 'cancelled');

CREATE TYPE contract_type AS ENUM ('fixed_price', 'time_material', 'cost_plus');

CREATE TYPE team_role AS ENUM (
    'manager',
    'supervisor',
    'engineer',
    'foreman',
    'accountant',
    'assistant'
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    is_staff BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const PROJECTS_SQL: &str = r"
CREATE TABLE projects (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(50) NOT NULL,
    name VARCHAR(200) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    client_name VARCHAR(200) NOT NULL,
    client_company VARCHAR(200) NOT NULL DEFAULT '',
    location VARCHAR(300) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    actual_start_date DATE,
    actual_end_date DATE,
    contract_amount NUMERIC(15, 2) NOT NULL,
    contract_type contract_type NOT NULL DEFAULT 'fixed_price',
    budget NUMERIC(15, 2) NOT NULL,
    status project_status NOT NULL DEFAULT 'planning',
    progress NUMERIC(5, 2) NOT NULL DEFAULT 0,
    project_manager UUID REFERENCES users(id) ON DELETE SET NULL,
    created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_project_dates CHECK (end_date >= start_date),
    CONSTRAINT chk_project_amounts CHECK (contract_amount >= 0 AND budget >= 0),
    CONSTRAINT chk_project_progress CHECK (progress BETWEEN 0 AND 100)
);

CREATE UNIQUE INDEX idx_projects_code ON projects(upper(code));
CREATE INDEX idx_projects_status_start ON projects(status, start_date);
CREATE INDEX idx_projects_created_by ON projects(created_by, created_at);
";

const PROJECT_TEAM_SQL: &str = r"
CREATE TABLE project_team (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role team_role NOT NULL,
    start_date DATE NOT NULL DEFAULT CURRENT_DATE,
    end_date DATE,
    is_active BOOLEAN NOT NULL DEFAULT true,
    can_approve_payments BOOLEAN NOT NULL DEFAULT false,
    can_manage_payroll BOOLEAN NOT NULL DEFAULT false,
    can_view_financials BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (project_id, user_id)
);

CREATE INDEX idx_project_team_user ON project_team(user_id) WHERE is_active = true;
";

const BUDGET_LINES_SQL: &str = r"
CREATE TABLE budget_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    category budget_category NOT NULL,
    subcategory VARCHAR(100) NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    planned_amount NUMERIC(15, 2) NOT NULL,
    committed_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    spent_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    created_by UUID REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_budget_amounts CHECK (
        planned_amount >= 0 AND committed_amount >= 0 AND spent_amount >= 0
    ),
    CONSTRAINT chk_budget_period CHECK (period_end >= period_start)
);

CREATE INDEX idx_budget_lines_project_category ON budget_lines(project_id, category);
";

const CASH_FLOW_PROJECTIONS_SQL: &str = r"
CREATE TABLE cash_flow_projections (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    projected_income NUMERIC(15, 2) NOT NULL DEFAULT 0,
    projected_expense NUMERIC(15, 2) NOT NULL DEFAULT 0,
    actual_income NUMERIC(15, 2) NOT NULL DEFAULT 0,
    actual_expense NUMERIC(15, 2) NOT NULL DEFAULT 0,
    opening_balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    closing_balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (project_id, year, month),

    CONSTRAINT chk_cash_flow_month CHECK (month BETWEEN 1 AND 12)
);
";

// The state checks mirror the application rules so a bypassing write
// cannot leave an inconsistent row.
const INCOMES_SQL: &str = r"
CREATE TABLE incomes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    concept VARCHAR(200) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    income_type income_type NOT NULL,
    total_amount NUMERIC(15, 2) NOT NULL,
    accumulated_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    due_date DATE NOT NULL,
    settlement_date DATE,
    state settlement_state NOT NULL DEFAULT 'pending',
    payment_method payment_method,
    reference_number VARCHAR(100) NOT NULL DEFAULT '',
    bank_account VARCHAR(50) NOT NULL DEFAULT '',
    tied_to_progress BOOLEAN NOT NULL DEFAULT false,
    progress_percent NUMERIC(5, 2),
    notes TEXT NOT NULL DEFAULT '',
    created_by UUID REFERENCES users(id) ON DELETE SET NULL,
    approved_by UUID REFERENCES users(id) ON DELETE SET NULL,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_income_amounts CHECK (
        total_amount >= 0 AND accumulated_amount >= 0 AND accumulated_amount <= total_amount
    ),
    CONSTRAINT chk_income_progress CHECK (progress_percent IS NULL OR progress_percent BETWEEN 0 AND 100),
    CONSTRAINT chk_income_state CHECK (
        (state <> 'settled' OR accumulated_amount >= total_amount)
        AND (state <> 'partial' OR (accumulated_amount > 0 AND accumulated_amount < total_amount))
        AND (state <> 'pending' OR accumulated_amount = 0)
    )
);

CREATE INDEX idx_incomes_project_due ON incomes(project_id, due_date);
CREATE INDEX idx_incomes_state ON incomes(state);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    budget_line_id UUID REFERENCES budget_lines(id) ON DELETE SET NULL,
    concept VARCHAR(200) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    expense_type expense_type NOT NULL,
    supplier VARCHAR(200) NOT NULL,
    supplier_tax_id VARCHAR(50) NOT NULL DEFAULT '',
    total_amount NUMERIC(15, 2) NOT NULL,
    accumulated_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    rolled_up_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    issue_date DATE,
    due_date DATE NOT NULL,
    settlement_date DATE,
    state settlement_state NOT NULL DEFAULT 'pending',
    payment_method payment_method,
    invoice_number VARCHAR(100) NOT NULL DEFAULT '',
    purchase_order_number VARCHAR(100) NOT NULL DEFAULT '',
    bank_account VARCHAR(50) NOT NULL DEFAULT '',
    vat_withholding NUMERIC(15, 2) NOT NULL DEFAULT 0,
    income_tax_withholding NUMERIC(15, 2) NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '',
    created_by UUID REFERENCES users(id) ON DELETE SET NULL,
    approved_by UUID REFERENCES users(id) ON DELETE SET NULL,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_expense_amounts CHECK (
        total_amount >= 0 AND accumulated_amount >= 0 AND accumulated_amount <= total_amount
    ),
    CONSTRAINT chk_expense_withholdings CHECK (vat_withholding >= 0 AND income_tax_withholding >= 0),
    CONSTRAINT chk_expense_rolled_up CHECK (rolled_up_amount >= 0),
    CONSTRAINT chk_expense_state CHECK (
        (state <> 'settled' OR accumulated_amount >= total_amount)
        AND (state <> 'partial' OR (accumulated_amount > 0 AND accumulated_amount < total_amount))
        AND (state <> 'pending' OR accumulated_amount = 0)
    )
);

CREATE INDEX idx_expenses_project_due ON expenses(project_id, due_date);
CREATE INDEX idx_expenses_budget_line ON expenses(budget_line_id) WHERE budget_line_id IS NOT NULL;
CREATE INDEX idx_expenses_state ON expenses(state);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS incomes CASCADE;
DROP TABLE IF EXISTS cash_flow_projections CASCADE;
DROP TABLE IF EXISTS budget_lines CASCADE;
DROP TABLE IF EXISTS project_team CASCADE;
DROP TABLE IF EXISTS projects CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP TYPE IF EXISTS team_role CASCADE;
DROP TYPE IF EXISTS contract_type CASCADE;
DROP TYPE IF EXISTS project_status CASCADE;
DROP TYPE IF EXISTS budget_category CASCADE;
DROP TYPE IF EXISTS expense_type CASCADE;
DROP TYPE IF EXISTS income_type CASCADE;
DROP TYPE IF EXISTS payment_method CASCADE;
DROP TYPE IF EXISTS settlement_state CASCADE;
";
