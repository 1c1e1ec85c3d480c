//! Database seeder for Obra development and testing.
//!
//! Seeds a development user, one demo project with budget lines, incomes
//! and expenses (some partially settled), then prints a bearer token for
//! the user.
//!
//! Usage: cargo run --bin seeder
//!
//! Reads `DATABASE_URL` and, optionally, `OBRA__JWT__SECRET`.

use anyhow::Context;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use obra_core::budget::{BudgetCategory, BudgetLineInput};
use obra_core::finance::{
    ExpenseType, IncomeType, PaymentMethod, SettlementRequest, SettlementState,
};
use obra_core::project::{ContractType, ProjectInput, ProjectStatus};
use obra_db::repositories::{
    BudgetLineRepository, ExpenseInput, ExpenseRepository, IncomeInput, IncomeRepository,
    ProjectRepository, UserRepository,
};
use obra_shared::types::UserId;
use obra_shared::{JwtConfig, JwtService};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

const DEV_EMAIL: &str = "dev@obra.dev";
const DEMO_CODE: &str = "OB-DEMO";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = obra_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding development user...");
    let user = seed_user(&db).await?;

    println!("Seeding demo project...");
    seed_project(&db, user.id).await?;

    let secret = std::env::var("OBRA__JWT__SECRET")
        .unwrap_or_else(|_| JwtConfig::default().secret);
    let jwt = JwtService::new(JwtConfig {
        secret,
        access_token_expires_minutes: 60 * 24,
    });
    let token = jwt.generate_access_token(user.id, &user.full_name, user.is_staff)?;

    println!("Seeding complete!");
    println!("  User: {} ({})", user.email, user.id);
    println!("  Token (24h): {token}");
    Ok(())
}

async fn seed_user(db: &DatabaseConnection) -> anyhow::Result<obra_db::entities::users::Model> {
    let users = UserRepository::new(db.clone());
    if let Some(user) = users.find_by_email(DEV_EMAIL).await? {
        println!("  Development user already exists, skipping...");
        return Ok(user);
    }
    let user = users.create(DEV_EMAIL, "Dev Manager", false).await?;
    println!("  Created user: {DEV_EMAIL}");
    Ok(user)
}

async fn seed_project(db: &DatabaseConnection, user_id: Uuid) -> anyhow::Result<()> {
    let projects = ProjectRepository::new(db.clone());
    if projects.code_exists(DEMO_CODE, None).await? {
        println!("  Demo project already exists, skipping...");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    let end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);

    let project = projects
        .create_project(
            ProjectInput {
                code: DEMO_CODE.to_string(),
                name: "Riverside Warehouse".to_string(),
                description: "Two-storey logistics warehouse".to_string(),
                client_name: "Riverside Logistics".to_string(),
                client_company: "Riverside Logistics S.A.S.".to_string(),
                location: "Lot 14, industrial park".to_string(),
                start_date: start,
                end_date: end,
                actual_start_date: Some(start),
                actual_end_date: None,
                contract_amount: dec!(850000),
                contract_type: ContractType::FixedPrice,
                budget: dec!(720000),
                status: ProjectStatus::Active,
                progress: dec!(35),
                project_manager: Some(UserId::from_uuid(user_id)),
            },
            user_id,
        )
        .await?;
    println!("  Created project {DEMO_CODE}");

    let lines = BudgetLineRepository::new(db.clone());
    let mut line_ids = Vec::new();
    for (category, subcategory, planned) in [
        (BudgetCategory::Materials, "Concrete and rebar", dec!(320000)),
        (BudgetCategory::Labor, "Site crew", dec!(210000)),
        (BudgetCategory::Equipment, "Crane rental", dec!(90000)),
        (BudgetCategory::Contingency, "", dec!(40000)),
    ] {
        let line = lines
            .create_line(
                project.id,
                BudgetLineInput {
                    category,
                    subcategory: subcategory.to_string(),
                    description: String::new(),
                    planned_amount: planned,
                    committed_amount: Decimal::ZERO,
                    period_start: start,
                    period_end: end,
                },
                user_id,
            )
            .await?;
        line_ids.push(line.id);
    }
    println!("  Created {} budget lines", line_ids.len());

    let incomes = IncomeRepository::new(db.clone());
    for (concept, income_type, total, due_in_days) in [
        ("Contract advance", IncomeType::Advance, dec!(255000), -60),
        ("Progress payment 1", IncomeType::ProgressPayment, dec!(170000), -5),
        ("Progress payment 2", IncomeType::ProgressPayment, dec!(170000), 45),
    ] {
        let income = incomes
            .create_income(
                project.id,
                IncomeInput {
                    concept: concept.to_string(),
                    description: String::new(),
                    income_type,
                    total_amount: total,
                    accumulated_amount: Decimal::ZERO,
                    state: SettlementState::Pending,
                    due_date: Some(today + Duration::days(due_in_days)),
                    settlement_date: None,
                    payment_method: None,
                    reference_number: String::new(),
                    bank_account: String::new(),
                    tied_to_progress: income_type == IncomeType::ProgressPayment,
                    progress_percent: None,
                    notes: String::new(),
                    version: None,
                },
                user_id,
            )
            .await?;

        if income_type == IncomeType::Advance {
            incomes
                .settle_income_fully(
                    project.id,
                    income.id,
                    today - Duration::days(58),
                    Some(PaymentMethod::Transfer),
                    user_id,
                )
                .await?;
        }
    }
    println!("  Created incomes (advance settled, one overdue)");

    let expenses = ExpenseRepository::new(db.clone());
    for (line_index, concept, supplier, expense_type, total, paid) in [
        (0, "Ready-mix concrete", "Concretera Norte", ExpenseType::Material, dec!(48000), dec!(48000)),
        (0, "Rebar 1/2\"", "Aceros del Valle", ExpenseType::Material, dec!(36500), dec!(20000)),
        (1, "Crew payroll, first fortnight", "Site crew", ExpenseType::Labor, dec!(18000), dec!(0)),
        (2, "Tower crane, month 1", "Grúas Andinas", ExpenseType::Equipment, dec!(15000), dec!(0)),
    ] {
        let expense = expenses
            .create_expense(
                project.id,
                ExpenseInput {
                    budget_line_id: line_ids.get(line_index).copied(),
                    concept: concept.to_string(),
                    description: String::new(),
                    expense_type,
                    supplier: supplier.to_string(),
                    supplier_tax_id: String::new(),
                    total_amount: total,
                    accumulated_amount: Decimal::ZERO,
                    state: SettlementState::Pending,
                    issue_date: Some(today - Duration::days(20)),
                    due_date: Some(today + Duration::days(10)),
                    settlement_date: None,
                    payment_method: None,
                    invoice_number: String::new(),
                    purchase_order_number: String::new(),
                    bank_account: String::new(),
                    vat_withholding: Decimal::ZERO,
                    income_tax_withholding: Decimal::ZERO,
                    notes: String::new(),
                    version: None,
                },
                user_id,
            )
            .await?;

        if paid > Decimal::ZERO {
            let settlement = expenses
                .settle_expense(
                    project.id,
                    expense.id,
                    &SettlementRequest {
                        amount: paid,
                        date: today - Duration::days(3),
                        method: Some(PaymentMethod::Transfer),
                    },
                    user_id,
                )
                .await?;
            if let Some(warning) = settlement.warning {
                eprintln!("  Budget rollup failed for {concept}: {warning:?}");
            }
        }
    }
    println!("  Created expenses (two paid against the materials line)");

    Ok(())
}
