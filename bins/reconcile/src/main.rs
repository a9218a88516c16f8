//! Acqledger reconcile
//!
//! Recalculates budgets and prints group and expense class summaries read
//! from the finance storage service.

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use acqledger_core::{BudgetId, FinanceError, FiscalYearId, GroupId};
use acqledger_service::{ExpenseClassScope, FinanceService};
use acqledger_shared::{AppConfig, AppError, AppResult};
use acqledger_shared::config::LoggingConfig;
use acqledger_store::{HttpStorage, Query, by_fiscal_year};

#[derive(Parser)]
#[command(
    name = "acqledger-reconcile",
    version,
    about = "Recalculate and summarize acquisitions budgets"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recalculate one budget from its transaction history
    Recalculate {
        /// Budget ID
        #[arg(long)]
        budget: BudgetId,
    },

    /// Recalculate every budget of a fiscal year
    RecalculateYear {
        /// Fiscal year ID
        #[arg(long)]
        fiscal_year: FiscalYearId,
    },

    /// Print group fiscal-year summaries
    GroupSummaries {
        /// Fiscal year ID
        #[arg(long)]
        fiscal_year: FiscalYearId,
        /// Restrict to one group
        #[arg(long)]
        group: Option<GroupId>,
    },

    /// Print expense class totals of a budget or a group
    ExpenseClasses {
        /// Budget ID
        #[arg(long, conflicts_with = "group", required_unless_present = "group")]
        budget: Option<BudgetId>,
        /// Group ID
        #[arg(long)]
        group: Option<GroupId>,
        /// Fiscal year ID
        #[arg(long)]
        fiscal_year: FiscalYearId,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let json = logging.json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn print<T: Serialize>(value: &T) -> AppResult<()> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|err| AppError::Internal(err.to_string()))?;
    println!("{rendered}");
    Ok(())
}

async fn run(command: Command, config: &AppConfig) -> AppResult<()> {
    let storage = HttpStorage::from_config(&config.storage).map_err(FinanceError::from)?;
    info!(base_url = %config.storage.base_url, "Using finance storage");
    let service = FinanceService::new(storage);

    match command {
        Command::Recalculate { budget } => {
            print(&service.recalculate_budget(budget).await?)?;
        }
        Command::RecalculateYear { fiscal_year } => {
            let results = service.recalculate_fiscal_year_budgets(fiscal_year).await?;
            let drifted = results.iter().filter(|r| !r.is_consistent()).count();
            info!(budgets = results.len(), drifted, "Fiscal year recalculated");
            print(&results)?;
        }
        Command::GroupSummaries { fiscal_year, group } => {
            let query = match group {
                Some(group) => Query::new()
                    .where_eq("groupId", group)
                    .and(by_fiscal_year(fiscal_year)),
                None => by_fiscal_year(fiscal_year),
            };
            print(&service.get_group_fiscal_year_summaries(&query).await?)?;
        }
        Command::ExpenseClasses {
            budget,
            group,
            fiscal_year,
        } => {
            let scope = match (budget, group) {
                (Some(budget), _) => ExpenseClassScope::Budget(budget),
                (None, Some(group)) => ExpenseClassScope::Group(group),
                (None, None) => {
                    return Err(AppError::Internal(
                        "either --budget or --group is required".to_string(),
                    ));
                }
            };
            print(&service.get_expense_class_totals(scope, fiscal_year).await?)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load().map_err(AppError::from)?;
    init_tracing(&config.logging);

    if let Err(err) = run(cli.command, &config).await {
        error!(code = err.error_code(), "{err}");
        return Err(err.into());
    }
    Ok(())
}
