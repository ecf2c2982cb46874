use std::{fmt, path::PathBuf, process::ExitCode, sync::Arc};

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;

use xfinance_core::{
    budget::BudgetSummary,
    config::{Config, ConfigManager},
    core::{services::BudgetService, SystemClock},
    period::{week_number, PeriodCalculator, Schedule},
    store::JsonFileStore,
    utils::build_info,
};

#[derive(Parser)]
#[command(name = "xfinance_cli")]
#[command(about = "Budget periods, incomes, and spending from the command line")]
struct Cli {
    /// User whose documents are read and written.
    #[arg(long, global = true, default_value = "local")]
    uid: String,
    /// Document store root; overrides the configured data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show income, spending, and target for a period.
    Summary {
        /// Any day inside the period, as YYYY-MM-DD. Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    AddIncome {
        source: String,
        amount: String,
        /// Weekday paid on, 0 = Sunday. Weekly and fortnightly budgets.
        #[arg(long)]
        pay_day: Option<u32>,
        /// Day of month paid on. Monthly budgets.
        #[arg(long)]
        pay_date: Option<u32>,
    },
    AddExpense {
        category: String,
        amount: String,
    },
    SetTarget {
        amount: String,
    },
    /// Show the schedule, or change it.
    Schedule {
        name: Option<String>,
    },
    /// Reset incomes whose pay cycle has rolled over.
    Refresh,
    BuildInfo,
}

#[derive(Debug)]
struct CliError(String);

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<E: std::error::Error> From<E> for CliError {
    fn from(err: E) -> Self {
        CliError(err.to_string())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "[x]".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let manager = ConfigManager::new();
    let config = manager.load()?;
    xfinance_core::init_with_filter(config.log_filter.as_deref());

    if let Commands::BuildInfo = cli.command {
        print_build_info();
        return Ok(());
    }

    let root = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.documents_dir(manager.base()));
    let store = Arc::new(JsonFileStore::new(root)?);
    let clock = Arc::new(SystemClock);
    let budget = BudgetService::connect(store, Some(&cli.uid), PeriodCalculator::local(), clock)?;

    match cli.command {
        Commands::Refresh => {
            if budget.sync()? {
                success("Budget updated; rolled-over incomes were reset.");
            } else {
                info("Nothing to refresh.");
            }
            return Ok(());
        }
        Commands::BuildInfo => return Ok(()),
        _ => {}
    }
    budget.sync()?;

    match cli.command {
        Commands::Summary { date } => {
            let reference = match date {
                Some(raw) => {
                    let day = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                        .map_err(|_| CliError(format!("Invalid date `{raw}`, expected YYYY-MM-DD")))?;
                    Some(budget.calendar().midnight(day))
                }
                None => None,
            };
            print_summary(&budget.summary(reference.as_ref()), &config);
        }
        Commands::AddIncome {
            source,
            amount,
            pay_day,
            pay_date,
        } => {
            let income = budget.add_income(&source, &amount, pay_day, pay_date)?;
            success(format!(
                "Added income {} of {}",
                income.source.bold(),
                money(income.amount.or_zero(), &config)
            ));
        }
        Commands::AddExpense { category, amount } => {
            let expense = budget.add_expense(&category, &amount)?;
            success(format!(
                "Added {} to {}",
                money(expense.amount.or_zero(), &config),
                expense.category.bold()
            ));
        }
        Commands::SetTarget { amount } => {
            let target = budget.set_target(&amount)?;
            success(format!("Target set to {}", money(target, &config)));
        }
        Commands::Schedule { name: Some(name) } => {
            let schedule = budget.set_schedule(&name)?;
            success(format!("Schedule set to {}", schedule.label()));
        }
        Commands::Schedule { name: None } => {
            let schedule = budget.model().period_schedule();
            info(format!("Schedule: {}", schedule.label()));
        }
        Commands::Refresh | Commands::BuildInfo => {}
    }
    Ok(())
}

fn print_summary(summary: &BudgetSummary<Local>, config: &Config) {
    let period = &summary.period;
    let start = period.start_date();
    let heading = match period.schedule {
        Schedule::Weekly => format!("Week {}", week_number(start)),
        Schedule::Fortnight => format!("Fortnight (starts {})", start.format("%a %b %d %Y")),
        Schedule::Monthly => start.format("%B %Y").to_string(),
        Schedule::Yearly => start.format("%Y").to_string(),
    };
    section(format!("{} · {}", start.format("%a %b %d %Y"), heading));
    info(format!(
        "Period {} to {} ({})",
        start,
        period.last_date(),
        period.key
    ));

    section("Income");
    for (source, amount) in &summary.income_by_source {
        row(source, money(*amount, config));
    }
    row("Total", money(summary.total_income, config).bold().to_string());

    section("Spending");
    for (category, amount) in &summary.spend_by_category {
        row(category, money(*amount, config));
    }
    row("Total", money(summary.total_spend, config).bold().to_string());

    section("Target");
    row("Target", money(summary.target, config));
    if summary.is_over_budget() {
        row("Over", money(summary.over, config).red().bold().to_string());
    } else {
        row("Remaining", money(summary.remaining, config).green().to_string());
    }
}

fn print_build_info() {
    section(build_info::version_line());
    for (label, value) in build_info::details() {
        row(label, value);
    }
}

fn money(amount: f64, config: &Config) -> String {
    config.format_money(amount)
}

fn section(title: impl fmt::Display) {
    println!("{}", title.to_string().cyan().bold());
}

fn row(label: &str, value: impl fmt::Display) {
    println!("  {:<20} {}", label, value);
}

fn info(message: impl fmt::Display) {
    println!("{} {}", "[i]".blue(), message);
}

fn success(message: impl fmt::Display) {
    println!("{} {}", "[ok]".green().bold(), message);
}
