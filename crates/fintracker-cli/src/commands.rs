//! Subcommands and their handlers.
//!
//! Every command except `logout` corresponds to a view. The session is
//! resolved first and the view is passed through the navigation guard, so
//! signed-out users are sent to `login` and signed-in users skip it.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use fintracker_core::api::{DEFAULT_MONTHLY_MONTHS, DEFAULT_RECENT_LIMIT};
use fintracker_core::models::{EntryType, Period, TransactionFilters};
use fintracker_core::{guard, Config, GuardDecision, Route, SessionController};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::format::{format_amount, format_optional, parse_month, truncate_string};

/// Width of the description column in transaction listings
const DESCRIPTION_WIDTH: usize = 32;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in to your account
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create a new account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Income, expenses and recent activity
    Dashboard,
    /// List transactions
    Transactions {
        #[arg(long = "type", value_parser = parse_entry_type)]
        kind: Option<EntryType>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// List categories
    Categories {
        #[arg(long = "type", value_parser = parse_entry_type)]
        kind: Option<EntryType>,
    },
    /// Budget progress for a month (defaults to the current month)
    Budgets {
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
}

fn parse_entry_type(s: &str) -> Result<EntryType, String> {
    EntryType::parse(s).ok_or_else(|| format!("invalid type '{}', expected income or expense", s))
}

impl Command {
    /// The view this command renders; `None` for commands that are not views
    fn route(&self) -> Option<Route> {
        match self {
            Command::Login { .. } => Some(Route::SignIn),
            Command::Register { .. } => Some(Route::SignUp),
            Command::Logout => None,
            Command::Whoami | Command::Dashboard => Some(Route::Dashboard),
            Command::Transactions { .. } => Some(Route::Transactions),
            Command::Categories { .. } => Some(Route::Categories),
            Command::Budgets { .. } => Some(Route::Budgets),
        }
    }
}

/// How a command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The gateway tore the session down while the command ran
    SessionExpired,
}

pub async fn run(
    session: &SessionController,
    config: &mut Config,
    redirects: &mut UnboundedReceiver<Route>,
    command: Command,
) -> Result<Outcome> {
    let Some(route) = command.route() else {
        session.sign_out();
        println!("Signed out.");
        return Ok(Outcome::Completed);
    };

    if !enter(session, redirects, route).await? {
        return Ok(Outcome::Completed);
    }

    let result = dispatch(session, config, command).await;
    settle(session, redirects, result)
}

/// Resolve the session and pass `route` through the guard.
///
/// Returns false when the view should not render. A teardown during startup
/// already shows up as `Anonymous`, so its redirect is dropped here.
async fn enter(
    session: &SessionController,
    redirects: &mut UnboundedReceiver<Route>,
    route: Route,
) -> Result<bool> {
    let phase = session.initialize().await;
    if session_expired(redirects) {
        debug!("Stored session was torn down during startup");
    }

    match guard(&phase, route) {
        GuardDecision::Render(route) => {
            debug!(path = route.path(), "Rendering view");
            Ok(true)
        }
        GuardDecision::Redirect(Route::SignIn) => {
            bail!("Not signed in. Run `fintracker login` first.")
        }
        GuardDecision::Redirect(_) => {
            let who = phase.identity().map(|i| i.display_name()).unwrap_or_default();
            println!(
                "Already signed in as {}. Run `fintracker logout` to switch accounts.",
                who
            );
            Ok(false)
        }
        GuardDecision::Placeholder => bail!("Session is still being resolved"),
    }
}

/// Account for redirects raised while the handler ran. A forced sign-in
/// makes the handler's own result moot.
fn settle(
    session: &SessionController,
    redirects: &mut UnboundedReceiver<Route>,
    result: Result<()>,
) -> Result<Outcome> {
    if session_expired(redirects) {
        session.sign_out();
        return Ok(Outcome::SessionExpired);
    }
    result.map(|()| Outcome::Completed)
}

/// True if the gateway asked for the sign-in view since the last check
fn session_expired(redirects: &mut UnboundedReceiver<Route>) -> bool {
    let mut expired = false;
    while let Ok(route) = redirects.try_recv() {
        expired |= route == Route::SignIn;
    }
    expired
}

async fn dispatch(session: &SessionController, config: &mut Config, command: Command) -> Result<()> {
    match command {
        Command::Login { email } => login(session, config, email).await,
        Command::Register { email, name } => register(session, email, name).await,
        Command::Logout => Ok(()),
        Command::Whoami => whoami(session),
        Command::Dashboard => dashboard(session).await,
        Command::Transactions {
            kind,
            category,
            from,
            to,
            page,
        } => {
            let filters = TransactionFilters {
                kind,
                category_id: category,
                date_from: from,
                date_to: to,
                page,
                per_page: None,
            };
            transactions(session, &filters).await
        }
        Command::Categories { kind } => categories(session, kind).await,
        Command::Budgets { month } => {
            budgets(session, month.unwrap_or_else(|| Local::now().date_naive())).await
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input")?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("No input given");
    }
    Ok(value)
}

async fn login(session: &SessionController, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;

    let identity = session.sign_in(&email, &password).await?;
    println!("Signed in as {}.", identity.display_name());

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

async fn register(session: &SessionController, email: String, name: Option<String>) -> Result<()> {
    let password = rpassword::prompt_password("Choose a password: ")
        .context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Confirm password: ")
        .context("Failed to read password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let created = session.sign_up(&email, &password, name.as_deref()).await?;
    println!(
        "Account created for {}. Run `fintracker login --email {}` to sign in.",
        created.email, created.email
    );
    Ok(())
}

fn whoami(session: &SessionController) -> Result<()> {
    let identity = session.identity().context("Not signed in")?;
    println!("{}", identity.display_name());
    println!("  email: {}", identity.email);
    println!("  id:    {}", identity.id);
    Ok(())
}

async fn dashboard(session: &SessionController) -> Result<()> {
    let api = session.api();
    let period = Period::default();
    let (summary, monthly, recent) = futures::try_join!(
        api.dashboard_summary(&period),
        api.dashboard_monthly(DEFAULT_MONTHLY_MONTHS),
        api.recent_transactions(DEFAULT_RECENT_LIMIT),
    )?;

    println!("Income:   {:>14}", format_amount(summary.total_income));
    println!("Expenses: {:>14}", format_amount(summary.total_expense));
    println!("Balance:  {:>14}", format_amount(summary.balance));
    println!("({} transactions)", summary.transaction_count);

    if !monthly.data.is_empty() {
        println!();
        println!("{:<8} {:>14} {:>14} {:>14}", "Month", "Income", "Expenses", "Balance");
        for month in &monthly.data {
            println!(
                "{:<8} {:>14} {:>14} {:>14}",
                month.month,
                format_amount(month.income),
                format_amount(month.expense),
                format_amount(month.balance)
            );
        }
    }

    if !recent.is_empty() {
        println!();
        println!("Recent activity:");
        for tx in &recent {
            let amount = match tx.kind {
                EntryType::Income => tx.amount,
                EntryType::Expense => -tx.amount,
            };
            println!(
                "  {}  {:>12}  {:<20} {}",
                tx.date,
                format_amount(amount),
                truncate_string(&tx.category_name, 20),
                format_optional(&tx.description, "")
            );
        }
    }
    Ok(())
}

async fn transactions(session: &SessionController, filters: &TransactionFilters) -> Result<()> {
    let api = session.api();
    let (page, categories) =
        futures::try_join!(api.transactions(filters), api.categories(filters.kind))?;
    let labels: HashMap<i64, String> = categories.iter().map(|c| (c.id, c.label())).collect();

    if page.data.is_empty() {
        println!("No transactions.");
        return Ok(());
    }

    for tx in &page.data {
        let category = labels
            .get(&tx.category_id)
            .cloned()
            .unwrap_or_else(|| format!("#{}", tx.category_id));
        println!(
            "{}  {:>12}  {:<20} {}",
            tx.date,
            format_amount(tx.signed_amount()),
            truncate_string(&category, 20),
            truncate_string(&format_optional(&tx.description, ""), DESCRIPTION_WIDTH)
        );
    }
    println!();
    println!(
        "Page {} of {} ({} total)",
        page.page,
        page.total_pages.max(1),
        page.total
    );
    if page.has_next() {
        println!("Next: --page {}", page.page + 1);
    }
    Ok(())
}

async fn categories(session: &SessionController, kind: Option<EntryType>) -> Result<()> {
    let categories = session.api().categories(kind).await?;
    if categories.is_empty() {
        println!("No categories.");
        return Ok(());
    }
    for category in &categories {
        println!("{:>5}  {:<8} {}", category.id, category.kind, category.label());
    }
    Ok(())
}

async fn budgets(session: &SessionController, month: NaiveDate) -> Result<()> {
    let items = session.api().budget_summary(month).await?;
    println!("Budgets for {}", month.format("%B %Y"));
    if items.is_empty() {
        println!("No budgets set.");
        return Ok(());
    }
    for item in &items {
        let marker = if item.is_over_budget() { " !" } else { "" };
        println!(
            "  {:<20} {:>12} of {:>12}  {:>5.1}%{}",
            truncate_string(&item.category_name, 20),
            format_amount(item.spent),
            format_amount(item.budgeted),
            item.percent_spent(),
            marker
        );
    }
    Ok(())
}
