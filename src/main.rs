// src/main.rs
use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use timegrid_core::api_client::{ApiClient, ApiConfig};
use timegrid_core::export::write_week_csv;
use timegrid_core::feedback::Severity;
use timegrid_core::register::WeekRegister;
use timegrid_core::week::WeekWindow;

#[derive(Parser)]
#[command(
    name = "timegrid",
    about = "Weekly timesheet register against the HR backend"
)]
struct Cli {
    /// Any date inside the week to operate on (defaults to today).
    #[arg(long, global = true)]
    week: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the week grid.
    Show,
    /// Set the hours for one task on one date, then save.
    Set {
        task: String,
        date: NaiveDate,
        hours: Decimal,
    },
    /// Add a blank task row (kept local until hours are saved).
    AddTask { name: String },
    /// Delete a task row and every saved entry it references.
    DeleteTask {
        task: String,
        /// Skip the confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Save all pending changes as drafts.
    Save,
    /// Validate the full week and submit it for approval.
    Submit {
        /// Skip the confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Export the week grid as CSV to stdout.
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = ApiConfig::from_env()
        .context("loading TIMEGRID_* configuration from the environment")?;
    let client = ApiClient::new(config).context("building the backend client")?;
    let settle_delay = client.settle_delay();
    let client = Arc::new(client);

    let anchor = cli.week.unwrap_or_else(|| Local::now().date_naive());
    let week = WeekWindow::containing(anchor);
    let mut register = WeekRegister::new(client.clone(), client.clone(), client, week)
        .with_settle_delay(settle_delay);
    register.load_week(week).await;

    match cli.command {
        Command::Show => {
            print_grid(&register);
        }
        Command::Set { task, date, hours } => {
            let Some(row_idx) = find_or_add(&mut register, &task) else {
                drain_feedback(&mut register);
                bail!("the week does not accept changes");
            };
            register.edit_cell(row_idx, date, hours);
            register.save_all().await;
            print_grid(&register);
        }
        Command::AddTask { name } => {
            let Some(row_idx) = register.add_row() else {
                drain_feedback(&mut register);
                bail!("the week does not accept changes");
            };
            register.rename_task(row_idx, &name);
            print_grid(&register);
        }
        Command::DeleteTask { task, yes } => {
            let Some(row_idx) = register.find_row(&task) else {
                bail!("no task named {:?} in this week", task);
            };
            if !yes {
                bail!(
                    "pass --yes to confirm deleting {:?} and its saved entries",
                    task
                );
            }
            register.delete_row(row_idx).await;
            print_grid(&register);
        }
        Command::Save => {
            register.save_all().await;
            print_grid(&register);
        }
        Command::Submit { yes } => {
            if register.begin_submit() {
                if yes {
                    register.confirm_submit().await;
                } else {
                    register.cancel_submit();
                    drain_feedback(&mut register);
                    bail!("the week validates; pass --yes to submit it for approval");
                }
            }
            print_grid(&register);
        }
        Command::Export => {
            write_week_csv(&register.grid, io::stdout().lock())
                .context("writing the week as CSV")?;
        }
    }

    drain_feedback(&mut register);
    Ok(())
}

/// Finds the row for `task`, adding and naming a fresh one when missing.
/// Returns `None` when the week refuses mutations.
fn find_or_add(register: &mut WeekRegister, task: &str) -> Option<usize> {
    if let Some(row_idx) = register.find_row(task) {
        return Some(row_idx);
    }
    let row_idx = register.add_row()?;
    register.rename_task(row_idx, task);
    Some(row_idx)
}

fn drain_feedback(register: &mut WeekRegister) {
    for message in register.feedback.drain() {
        let tag = match message.severity {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Warning => "warn",
            Severity::Error => "error",
        };
        println!("[{}] {}", tag, message.text);
    }
}

fn print_grid(register: &WeekRegister) {
    let grid = &register.grid;
    let lock_marker = if grid.locked { " [submitted]" } else { "" };
    println!(
        "Week of {} .. {}{}",
        grid.week.start(),
        grid.week.end(),
        lock_marker
    );

    print!("{:<24}", "Task");
    for date in grid.week.dates() {
        print!("{:>7}", date.format("%a").to_string());
    }
    println!("{:>8}", "Total");

    for row in &grid.rows {
        if row.is_blank() {
            continue;
        }
        let mut row_total = Decimal::ZERO;
        print!("{:<24}", row.task_name);
        for date in grid.week.dates() {
            let hours = row.hours_on(date);
            row_total += hours;
            print!("{:>7}", hours.to_string());
        }
        println!("{:>8}", row_total.to_string());
    }

    let mut week_total = Decimal::ZERO;
    print!("{:<24}", "Daily total");
    for date in grid.week.dates() {
        let total = grid.day_total(date);
        week_total += total;
        print!("{:>7}", total.to_string());
    }
    println!("{:>8}", week_total.to_string());

    for date in grid.week.dates() {
        if let Some(name) = grid.holiday_name(date) {
            println!("  {} is a holiday: {}", date, name);
        }
        if let Some(leave) = grid.leave_on(date) {
            println!(
                "  {} has approved leave: {} ({})",
                date, leave.category, leave.duration
            );
        }
    }
}
