// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sbx - sandbox snapshot inspector

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{journal, rows, status};

#[derive(Parser)]
#[command(
    name = "sbx",
    version,
    about = "Inspect persisted sandbox snapshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List rows of a baseline file
    Baseline(rows::RowsArgs),
    /// List rows of a delta file
    Delta(rows::RowsArgs),
    /// Summarize active snapshots in a snapshot directory
    Status(status::StatusArgs),
    /// List progression journal records in a snapshot directory
    Journal(journal::JournalArgs),
}

fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Baseline(args) => rows::baseline(args),
        Commands::Delta(args) => rows::delta(args),
        Commands::Status(args) => status::handle(args),
        Commands::Journal(args) => journal::handle(args),
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
