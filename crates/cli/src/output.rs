// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a list of items, or `empty` when there are none in text mode
///
/// JSON output is always an array, so an empty listing prints `[]`.
pub fn print_list<T: Serialize + Display>(
    items: &[T],
    format: OutputFormat,
    empty: &str,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{empty}");
            }
            for item in items {
                println!("{item}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
    }
    Ok(())
}

/// Truncate to `width` characters for column output
pub fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(width.saturating_sub(1)).collect();
    clipped.push('~');
    clipped
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
