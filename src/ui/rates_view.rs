//! Rate table and currency list rendering

use crossterm::style::Stylize;
use indexmap::IndexMap;
use std::io::{self, BufRead, Write};

use super::format::format_rate;
use super::{is_exit_command, Console};
use crate::converter::{list_anchors, list_currencies, normalize_code};
use crate::data::RateTable;
use crate::resolver::rates_relative_to;

const RATES_PER_LINE: usize = 4;
const CODES_PER_LINE: usize = 5;

/// Prints every rate against `base`, sorted by code, four per line
pub fn render_rates<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    base: &str,
    rates: &IndexMap<String, f64>,
) -> io::Result<()> {
    console.header(&format!("EXCHANGE RATES AGAINST {base}"))?;

    let mut sorted: Vec<(&String, &f64)> = rates.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    for chunk in sorted.chunks(RATES_PER_LINE) {
        let cells: Vec<String> = chunk
            .iter()
            .map(|(code, rate)| {
                format!(
                    "{}: {}",
                    code.as_str().green(),
                    format_rate(**rate).yellow()
                )
            })
            .collect();
        console.line(format!("  {}", cells.join("  |  ")))?;
    }

    console.blank()?;
    console.line(format!(
        "Total currencies: {}",
        rates.len().to_string().green()
    ))?;
    console.blank()
}

/// Prints currency codes, five per line
pub fn render_currency_list<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    codes: &[String],
) -> io::Result<()> {
    for chunk in codes.chunks(CODES_PER_LINE) {
        let cells: Vec<String> = chunk
            .iter()
            .map(|code| code.as_str().green().to_string())
            .collect();
        console.line(format!("  {}", cells.join("  ")))?;
    }
    Ok(())
}

/// Repeatedly asks for a base currency and prints all rates against it
///
/// Leaves on an exit command or at end of input.
pub fn run_rates_prompt<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    table: &RateTable,
) -> io::Result<()> {
    console.header("EXCHANGE RATE VIEWER")?;
    console.line(format!(
        "Base currencies in cache: {}",
        list_anchors(table).join(", ").green()
    ))?;
    console.line(format!(
        "Currencies available: {}",
        list_currencies(table).len().to_string().green()
    ))?;
    console.blank()?;

    loop {
        let Some(input) = console.prompt("Enter a base currency code ('exit' to leave): ")? else {
            return Ok(());
        };
        if is_exit_command(&input) {
            return Ok(());
        }

        let base = match normalize_code(&input) {
            Ok(code) => code,
            Err(e) => {
                console.error(e)?;
                continue;
            }
        };

        match rates_relative_to(table, &base) {
            Ok(rates) => render_rates(console, &base, &rates)?,
            Err(e) => console.error(e)?,
        }
    }
}
