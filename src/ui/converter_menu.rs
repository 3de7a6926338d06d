//! Interactive currency converter menu

use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};

use super::format::format_amount;
use super::rates_view::{render_currency_list, run_rates_prompt};
use super::{is_exit_command, Console};
use crate::converter::{convert, list_currencies, normalize_code, parse_amount};
use crate::data::RateTable;
use crate::resolver::{exchange_rate, find_anchor};

/// Runs the converter menu until the user exits or input ends
pub fn run_converter_menu<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    table: &RateTable,
) -> io::Result<()> {
    let currencies = list_currencies(table);
    if currencies.is_empty() {
        console.error("no currencies available; try `fxrates refresh`")?;
        return Ok(());
    }

    console.header("CURRENCY CONVERTER")?;
    console.line(format!(
        "Currencies available: {}",
        currencies.len().to_string().green()
    ))?;

    loop {
        console.header("MENU")?;
        console.line(format!("1. {}", "Convert an amount".green()))?;
        console.line(format!("2. {}", "Show exchange rate".green()))?;
        console.line(format!("3. {}", "List available currencies".green()))?;
        console.line(format!("4. {}", "Show all rates against a currency".green()))?;
        console.line(format!("0. {}", "Exit".red()))?;
        console.blank()?;

        let Some(choice) = console.prompt("Choose an action: ")? else {
            return Ok(());
        };

        match choice.as_str() {
            "1" => convert_flow(console, table, &currencies)?,
            "2" => rate_flow(console, table, &currencies)?,
            "3" => {
                console.section("AVAILABLE CURRENCIES")?;
                console.line(format!(
                    "Total currencies: {}",
                    currencies.len().to_string().green()
                ))?;
                console.blank()?;
                render_currency_list(console, &currencies)?;
            }
            "4" => run_rates_prompt(console, table)?,
            other if is_exit_command(other) => {
                console.line("Goodbye!".yellow())?;
                return Ok(());
            }
            _ => console.error("invalid choice, try again")?,
        }
    }
}

/// Asks for a currency code that appears in `currencies`
///
/// Returns `None` after reporting an error, or at end of input.
fn read_known_code<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    message: &str,
    currencies: &[String],
) -> io::Result<Option<String>> {
    let Some(input) = console.prompt(message)? else {
        return Ok(None);
    };

    match normalize_code(&input) {
        Ok(code) if currencies.binary_search(&code).is_ok() => Ok(Some(code)),
        Ok(code) => {
            console.error(format!("currency '{code}' not found"))?;
            Ok(None)
        }
        Err(e) => {
            console.error(e)?;
            Ok(None)
        }
    }
}

/// Reads a source and target currency, showing the choices first
fn read_pair<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    currencies: &[String],
) -> io::Result<Option<(String, String)>> {
    console.line("Available currencies:")?;
    render_currency_list(console, currencies)?;
    console.blank()?;

    let Some(from) = read_known_code(console, "Source currency code: ", currencies)? else {
        return Ok(None);
    };
    let Some(to) = read_known_code(console, "Target currency code: ", currencies)? else {
        return Ok(None);
    };
    Ok(Some((from, to)))
}

fn convert_flow<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    table: &RateTable,
    currencies: &[String],
) -> io::Result<()> {
    console.section("CONVERT AN AMOUNT")?;
    let Some((from, to)) = read_pair(console, currencies)? else {
        return Ok(());
    };

    let Some(input) = console.prompt("Amount to convert: ")? else {
        return Ok(());
    };
    let amount = match parse_amount(&input) {
        Ok(amount) => amount,
        Err(e) => return console.error(e),
    };

    match convert(table, amount, &from, &to) {
        Ok(result) => {
            console.header("CONVERSION RESULT")?;
            console.line(format!(
                "  {} {} = {} {}",
                format_amount(amount),
                from.as_str().yellow(),
                format_amount(result).green(),
                to.as_str().yellow()
            ))?;
            console.blank()
        }
        Err(e) => console.error(format!("cannot convert {from} to {to}: {e}")),
    }
}

fn rate_flow<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    table: &RateTable,
    currencies: &[String],
) -> io::Result<()> {
    console.section("EXCHANGE RATE")?;
    let Some((from, to)) = read_pair(console, currencies)? else {
        return Ok(());
    };

    match exchange_rate(table, &from, &to) {
        Ok(rate) => {
            console.header("EXCHANGE RATE")?;
            console.line(format!(
                "  1 {} = {} {}",
                from.as_str().yellow(),
                format!("{rate:.6}").green(),
                to.as_str().yellow()
            ))?;
            if let Ok(anchor) = find_anchor(table, &from) {
                if anchor != from {
                    console.line(format!("  (quoted via {anchor} rates)"))?;
                }
            }
            console.blank()
        }
        Err(e) => console.error(format!("cannot price {from} in {to}: {e}")),
    }
}
