//! Number formatting for rates and amounts

/// Formats a rate for tables: 4 decimals at or above 1, 6 below, trailing
/// zeros dropped, thousands grouped.
pub fn format_rate(rate: f64) -> String {
    let fixed = if rate >= 1.0 {
        format!("{rate:.4}")
    } else {
        format!("{rate:.6}")
    };
    group_thousands(trim_zeros(&fixed))
}

/// Formats a money amount with 2 decimals and grouped thousands
pub fn format_amount(amount: f64) -> String {
    group_thousands(&format!("{amount:.2}"))
}

fn trim_zeros(fixed: &str) -> &str {
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed
    }
}

/// Inserts `,` between groups of three integer digits
fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (integer, fraction) = match unsigned.find('.') {
        Some(dot) => unsigned.split_at(dot),
        None => (unsigned, ""),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}{grouped}{fraction}")
}
