// Taka display formatting (fixed currency label, en-US digit grouping)

pub const CURRENCY_LABEL: &str = "Tk";

/// `Tk 279,715`
pub fn format_tk(value: f64) -> String {
    format!("{} {}", CURRENCY_LABEL, group_number(value))
}

/// Same as `format_tk`, with "-" for a missing value
pub fn format_tk_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format_tk(v),
        None => "-".to_string(),
    }
}

/// Chart axis tick in thousands: `Tk 279.715k`, or `0`
pub fn axis_tick(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    format!("{} {}k", CURRENCY_LABEL, plain_number(value / 1000.0))
}

/// Comma thousands separators, at most three fraction digits
pub fn group_number(value: f64) -> String {
    let (negative, digits, frac) = split_rounded(value);

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}{}{}", sign, grouped, frac)
}

fn plain_number(value: f64) -> String {
    let (negative, int_part, frac) = split_rounded(value);
    let sign = if negative { "-" } else { "" };
    format!("{}{}{}", sign, int_part, frac)
}

// Round to 3 decimals and split into sign, integer digits and ".xyz" suffix
fn split_rounded(value: f64) -> (bool, String, String) {
    if !value.is_finite() {
        return (false, "0".to_string(), String::new());
    }

    // value * 1000 must stay within f64's exact integer range (2^53)
    if value.abs() >= 9.0e12 {
        return (value < 0.0, format!("{:.0}", value.abs().round()), String::new());
    }

    let scaled = (value.abs() * 1000.0).round();
    let int_part = (scaled / 1000.0).trunc();
    let millis = (scaled - int_part * 1000.0) as u64;

    let frac = if millis == 0 {
        String::new()
    } else {
        format!(".{:03}", millis).trim_end_matches('0').to_string()
    };

    (value < 0.0 && scaled > 0.0, format!("{:.0}", int_part), frac)
}
