//! Value formatting for cohort cells, summary cards and chart values.
//!
//! Retention cells are fractions rendered as one-decimal percentages
//! (`0.482 -> "48.2%"`). Revenue, ARPU and LTV cells are rendered as currency
//! with en-US digit grouping and at most two fraction digits
//! (`1234.5 -> "₹1,234.5"`). Non-finite input renders as an empty string.

use crate::models::MetricKind;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFormatter {
    currency_symbol: String,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_SYMBOL)
    }
}

impl ValueFormatter {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    pub fn format(&self, value: f64, kind: MetricKind) -> String {
        if !value.is_finite() {
            return String::new();
        }

        match kind {
            MetricKind::Retention => format!("{}%", to_fixed(value * 100.0, 1)),
            MetricKind::Revenue | MetricKind::Arpu | MetricKind::Ltv => self.currency(value),
        }
    }

    pub fn currency(&self, value: f64) -> String {
        if !value.is_finite() {
            return String::new();
        }
        format!("{}{}", self.currency_symbol, group_number(value, 2))
    }
}

/// Format with the default currency symbol.
pub fn format_value(value: f64, kind: MetricKind) -> String {
    ValueFormatter::default().format(value, kind)
}

/// Plain numeric rendering with no symbol: `1.0 -> "1"`, `0.25 -> "0.25"`.
/// Used for numeric cells in the data preview.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    value.to_string()
}

/// Grouped integer, e.g. `12345 -> "12,345"`.
pub fn format_count(count: u64) -> String {
    group_digits(&count.to_string())
}

/// Chart tooltip rendering: two decimals, `%` for percentage series.
pub fn format_chart_value(value: f64, is_percent: bool) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if is_percent {
        format!("{}%", to_fixed(value, 2))
    } else {
        to_fixed(value, 2)
    }
}

/// Exact ties are only resolved up to this many fraction digits.
const MAX_TIE_DIGITS: usize = 10;

/// Fixed-point rendering with exact halves rounded away from zero, the way
/// JavaScript's `toFixed` does (`1.125 -> "1.13"`, `0.25 -> "0.3"`).
///
/// Rounding works on the stored binary value, so `2.675` (stored just below
/// the half) stays `"2.67"`. `-0.0` renders without a sign.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let value = if value == 0.0 { 0.0 } else { value };

    let tie = if digits <= MAX_TIE_DIGITS {
        round_half_up_if_tie(value.abs(), digits)
    } else {
        None
    };

    match tie {
        Some(scaled) => {
            let sign = if value < 0.0 { "-" } else { "" };
            if digits == 0 {
                return format!("{}{}", sign, scaled);
            }
            let unit = 10u128.pow(digits as u32);
            format!(
                "{}{}.{:0width$}",
                sign,
                scaled / unit,
                scaled % unit,
                width = digits
            )
        }
        // std formatting is exact apart from ties, which it sends to even
        None => format!("{:.*}", digits, value),
    }
}

/// `value * 10^digits` rounded up, when it lies exactly halfway between two
/// integers. `None` for every other value.
fn round_half_up_if_tie(value: f64, digits: usize) -> Option<u128> {
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & 0x000f_ffff_ffff_ffff;
    // value == mantissa * 2^exponent
    let (mantissa, exponent) = if biased == 0 {
        (fraction << 1, -1075)
    } else {
        (fraction | 0x0010_0000_0000_0000, biased - 1075)
    };
    if mantissa == 0 || exponent >= 0 {
        return None;
    }

    // 2 * value * 10^digits == doubled / 2^shift; a tie makes that an odd integer
    let shift = exponent.unsigned_abs();
    let doubled = (u128::from(mantissa) * 5u128.pow(digits as u32)) << (digits + 1);
    if doubled.trailing_zeros() != shift {
        return None;
    }
    Some(((doubled >> shift) + 1) / 2)
}

/// en-US grouping with at most `max_fraction` digits and trailing zeros trimmed.
fn group_number(value: f64, max_fraction: usize) -> String {
    let rendered = to_fixed(value.abs(), max_fraction);
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let is_zero = int_part.bytes().all(|b| b == b'0') && frac_part.is_empty();

    let mut out = String::with_capacity(rendered.len() + rendered.len() / 3 + 1);
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
