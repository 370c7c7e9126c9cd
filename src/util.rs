// Parsing and number helpers.
//
// All of the forgiving cell handling lives here so the normalizer and the
// reports can work with typed values only.
use num_format::{Locale, ToFormattedString};

/// Coerce a registrations cell to a number.
///
/// - Trims whitespace; empty cells are `None`.
/// - Rejects text such as `N/A` or `-` (any letter other than an exponent
///   marker).
/// - Thousands separators are not accepted: `"1,000"` is text, not a count.
/// - Only finite values are accepted.
pub fn parse_registrations(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Decode ISO-8859-1 bytes. Every byte is the code point of the same value,
/// so this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Percent change from `prev` to `cur`. Undefined when `prev` is zero.
pub fn pct_change(prev: f64, cur: f64) -> Option<f64> {
    if prev == 0.0 {
        return None;
    }
    let v = (cur - prev) * 100.0 / prev;
    v.is_finite().then_some(v)
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    Some(v.iter().sum::<f64>() / v.len() as f64)
}

/// Render a registration figure with fixed decimals and thousands
/// separators, e.g. `1,234,567.89`.
pub fn format_number(n: f64, decimals: usize) -> String {
    // Round first so the sign check below sees what is actually printed.
    let s = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };
    // Counts never exceed u64; the integer part gets `num-format` commas.
    let mut res = int_part
        .parse::<u64>()
        .unwrap_or(0)
        .to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // `-0.0` (or anything that rounds to zero) prints without a sign.
    let rounds_to_zero = !res.chars().any(|c| c.is_ascii_digit() && c != '0');
    if n.is_sign_negative() && !rounds_to_zero {
        format!("-{}", res)
    } else {
        res
    }
}

/// Record and manufacturer counts for status lines, e.g. `9,855`.
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Growth figures render as `12.3%`, undefined ones as `n/a`.
pub fn format_pct(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.1}%", v),
        None => "n/a".to_string(),
    }
}
