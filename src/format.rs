//! Result Formatting
//!
//! Turns the raw result strings returned by the calculation backend into
//! display strings with consistent decimal rules.
//!
//! Rules, first match wins:
//!
//! 1. Input that is not a finite decimal number is returned unchanged.
//! 2. Scientific notation is rendered fixed-point with 6 fractional digits,
//!    then trailing zeros (and a bare trailing `.`) are stripped.
//! 3. Decimal input is rendered with `max(input decimals, 3)` digits and
//!    trailing zeros are stripped, keeping at least 3 fractional digits.
//! 4. Whole numbers still carrying an operator character (`/ * + -`) are
//!    rendered with exactly 3 fractional digits.
//! 5. Anything else is printed as a plain integer.

use thiserror::Error;

/// Fractional digits kept for decimal results
const MIN_FRACTION_DIGITS: usize = 3;

/// Fractional digits used for scientific notation
const EXPONENT_FRACTION_DIGITS: usize = 6;

/// Upper bound on requested fractional digits (matches `Number.prototype.toFixed`)
const MAX_FRACTION_DIGITS: usize = 100;

/// Enough digits to print any finite f64 exactly (smallest subnormal has 1074)
const EXACT_DIGITS: usize = 1100;

const OPERATORS: [char; 4] = ['/', '*', '+', '-'];

#[derive(Debug, Error, PartialEq)]
enum FormatError {
    #[error("not a finite decimal number")]
    NotNumeric,

    #[error("{0} fractional digits exceeds the supported maximum")]
    PrecisionOutOfRange(usize),
}

/// Format a backend result for display.
///
/// Never fails: anything that cannot be formatted comes back verbatim.
///
/// ```
/// use drawcal::format::format_number;
///
/// assert_eq!(format_number("42"), "42");
/// assert_eq!(format_number("3.140000"), "3.140");
/// assert_eq!(format_number("1.5e3"), "1500");
/// assert_eq!(format_number("x = 2"), "x = 2");
/// ```
pub fn format_number(value: &str) -> String {
    match try_format(value) {
        Ok(formatted) => formatted,
        Err(FormatError::NotNumeric) => value.to_string(),
        Err(e) => {
            tracing::warn!("Error formatting number {:?}: {}", value, e);
            value.to_string()
        }
    }
}

fn try_format(value: &str) -> Result<String, FormatError> {
    let num = parse_decimal(value)?;

    if value.contains(['e', 'E']) {
        let fixed = to_fixed(num, EXPONENT_FRACTION_DIGITS)?;
        let trimmed = fixed.trim_end_matches('0');
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
        return Ok(trimmed.to_string());
    }

    if value.contains('.') || num.fract() != 0.0 {
        let input_digits = value.split('.').nth(1).map_or(0, str::len);
        let fixed = to_fixed(num, input_digits.max(MIN_FRACTION_DIGITS))?;
        return Ok(trim_fraction(fixed));
    }

    if value.contains(OPERATORS) {
        return to_fixed(num, MIN_FRACTION_DIGITS);
    }

    Ok(num.to_string())
}

/// Parse a finite decimal literal, ignoring surrounding whitespace
fn parse_decimal(value: &str) -> Result<f64, FormatError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormatError::NotNumeric);
    }

    match trimmed.parse::<f64>() {
        Ok(num) if num.is_finite() => Ok(num),
        _ => Err(FormatError::NotNumeric),
    }
}

/// Strip trailing zeros from the fraction without going below the minimum
fn trim_fraction(fixed: String) -> String {
    match fixed.split_once('.') {
        Some((int_part, frac)) if !frac.is_empty() => {
            let significant = frac.trim_end_matches('0');
            let kept = if significant.len() < MIN_FRACTION_DIGITS {
                &frac[..MIN_FRACTION_DIGITS.min(frac.len())]
            } else {
                significant
            };
            format!("{}.{}", int_part, kept)
        }
        _ => fixed,
    }
}

/// Fixed-point rendering with ties rounded away from zero on the exact
/// binary value, the way `toFixed` rounds.
///
/// Rust's own `{:.N}` rounds exact ties to even, so the exact expansion is
/// printed first and rounded by hand.
fn to_fixed(value: f64, digits: usize) -> Result<String, FormatError> {
    if digits > MAX_FRACTION_DIGITS {
        return Err(FormatError::PrecisionOutOfRange(digits));
    }

    let negative = value < 0.0;
    let exact = format!("{:.*}", EXACT_DIGITS, value.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut buf: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .collect();
    buf.resize(int_part.len() + digits, b'0');

    let round_up = frac_part
        .as_bytes()
        .get(digits)
        .map_or(false, |d| *d >= b'5');

    if round_up {
        let mut carry = true;
        for d in buf.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            buf.insert(0, b'1');
        }
    }

    let int_len = buf.len() - digits;
    let mut out = String::with_capacity(buf.len() + 2);
    if negative {
        out.push('-');
    }
    out.push_str(std::str::from_utf8(&buf[..int_len]).unwrap_or("0"));
    if digits > 0 {
        out.push('.');
        out.push_str(std::str::from_utf8(&buf[int_len..]).unwrap_or_default());
    }

    Ok(out)
}
