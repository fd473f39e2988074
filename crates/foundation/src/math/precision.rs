//! Precision policies.
//!
//! Deterministic float ordering plus the rounding and number formatting
//! rules shared by tooltips, legends and axes.

use core::cmp::Ordering;

/// Canonicalize a floating-point value for deterministic ordering.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Deterministic total ordering for floats.
///
/// Prefer this any time you sort floats or use them in ordered keys.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

/// Rounds to a fixed number of decimals (`round_to(1.005, 2)` style, half away from zero).
pub fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

/// Decimal exponent of `|v|` (`123.0 -> 2`, `0.05 -> -2`). Zero maps to 0.
pub fn decimal_exponent(v: f64) -> i32 {
    if v == 0.0 || !v.is_finite() {
        return 0;
    }
    v.abs().log10().floor() as i32
}

/// Rounds to `digits` significant digits.
pub fn round_significant(v: f64, digits: u32) -> f64 {
    if v == 0.0 || !v.is_finite() {
        return v;
    }
    let exp = decimal_exponent(v);
    round_to(v, digits as i32 - 1 - exp)
}

/// `digits` significant digits with insignificant trailing zeros trimmed,
/// switching to exponent notation for very large or very small values
/// (`5.0 -> "5"`, `12.345 -> "12.3"`, `1234.5 -> "1.23e+3"`).
pub fn format_significant(v: f64, digits: u32) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let digits = digits.max(1);
    let r = canonical_f64(round_significant(v, digits));
    if r == 0.0 {
        return "0".to_string();
    }
    let exp = decimal_exponent(r);
    if exp < -7 || exp >= digits as i32 {
        let mantissa = r / 10f64.powi(exp);
        let m = trim_fraction(format!("{:.*}", (digits - 1) as usize, mantissa));
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{m}e{sign}{}", exp.abs());
    }
    let decimals = (digits as i32 - 1 - exp).max(0) as usize;
    trim_fraction(format!("{r:.decimals$}"))
}

/// Rounds to `digits` significant digits, then prints at least
/// `min_decimals` fractional digits; padding zeros may exceed `digits`
/// (`0.0 -> "0.00"`, `10.0 -> "10.00"`, `12.345 -> "12.30"`, `0.001234 -> "0.00123"`).
pub fn format_significant_padded(v: f64, digits: u32, min_decimals: usize) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let r = canonical_f64(round_significant(v, digits.max(1)));
    let needed = if r == 0.0 {
        0
    } else {
        (digits as i32 - 1 - decimal_exponent(r)).max(0) as usize
    };
    let decimals = needed.max(min_decimals);
    format!("{r:.decimals$}")
}

fn trim_fraction(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::{
        canonical_f64, format_significant, format_significant_padded, round_significant,
        round_to, stable_total_cmp_f64,
    };
    use core::cmp::Ordering;

    #[test]
    fn canonicalizes_negative_zero() {
        assert_eq!(canonical_f64(-0.0), 0.0);
        assert_eq!(canonical_f64(0.0), 0.0);
    }

    #[test]
    fn stable_cmp_is_total_and_deterministic() {
        assert_eq!(stable_total_cmp_f64(1.0, 2.0), Ordering::Less);
        assert_eq!(stable_total_cmp_f64(f64::NAN, f64::NAN), Ordering::Equal);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(round_significant(12345.0, 3), 12300.0);
        assert!((round_significant(0.0012345, 3) - 0.00123).abs() < 1e-12);
    }

    #[test]
    fn significant_formatting_trims() {
        assert_eq!(format_significant(5.0, 3), "5");
        assert_eq!(format_significant(12.345, 3), "12.3");
        assert_eq!(format_significant(0.5, 3), "0.5");
        assert_eq!(format_significant(-0.0, 3), "0");
        assert_eq!(format_significant(1234.5, 3), "1.23e+3");
        assert_eq!(format_significant(999.7, 3), "1e+3");
    }

    #[test]
    fn padded_formatting_keeps_two_decimals() {
        assert_eq!(format_significant_padded(0.0, 3, 2), "0.00");
        assert_eq!(format_significant_padded(5.0, 3, 2), "5.00");
        assert_eq!(format_significant_padded(10.0, 3, 2), "10.00");
        assert_eq!(format_significant_padded(12.345, 3, 2), "12.30");
        assert_eq!(format_significant_padded(0.0012345, 3, 2), "0.00123");
    }
}
