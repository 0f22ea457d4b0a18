/// Formats a number the way the card host prints numbers.
///
/// Integral values drop the fraction, magnitudes outside `[1e-6, 1e21)` use
/// exponent notation with an explicit sign, and negative zero prints as `0`.
pub fn format_number(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }

    let abs = v.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{v}");
    }

    let raw = format!("{v:e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => raw,
    }
}
