//! Number formatting shared by the report and the prompts.

/// Format a whole number with thousands separators: `-1234567.8` → `-1,234,568`.
pub fn thousands(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// Dollar amount without cents.
pub fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", thousands(-value))
    } else {
        format!("${}", thousands(value))
    }
}

/// Dollar amount for an optional statistic.
pub fn opt_money(value: Option<f64>) -> String {
    value.map(money).unwrap_or_else(|| "n/a".to_string())
}

/// Percentage with the given number of decimals, `n/a` when undefined.
pub fn percent(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}%", decimals, v),
        _ => "n/a".to_string(),
    }
}
