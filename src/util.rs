pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Seconds with one decimal, e.g. "42.5 s"
pub fn format_secs(secs: f64) -> String {
    format!("{:.1} s", secs)
}
