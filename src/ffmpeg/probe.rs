/// Duration in seconds from the probe's stdout, when it is a usable
/// positive number.
pub fn parse_duration(stdout: &str) -> Option<f64> {
    let value = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    match value.parse::<f64>() {
        Ok(duration) if duration.is_finite() && duration > 0.0 => Some(duration),
        _ => None,
    }
}
