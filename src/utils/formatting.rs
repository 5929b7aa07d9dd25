//! Formatting utilities used for CLI outputs.

pub fn mins2readable(mins: i64) -> String {
    let abs_m = mins.abs();
    let hours = abs_m / 60;
    let minutes = abs_m % 60;
    let sign = if mins < 0 { "-" } else { "" };
    format!("{}{:02}h {:02}m", sign, hours, minutes)
}

pub fn secs2readable(secs: i64) -> String {
    mins2readable(secs / 60)
}

pub fn km(value: f64) -> String {
    format!("{:.2} km", value)
}

pub fn money(value: f64) -> String {
    format!("{:.2}", value)
}

/// "#12" for a matched location id, "--" otherwise.
pub fn location_ref(id: Option<i64>) -> String {
    id.map(|i| format!("#{i}")).unwrap_or_else(|| "--".to_string())
}
