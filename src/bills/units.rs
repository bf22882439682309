use serde_json::Value;

use crate::{
    constants::OCTAS_PER_APT,
    error::{AppError, Result},
};

/// Octas (base units) to APT. Plain float division, no rounding.
pub fn octas_to_apt(octas: u64) -> f64 {
    octas as f64 / OCTAS_PER_APT as f64
}

/// APT to octas, truncating any fraction below one octa.
pub fn apt_to_octas(apt: f64) -> Result<u64> {
    if !apt.is_finite() || apt < 0.0 {
        return Err(AppError::BadRequest(format!(
            "Amount must be a non-negative number, got {apt}"
        )));
    }
    let octas = (apt * OCTAS_PER_APT as f64).floor();
    if octas > u64::MAX as f64 {
        return Err(AppError::BadRequest(format!("Amount {apt} is too large")));
    }
    Ok(octas as u64)
}

/// Reads an integer field from a view result. Aptos serializes `u64` and
/// wider as decimal strings, smaller integers as JSON numbers.
pub fn parse_u64_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Fixed-decimal display used by the dashboard (`toFixed(4)` in the UI).
pub fn format_apt(amount: f64, decimals: usize) -> String {
    format!("{amount:.decimals$} APT")
}
