use crate::errors::{Error, Result};
use crate::model::SensorPayload;

const TEMP_MIN: f64 = -50.0;
const TEMP_MAX: f64 = 100.0;
const HUMIDITY_MIN: f64 = 0.0;
const HUMIDITY_MAX: f64 = 100.0;

/// Rejects payloads whose values cannot come from a working sensor.
///
/// The model score is left alone; it is clamped when displayed.
pub fn validate(payload: &SensorPayload) -> Result<()> {
    if !payload.suhu.is_finite() || payload.suhu < TEMP_MIN || payload.suhu > TEMP_MAX {
        return Err(Error::Validation(format!(
            "Temperature {} out of range [{}, {}]",
            payload.suhu, TEMP_MIN, TEMP_MAX
        )));
    }

    if !payload.kelembaban.is_finite()
        || payload.kelembaban < HUMIDITY_MIN
        || payload.kelembaban > HUMIDITY_MAX
    {
        return Err(Error::Validation(format!(
            "Humidity {} out of range [{}, {}]",
            payload.kelembaban, HUMIDITY_MIN, HUMIDITY_MAX
        )));
    }

    let concentrations = [
        ("co", Some(payload.co)),
        ("pm25", Some(payload.pm25)),
        ("no2", payload.no2),
        ("so2", payload.so2),
        ("o3", payload.o3),
    ];
    for (name, value) in concentrations {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::Validation(format!(
                    "Concentration {} must be non-negative, got {}",
                    name, v
                )));
            }
        }
    }

    if payload.ai_label.trim().is_empty() {
        return Err(Error::Validation("Label cannot be empty".to_string()));
    }

    Ok(())
}
