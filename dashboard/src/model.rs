use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label shown before the first reading has been drained.
pub const CONNECTING_LABEL: &str = "CONNECTING";

/// One sensor report exactly as published on the topic.
///
/// Field names follow the device firmware. Pollutants fed from the regional
/// monitoring station (`no2`, `so2`, `o3`) and the model score may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorPayload {
    /// Temperature in °C.
    pub suhu: f64,
    /// Relative humidity in %.
    pub kelembaban: f64,
    /// Carbon monoxide in mg/m³.
    pub co: f64,
    /// PM2.5 in µg/m³.
    pub pm25: f64,
    #[serde(default)]
    pub no2: Option<f64>,
    #[serde(default)]
    pub so2: Option<f64>,
    #[serde(default)]
    pub o3: Option<f64>,
    pub ai_label: String,
    #[serde(default)]
    pub ai_score: Option<f64>,
}

/// A decoded payload stamped with its arrival time.
///
/// Readings are never mutated after construction; a newer one replaces an
/// older one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
    pub co: f64,
    pub pm25: f64,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub o3: Option<f64>,
    pub label: String,
    pub score: Option<f64>,
    pub received_at: DateTime<Utc>,
}

impl Reading {
    pub fn from_payload(payload: SensorPayload, received_at: DateTime<Utc>) -> Self {
        Self {
            temperature: payload.suhu,
            humidity: payload.kelembaban,
            co: payload.co,
            pm25: payload.pm25,
            no2: payload.no2,
            so2: payload.so2,
            o3: payload.o3,
            label: payload.ai_label,
            score: payload.ai_score,
            received_at,
        }
    }

    /// Placeholder shown until the feed delivers something.
    pub fn sentinel(now: DateTime<Utc>) -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            co: 0.0,
            pm25: 0.0,
            no2: None,
            so2: None,
            o3: None,
            label: CONNECTING_LABEL.to_string(),
            score: None,
            received_at: now,
        }
    }

    /// Score scaled to a 0–100 gauge value. Missing scores read as 0.
    pub fn gauge_value(&self) -> u8 {
        let score = self.score.unwrap_or(0.0);
        if !score.is_finite() {
            return 0;
        }
        (score.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_without_optional_fields() {
        let json = r#"{"suhu":28.5,"kelembaban":60,"co":0.8,"pm25":35,"no2":12,"ai_label":"SEDANG","ai_score":0.91}"#;
        let payload: SensorPayload = serde_json::from_str(json).unwrap();

        assert_eq!(payload.no2, Some(12.0));
        assert_eq!(payload.so2, None);
        assert_eq!(payload.o3, None);
        assert_eq!(payload.ai_label, "SEDANG");
    }

    #[test]
    fn test_decode_rejects_missing_required_field() {
        let json = r#"{"kelembaban":60,"co":0.8,"pm25":35,"ai_label":"BAIK"}"#;
        assert!(serde_json::from_str::<SensorPayload>(json).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_type() {
        let json = r#"{"suhu":"hot","kelembaban":60,"co":0.8,"pm25":35,"ai_label":"BAIK"}"#;
        assert!(serde_json::from_str::<SensorPayload>(json).is_err());
    }

    #[test]
    fn test_gauge_value_scaling() {
        let mut reading = Reading::sentinel(Utc::now());
        assert_eq!(reading.gauge_value(), 0);

        reading.score = Some(0.91);
        assert_eq!(reading.gauge_value(), 91);

        reading.score = Some(1.7);
        assert_eq!(reading.gauge_value(), 100);

        reading.score = Some(-0.2);
        assert_eq!(reading.gauge_value(), 0);
    }

    #[test]
    fn test_sentinel() {
        let reading = Reading::sentinel(Utc::now());
        assert_eq!(reading.label, CONNECTING_LABEL);
        assert_eq!(reading.pm25, 0.0);
        assert_eq!(reading.no2, None);
    }
}
