use rand::Rng;
use serde::Serialize;

/// Sensor report in the shape the ESP32 firmware publishes.
#[derive(Debug, Clone, Serialize)]
pub struct SensorPayload {
    pub suhu: f64,
    pub kelembaban: f64,
    pub co: f64,
    pub pm25: f64,
    pub no2: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub so2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub o3: Option<f64>,
    pub ai_label: String,
    pub ai_score: f64,
}

/// Category for a PM2.5 concentration in µg/m³.
pub fn label_for_pm25(pm25: f64) -> &'static str {
    if pm25 <= 15.5 {
        "BAIK"
    } else if pm25 <= 55.4 {
        "SEDANG"
    } else if pm25 <= 150.4 {
        "TIDAK SEHAT"
    } else if pm25 <= 250.4 {
        "SANGAT TIDAK SEHAT"
    } else {
        "BERBAHAYA"
    }
}

pub fn generate(rng: &mut impl Rng) -> SensorPayload {
    let pm25 = if rng.gen_bool(0.05) {
        rng.gen_range(150.0..320.0) // 5% pollution spikes
    } else {
        rng.gen_range(5.0..90.0)
    };

    let round = |v: f64| (v * 10.0).round() / 10.0;

    SensorPayload {
        suhu: round(rng.gen_range(24.0..35.0)),
        kelembaban: round(rng.gen_range(45.0..90.0)),
        co: round(rng.gen_range(0.2..4.0)),
        pm25: round(pm25),
        no2: round(rng.gen_range(5.0..60.0)),
        so2: rng.gen_bool(0.8).then(|| round(rng.gen_range(2.0..30.0))),
        o3: rng.gen_bool(0.8).then(|| round(rng.gen_range(10.0..120.0))),
        ai_label: label_for_pm25(round(pm25)).to_string(),
        ai_score: (rng.gen_range(0.6..0.99_f64) * 100.0).round() / 100.0,
    }
}

/// A payload the dashboard must reject.
pub fn malformed(rng: &mut impl Rng) -> String {
    match rng.gen_range(0..3) {
        0 => "{\"suhu\": 27.1, \"kelembaban\":".to_string(),
        1 => "{\"kelembaban\": 60, \"co\": 0.5, \"pm25\": 12, \"ai_label\": \"BAIK\"}".to_string(),
        _ => "sensor fault".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_bands() {
        assert_eq!(label_for_pm25(10.0), "BAIK");
        assert_eq!(label_for_pm25(15.5), "BAIK");
        assert_eq!(label_for_pm25(35.0), "SEDANG");
        assert_eq!(label_for_pm25(100.0), "TIDAK SEHAT");
        assert_eq!(label_for_pm25(200.0), "SANGAT TIDAK SEHAT");
        assert_eq!(label_for_pm25(300.0), "BERBAHAYA");
    }

    #[test]
    fn test_generated_payload_is_consistent() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let payload = generate(&mut rng);
            assert_eq!(payload.ai_label, label_for_pm25(payload.pm25));
            assert!((0.0..=1.0).contains(&payload.ai_score));
            assert!((0.0..=100.0).contains(&payload.kelembaban));
        }
    }

    #[test]
    fn test_absent_optionals_are_omitted() {
        let mut payload = generate(&mut rand::thread_rng());
        payload.so2 = None;
        payload.o3 = None;
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("so2"));
        assert!(!json.contains("o3"));
        assert!(json.contains("\"no2\""));
    }

    #[test]
    fn test_malformed_does_not_parse_as_payload() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let text = malformed(&mut rng);
            let parsed: Result<serde_json::Value, _> = serde_json::from_str(&text);
            if let Ok(value) = parsed {
                assert!(value.get("suhu").is_none());
            }
        }
    }
}
