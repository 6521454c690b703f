use crossterm::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQuality {
    Good,
    Moderate,
    Unhealthy,
    Hazardous,
    Unknown,
}

impl AirQuality {
    pub fn from_label(label: &str) -> Self {
        match label {
            "BAIK" => AirQuality::Good,
            "SEDANG" => AirQuality::Moderate,
            "TIDAK SEHAT" => AirQuality::Unhealthy,
            "SANGAT TIDAK SEHAT" | "BERBAHAYA" => AirQuality::Hazardous,
            _ => AirQuality::Unknown,
        }
    }
}

/// How a label is shown on the hero card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub quality: AirQuality,
    pub hex: &'static str,
    pub icon: &'static str,
    pub message: &'static str,
}

impl Presentation {
    pub fn color(&self) -> Color {
        let channel = |i: usize| u8::from_str_radix(&self.hex[i..i + 2], 16).unwrap_or(0);
        Color::Rgb {
            r: channel(1),
            g: channel(3),
            b: channel(5),
        }
    }
}

pub fn classify(label: &str) -> Presentation {
    let quality = AirQuality::from_label(label);
    let (hex, icon, message) = match quality {
        AirQuality::Good => (
            "#4CAF50",
            "😊",
            "Fresh air! Enjoy your time outdoors.",
        ),
        AirQuality::Moderate => (
            "#2196F3",
            "😐",
            "Air quality is acceptable. Sensitive groups should take care.",
        ),
        AirQuality::Unhealthy => (
            "#FF9800",
            "😷",
            "Reduce outdoor activity. Wear a mask.",
        ),
        AirQuality::Hazardous => (
            "#F44336",
            "☠️",
            "DANGER! Stay indoors and keep windows tightly shut.",
        ),
        AirQuality::Unknown => ("#9E9E9E", "📡", "Waiting for sensor data..."),
    };

    Presentation {
        quality,
        hex,
        icon,
        message,
    }
}
