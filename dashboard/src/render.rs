//! Terminal dashboard.
//!
//! The render loop is synchronous and owns the [`Snapshot`]. Each cycle drains
//! the inbox, classifies the current label and redraws the whole page, then
//! sleeps for the configured refresh interval.

use crate::classify::{classify, Presentation};
use crate::config::DisplayConfig;
use crate::errors::Result;
use crate::inbox::Inbox;
use crate::metrics::RENDER_CYCLES_TOTAL;
use crate::snapshot::Snapshot;
use chrono::Local;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{Clear, ClearType};
use std::io::Write;
use tracing::{debug, error};

const PAGE_WIDTH: usize = 60;
const GAUGE_WIDTH: usize = 30;
const MAP_COLUMNS: usize = 21;
const MAP_ROWS: usize = 5;
const MAP_ZOOM: u8 = 14;
const ABSENT: &str = "—";

pub struct Dashboard<W: Write> {
    inbox: Inbox,
    snapshot: Snapshot,
    display: DisplayConfig,
    out: W,
}

impl<W: Write> Dashboard<W> {
    pub fn new(inbox: Inbox, display: DisplayConfig, out: W) -> Self {
        Self {
            inbox,
            snapshot: Snapshot::new(),
            display,
            out,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// One refresh: drain, classify, redraw. Never blocks.
    pub fn run_cycle(&mut self) -> Result<Presentation> {
        if self.snapshot.refresh(&self.inbox) {
            debug!("Snapshot updated to {}", self.snapshot.current().label);
        }

        let presentation = classify(&self.snapshot.current().label);
        draw(&mut self.out, &self.snapshot, &presentation, &self.display)?;
        RENDER_CYCLES_TOTAL.inc();
        Ok(presentation)
    }

    /// Redraws forever. Drawing errors are logged and the loop carries on.
    pub fn run(mut self) -> ! {
        loop {
            if let Err(e) = self.run_cycle() {
                error!("Failed to draw dashboard: {}", e);
            }
            std::thread::sleep(self.display.refresh);
        }
    }
}

/// Writes a full page for the snapshot to `out`, replacing whatever was on screen.
pub fn draw<W: Write>(
    out: &mut W,
    snapshot: &Snapshot,
    presentation: &Presentation,
    display: &DisplayConfig,
) -> Result<()> {
    let reading = snapshot.current();
    let accent = presentation.color();

    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;

    queue!(
        out,
        SetAttribute(Attribute::Bold),
        Print("🌿 Air Watch\n"),
        SetAttribute(Attribute::Reset),
        Print(format!(
            "Real-time air quality monitoring | {}\n\n",
            display.site_name
        )),
    )?;

    // Hero card
    let hero = [
        String::new(),
        presentation.icon.to_string(),
        "Air status".to_string(),
        reading.label.clone(),
        format!("\"{}\"", presentation.message),
        String::new(),
    ];
    for line in &hero {
        queue!(
            out,
            SetBackgroundColor(accent),
            SetForegroundColor(Color::White),
            Print(centered(line, PAGE_WIDTH)),
            ResetColor,
            Print("\n"),
        )?;
    }

    // Gauge and last update
    let value = reading.gauge_value();
    queue!(
        out,
        Print("\nAI confidence  "),
        SetForegroundColor(accent),
        Print(gauge_bar(value, GAUGE_WIDTH)),
        ResetColor,
        Print(format!(" {}\n\n", value)),
        SetAttribute(Attribute::Bold),
        Print("🕒 Last update\n"),
        SetAttribute(Attribute::Reset),
    )?;
    if !snapshot.is_live() {
        queue!(out, Print("Waiting for update...\n"))?;
    } else {
        let local = reading.received_at.with_timezone(&Local);
        queue!(
            out,
            Print(format!("Time: {}\n", local.format("%H:%M:%S"))),
            Print(format!("Date: {}\n", local.format("%d %B %Y"))),
        )?;
    }

    // Parameter cards
    queue!(
        out,
        SetAttribute(Attribute::Bold),
        Print("\n📊 Environment\n"),
        SetAttribute(Attribute::Reset),
        Print(format!(
            "🌡️  Temperature  {:<14} 💧 Humidity  {}\n",
            format_value(Some(reading.temperature), "°C"),
            format_value(Some(reading.humidity), "%"),
        )),
        Print("🌫️  PM2.5        "),
        SetForegroundColor(accent),
        Print(format!("{:<14}", format_value(Some(reading.pm25), "µg/m³"))),
        ResetColor,
        Print(" 🚗 CO        "),
        SetForegroundColor(accent),
        Print(format_value(Some(reading.co), "mg/m³")),
        ResetColor,
        Print("\n"),
    )?;

    if display.show_details {
        queue!(
            out,
            SetAttribute(Attribute::Bold),
            Print("\n🔍 Other pollutants (regional station)\n"),
            SetAttribute(Attribute::Reset),
            Print(format!(
                "NO₂ {:<12} SO₂ {:<12} Ozone {}\n",
                format_value(reading.no2, "µg"),
                format_value(reading.so2, "µg"),
                format_value(reading.o3, "µg"),
            )),
        )?;
    }

    queue!(
        out,
        SetAttribute(Attribute::Bold),
        Print("\n📍 Sensor location\n"),
        SetAttribute(Attribute::Reset),
    )?;
    for line in map_lines(display.latitude, display.longitude) {
        queue!(out, Print(line), Print("\n"))?;
    }

    queue!(
        out,
        Print(format!("\n{}\n", "─".repeat(PAGE_WIDTH))),
        Print(format!(
            "Refreshing every {}s\n",
            display.refresh.as_secs()
        )),
    )?;

    out.flush()?;
    Ok(())
}

pub fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{} {}", v, unit),
        _ => ABSENT.to_string(),
    }
}

pub fn gauge_bar(value: u8, width: usize) -> String {
    let value = usize::from(value.min(100));
    let filled = (value * width + 50) / 100;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

/// A framed grid with one marker at the sensor position, plus its coordinates.
pub fn map_lines(latitude: f64, longitude: f64) -> Vec<String> {
    let mut lines = Vec::with_capacity(MAP_ROWS + 4);
    lines.push(format!("┌{}┐", "─".repeat(MAP_COLUMNS)));
    for row in 0..MAP_ROWS {
        let cells: String = (0..MAP_COLUMNS)
            .map(|col| {
                if row == MAP_ROWS / 2 && col == MAP_COLUMNS / 2 {
                    '●'
                } else {
                    '·'
                }
            })
            .collect();
        lines.push(format!("│{}│", cells));
    }
    lines.push(format!("└{}┘", "─".repeat(MAP_COLUMNS)));
    lines.push(format!("{:.6}, {:.6}", latitude, longitude));
    lines.push(format!(
        "https://www.openstreetmap.org/?mlat={lat:.6}&mlon={lon:.6}#map={zoom}/{lat:.6}/{lon:.6}",
        lat = latitude,
        lon = longitude,
        zoom = MAP_ZOOM
    ));
    lines
}

fn centered(text: &str, width: usize) -> String {
    format!("{:^width$}", text, width = width)
}
