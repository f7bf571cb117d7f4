use std::fmt::Write;

use chrono::NaiveDateTime;
use smart_nest_common::feed::{ActuatorStatus, DisplayState};

const GAUGE_WIDTH: usize = 20;
const CHART_WIDTH: usize = 30;

/// Renders the screen as text.
pub fn render(state: &DisplayState) -> String {
    let mut screen = String::new();

    let _ = writeln!(screen, "Smart Nest ({})", updated(state.acquired_at));
    let _ = writeln!(screen);

    let _ = writeln!(screen, "Humidity        {}", gauge(state.humidity_progress()));
    let _ = writeln!(screen, "Temperature °C  {}", gauge(state.temperature_progress()));
    let _ = writeln!(screen);

    let _ = writeln!(screen, "LP Gas Level");
    let max = state.gas_levels.iter().cloned().fold(f64::MIN, f64::max);
    for (label, level) in state.time_labels.iter().zip(state.gas_levels) {
        let _ = writeln!(screen, "{label:>6} {:<CHART_WIDTH$} {level:.2}", bar(level, max));
    }
    let _ = writeln!(screen);

    let _ = writeln!(screen, "Fan Status");
    let _ = writeln!(screen, "Exhaust Fan 1  {}", fan(state.actuator1));
    let _ = write!(screen, "Exhaust Fan 2  {}", fan(state.actuator2));

    screen
}

fn updated(acquired_at: Option<NaiveDateTime>) -> String {
    match acquired_at {
        Some(at) => format!("updated {}", at.format("%H:%M:%S")),
        None => "waiting for data".to_string(),
    }
}

/// A progress bar for a value where 1.0 is full. Out of range values are drawn clamped.
fn gauge(progress: f64) -> String {
    let filled = (progress.clamp(0.0, 1.0) * GAUGE_WIDTH as f64).round() as usize;

    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(GAUGE_WIDTH - filled),
        progress * 100.0
    )
}

fn bar(level: f64, max: f64) -> String {
    if max <= 0.0 || level <= 0.0 {
        return String::new();
    }

    "=".repeat(((level / max) * CHART_WIDTH as f64).round() as usize)
}

fn fan(status: ActuatorStatus) -> String {
    let state = if status.active { "ON " } else { "OFF" };

    format!("{state} | Speed | {}", status.speed)
}
