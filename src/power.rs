use std::process::Command;
use std::time::Duration;

use chrono::NaiveTime;

pub const BATTERY_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
pub const CLOCK_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub percent: u8,
    pub charging: bool,
}

/// Pulls the battery line out of `pmset -g batt` output. Returns `None` on
/// machines without a battery or when the output is unrecognizable; the UI
/// then simply omits the battery chip.
pub fn parse_pmset_output(output: &str) -> Option<BatteryStatus> {
    for line in output.lines() {
        let mut sections = line.split(';');
        let head = sections.next().unwrap_or(line);
        let Some(token) = head.split_whitespace().last() else {
            continue;
        };
        let Some(stripped) = token.strip_suffix('%') else {
            continue;
        };
        let Ok(percent) = stripped.parse::<u8>() else {
            continue;
        };
        if percent > 100 {
            continue;
        }
        let charging = sections
            .next()
            .map(|state| state.trim() == "charging")
            .unwrap_or(false);
        return Some(BatteryStatus { percent, charging });
    }
    None
}

pub fn read_battery() -> Option<BatteryStatus> {
    let output = match Command::new("pmset").args(["-g", "batt"]).output() {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            log::debug!("power: pmset exited with {}", output.status);
            return None;
        }
        Err(err) => {
            log::debug!("power: pmset unavailable: {err}");
            return None;
        }
    };
    parse_pmset_output(&String::from_utf8_lossy(&output.stdout))
}

pub fn battery_label(status: BatteryStatus) -> String {
    if status.charging {
        format!("⚡ {}%", status.percent)
    } else {
        format!("{}%", status.percent)
    }
}

pub fn clock_text(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
