//! Packet rate tracking
//!
//! Two independent limits, each disabled by a negative setting:
//! - more than `max-pps` packets within one second kicks at once
//! - an average of `warning-pps` or more over a tracking period counts as a
//!   warning, and `max-warnings` warnings kick
//!
//! A negative `max-warnings` keeps reporting warnings without ever kicking.
//!
//! The tracker only decides. Disconnecting is up to the host.

use bridge_config::BridgeConfig;
use std::time::{Duration, Instant};

const SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub max_pps: Option<u64>,
    pub max_pps_kick_msg: String,
    pub tracking_period: Duration,
    pub warning_pps: Option<u64>,
    /// `None` never kicks for warnings
    pub max_warnings: Option<u32>,
    pub max_warnings_kick_msg: String,
}

fn limit(value: i32) -> Option<u64> {
    u64::try_from(value).ok()
}

impl TrackerSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            max_pps: limit(config.max_pps),
            max_pps_kick_msg: config.max_pps_kick_msg.clone(),
            tracking_period: Duration::from_secs(config.tracking_period.max(1)),
            warning_pps: limit(config.warning_pps),
            max_warnings: u32::try_from(config.max_warnings).ok(),
            max_warnings_kick_msg: config.max_warnings_kick_msg.clone(),
        }
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from_config(&BridgeConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    /// A tracking period averaged above the warning rate
    Warn { pps: u64, warnings: u32 },
    /// Disconnect with this reason
    Kick(String),
}

#[derive(Debug)]
pub struct PacketTracker {
    settings: TrackerSettings,
    second_start: Instant,
    second_count: u64,
    period_start: Instant,
    period_count: u64,
    warnings: u32,
}

impl PacketTracker {
    pub fn new(settings: TrackerSettings) -> Self {
        Self::starting_at(settings, Instant::now())
    }

    pub fn starting_at(settings: TrackerSettings, now: Instant) -> Self {
        Self {
            settings,
            second_start: now,
            second_count: 0,
            period_start: now,
            period_count: 0,
            warnings: 0,
        }
    }

    pub fn warnings(&self) -> u32 {
        self.warnings
    }

    /// Count one packet received at `now`
    pub fn record(&mut self, now: Instant) -> Verdict {
        if now.duration_since(self.second_start) >= SECOND {
            self.second_start = now;
            self.second_count = 0;
        }
        self.second_count += 1;
        self.period_count += 1;

        if let Some(max) = self.settings.max_pps {
            if self.second_count > max {
                tracing::debug!("Packet rate {} exceeds max {}", self.second_count, max);
                return Verdict::Kick(
                    self.settings
                        .max_pps_kick_msg
                        .replace("%pps", &self.second_count.to_string()),
                );
            }
        }

        let elapsed = now.duration_since(self.period_start);
        if elapsed < self.settings.tracking_period {
            return Verdict::Ok;
        }

        let pps = self.period_count / elapsed.as_secs().max(1);
        self.period_start = now;
        self.period_count = 0;

        match self.settings.warning_pps {
            Some(threshold) if pps >= threshold => {
                self.warnings += 1;
                tracing::debug!("Packet rate warning {} ({} pps)", self.warnings, pps);
                match self.settings.max_warnings {
                    Some(max) if self.warnings >= max => {
                        Verdict::Kick(self.settings.max_warnings_kick_msg.clone())
                    }
                    _ => Verdict::Warn {
                        pps,
                        warnings: self.warnings,
                    },
                }
            }
            _ => Verdict::Ok,
        }
    }
}
