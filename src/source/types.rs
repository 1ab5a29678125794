use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quick laps are those under this multiple of the fastest lap time.
pub const QUICK_LAP_THRESHOLD: f64 = 1.07;

// -----------------------------------------------------------------------
// Session identity
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    Practice1,
    Practice2,
    Practice3,
    Qualifying,
    Sprint,
    Race,
}

impl SessionType {
    pub const ALL: [SessionType; 6] = [
        SessionType::Practice1,
        SessionType::Practice2,
        SessionType::Practice3,
        SessionType::Qualifying,
        SessionType::Sprint,
        SessionType::Race,
    ];

    /// Short identifier used in URLs ("FP1", "Q", "R", ...).
    pub fn code(&self) -> &'static str {
        match self {
            SessionType::Practice1 => "FP1",
            SessionType::Practice2 => "FP2",
            SessionType::Practice3 => "FP3",
            SessionType::Qualifying => "Q",
            SessionType::Sprint => "S",
            SessionType::Race => "R",
        }
    }

    /// Human-readable session name as published in the timing data.
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionType::Practice1 => "Practice 1",
            SessionType::Practice2 => "Practice 2",
            SessionType::Practice3 => "Practice 3",
            SessionType::Qualifying => "Qualifying",
            SessionType::Sprint => "Sprint",
            SessionType::Race => "Race",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.display_name() == name)
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid session type '{0}'. Must be one of: FP1, FP2, FP3, Q, S, R")]
pub struct ParseSessionTypeError(pub String);

impl FromStr for SessionType {
    type Err = ParseSessionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == upper)
            .ok_or_else(|| ParseSessionTypeError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub season: i32,
    pub round: u32,
    pub kind: SessionType,
}

impl SessionId {
    pub fn new(season: i32, round: u32, kind: SessionType) -> Self {
        Self {
            season,
            round,
            kind,
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} R{} {}", self.season, self.round, self.kind)
    }
}

/// What to pull in when loading a session. Telemetry is the slow path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub laps: bool,
    pub telemetry: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            laps: true,
            telemetry: false,
        }
    }
}

impl LoadOptions {
    pub fn with_telemetry() -> Self {
        Self {
            laps: true,
            telemetry: true,
        }
    }
}

// -----------------------------------------------------------------------
// Schedule records
// -----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Source-assigned identifier for the meeting.
    pub key: i64,
    /// 0 for testing events.
    pub round: u32,
    pub name: String,
    pub country: String,
    pub location: String,
    pub date: Option<DateTime<Utc>>,
    pub format: String,
    pub sessions: Vec<EventSession>,
}

impl EventRecord {
    pub fn is_testing(&self) -> bool {
        self.name.contains("Testing")
    }

    pub fn session(&self, kind: SessionType) -> Option<&EventSession> {
        self.sessions.iter().find(|s| s.kind == Some(kind))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSession {
    /// Source-assigned identifier for the session.
    pub key: i64,
    pub name: String,
    /// `None` for sessions outside the six supported types (e.g. sprint shootout).
    pub kind: Option<SessionType>,
    pub date: Option<DateTime<Utc>>,
}

// -----------------------------------------------------------------------
// Loaded session
// -----------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// Source-assigned identifier, used for follow-up telemetry requests.
    pub key: i64,
    pub name: String,
    pub event: EventRecord,
    pub date: Option<DateTime<Utc>>,
    pub total_laps: Option<u32>,
    pub results: Vec<ResultRecord>,
    pub laps: Vec<LapRecord>,
    pub telemetry_loaded: bool,
}

impl Session {
    /// Laps of one driver, matched case-insensitively on the driver code.
    pub fn laps_for<'a>(&'a self, driver: &str) -> Vec<&'a LapRecord> {
        self.laps
            .iter()
            .filter(|lap| lap.driver.eq_ignore_ascii_case(driver))
            .collect()
    }

    pub fn quick_laps(&self) -> Vec<&LapRecord> {
        quick_laps(self.laps.iter())
    }

    pub fn fastest_lap(&self) -> Option<&LapRecord> {
        pick_fastest(self.laps.iter())
    }

    /// Driver codes in order of first appearance in the lap data.
    pub fn lap_drivers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for lap in &self.laps {
            if !seen.contains(&lap.driver.as_str()) {
                seen.push(lap.driver.as_str());
            }
        }
        seen
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverRecord {
    pub driver_number: String,
    pub abbreviation: String,
    pub first_name: String,
    pub last_name: String,
    pub team_name: String,
    /// Hex colour without the leading `#`.
    pub team_color: Option<String>,
    pub country_code: Option<String>,
}

impl DriverRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultTime {
    /// Total elapsed time (winner, or best time in qualifying).
    Elapsed(f64),
    /// Gap to the winner in seconds.
    Behind(f64),
    /// Gap reported as text, e.g. "+1 LAP".
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub position: Option<u32>,
    pub driver: DriverRecord,
    pub time: Option<ResultTime>,
    pub status: Option<String>,
    pub points: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapRecord {
    pub driver: String,
    pub driver_number: String,
    pub team: String,
    pub lap_number: u32,
    /// Seconds.
    pub lap_time: Option<f64>,
    pub sector_times: [Option<f64>; 3],
    pub compound: Option<String>,
    pub tyre_life: Option<u32>,
    pub is_personal_best: bool,
    pub position: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    pub pit_out_time: Option<DateTime<Utc>>,
    pub pit_in_time: Option<DateTime<Utc>>,
}

/// Laps strictly faster than 107% of the fastest lap among `laps`.
pub fn quick_laps<'a>(laps: impl IntoIterator<Item = &'a LapRecord>) -> Vec<&'a LapRecord> {
    let timed: Vec<&LapRecord> = laps.into_iter().filter(|l| l.lap_time.is_some()).collect();
    let Some(fastest) = timed
        .iter()
        .filter_map(|l| l.lap_time)
        .min_by(|a, b| a.total_cmp(b))
    else {
        return Vec::new();
    };
    let threshold = fastest * QUICK_LAP_THRESHOLD;
    timed
        .into_iter()
        .filter(|l| l.lap_time.is_some_and(|t| t < threshold))
        .collect()
}

/// Fastest lap among those flagged as a personal best.
pub fn pick_fastest<'a>(laps: impl IntoIterator<Item = &'a LapRecord>) -> Option<&'a LapRecord> {
    laps.into_iter()
        .filter(|l| l.is_personal_best)
        .filter_map(|l| l.lap_time.map(|t| (t, l)))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, lap)| lap)
}

// -----------------------------------------------------------------------
// Telemetry
// -----------------------------------------------------------------------

/// Channel data for a single lap. Optional channels are `None` when the
/// source did not report them at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    /// Metres from the start of the lap.
    pub distance: Vec<f64>,
    pub speed: Vec<f64>,
    pub throttle: Vec<f64>,
    pub brake: Vec<f64>,
    pub rpm: Option<Vec<f64>>,
    pub gear: Option<Vec<i64>>,
    pub drs: Option<Vec<i64>>,
    pub x: Option<Vec<f64>>,
    pub y: Option<Vec<f64>>,
}

impl TelemetryFrame {
    pub fn len(&self) -> usize {
        self.speed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speed.is_empty()
    }
}
