use std::collections::BTreeMap;

use serde::Serialize;

use crate::source::types::{LapRecord, Session};

use super::format::{format_lap_time, format_opt, format_timestamp};
use super::ServiceError;

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Serialize)]
pub struct LapEntry {
    pub lap_number: u32,
    pub driver: String,
    pub team: String,
    pub lap_time: Option<String>,
    pub lap_time_seconds: Option<f64>,
    pub sector1: Option<String>,
    pub sector2: Option<String>,
    pub sector3: Option<String>,
    pub compound: Option<String>,
    pub tyre_life: u32,
    pub is_personal_best: bool,
    pub position: Option<u32>,
    pub pit_out_time: Option<String>,
    pub pit_in_time: Option<String>,
}

impl From<&LapRecord> for LapEntry {
    fn from(lap: &LapRecord) -> Self {
        let lap_time = format_opt(lap.lap_time);
        // Seconds are reported exactly when the formatted time is
        let lap_time_seconds = lap_time.as_ref().and(lap.lap_time);
        let [s1, s2, s3] = lap.sector_times;
        Self {
            lap_number: lap.lap_number,
            driver: lap.driver.clone(),
            team: lap.team.clone(),
            lap_time,
            lap_time_seconds,
            sector1: format_opt(s1),
            sector2: format_opt(s2),
            sector3: format_opt(s3),
            compound: lap.compound.clone(),
            tyre_life: lap.tyre_life.unwrap_or(0),
            is_personal_best: lap.is_personal_best,
            position: lap.position,
            pit_out_time: format_timestamp(lap.pit_out_time),
            pit_in_time: format_timestamp(lap.pit_in_time),
        }
    }
}

/// Every lap of the session, optionally restricted to one driver code
/// (case-insensitive).
pub fn all_laps(session: &Session, driver: Option<&str>) -> Vec<LapEntry> {
    match driver {
        Some(code) => session.laps_for(code).into_iter().map(LapEntry::from).collect(),
        None => session.laps.iter().map(LapEntry::from).collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct RankedLap {
    pub rank: usize,
    pub driver: String,
    pub team: String,
    pub lap_number: u32,
    pub lap_time: String,
    pub lap_time_seconds: f64,
    pub sector1: Option<String>,
    pub sector2: Option<String>,
    pub sector3: Option<String>,
    pub compound: Option<String>,
}

/// Quick laps ordered by lap time, truncated to `top_n` and ranked from 1.
pub fn fastest_laps(session: &Session, driver: Option<&str>, top_n: usize) -> Vec<RankedLap> {
    let mut quick: Vec<(f64, &LapRecord)> = session
        .quick_laps()
        .into_iter()
        .filter(|lap| driver.is_none_or(|code| lap.driver.eq_ignore_ascii_case(code)))
        .filter_map(|lap| lap.lap_time.map(|t| (t, lap)))
        .collect();
    quick.sort_by(|a, b| a.0.total_cmp(&b.0));
    quick
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, (secs, lap))| {
            let [s1, s2, s3] = lap.sector_times;
            RankedLap {
                rank: idx + 1,
                driver: lap.driver.clone(),
                team: lap.team.clone(),
                lap_number: lap.lap_number,
                lap_time: format_lap_time(secs),
                lap_time_seconds: secs,
                sector1: format_opt(s1),
                sector2: format_opt(s2),
                sector3: format_opt(s3),
                compound: lap.compound.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct PositionPoint {
    pub lap: u32,
    pub position: Option<u32>,
    pub lap_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DriverPositions {
    pub positions: Vec<PositionPoint>,
    pub total_laps: usize,
}

#[derive(Debug, Serialize)]
pub struct PositionHistory {
    pub drivers: Vec<String>,
    pub total_drivers: usize,
    pub position_data: BTreeMap<String, DriverPositions>,
}

/// Lap-by-lap running order of every driver, for race replay.
pub fn position_history(session: &Session) -> Result<PositionHistory, ServiceError> {
    if session.laps.is_empty() {
        return Err(ServiceError::NotFound("No lap data available".to_string()));
    }

    let drivers: Vec<String> = session.lap_drivers().into_iter().map(String::from).collect();
    let position_data = drivers
        .iter()
        .map(|code| {
            let mut laps = session.laps_for(code);
            laps.sort_by_key(|l| l.lap_number);
            let positions: Vec<PositionPoint> = laps
                .into_iter()
                .map(|lap| PositionPoint {
                    lap: lap.lap_number,
                    position: lap.position,
                    lap_time: format_opt(lap.lap_time),
                })
                .collect();
            let entry = DriverPositions {
                total_laps: positions.len(),
                positions,
            };
            (code.clone(), entry)
        })
        .collect();

    Ok(PositionHistory {
        total_drivers: drivers.len(),
        drivers,
        position_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::types::{EventRecord, SessionId, SessionType};

    fn lap(driver: &str, number: u32, time: Option<f64>, position: u32) -> LapRecord {
        LapRecord {
            driver: driver.to_string(),
            lap_number: number,
            lap_time: time,
            position: Some(position),
            ..Default::default()
        }
    }

    fn session(laps: Vec<LapRecord>) -> Session {
        Session {
            id: SessionId::new(2023, 1, SessionType::Race),
            key: 1,
            name: "Race".to_string(),
            event: EventRecord {
                key: 1,
                round: 1,
                name: "Bahrain Grand Prix".to_string(),
                country: "Bahrain".to_string(),
                location: "Sakhir".to_string(),
                date: None,
                format: "conventional".to_string(),
                sessions: Vec::new(),
            },
            date: None,
            total_laps: None,
            results: Vec::new(),
            laps,
            telemetry_loaded: false,
        }
    }

    #[test]
    fn fastest_laps_drop_slow_laps_and_rank_from_one() {
        let s = session(vec![
            lap("VER", 1, Some(92.0), 1),
            lap("VER", 2, Some(90.0), 1),
            lap("LEC", 1, Some(91.0), 2),
            lap("LEC", 2, Some(110.0), 2),
            lap("LEC", 3, None, 2),
        ]);
        let ranked = fastest_laps(&s, None, DEFAULT_TOP_N);
        let order: Vec<(usize, &str, u32)> = ranked
            .iter()
            .map(|l| (l.rank, l.driver.as_str(), l.lap_number))
            .collect();
        assert_eq!(order, [(1, "VER", 2), (2, "LEC", 1), (3, "VER", 1)]);
        assert_eq!(ranked[0].lap_time, "1:30.000");

        assert_eq!(fastest_laps(&s, Some("lec"), 10).len(), 1);
        assert_eq!(fastest_laps(&s, None, 1).len(), 1);
    }

    #[test]
    fn untimed_laps_have_no_seconds() {
        let s = session(vec![lap("VER", 1, None, 1), lap("VER", 2, Some(95.25), 1)]);
        let laps = all_laps(&s, Some("VER"));
        assert_eq!(laps[0].lap_time, None);
        assert_eq!(laps[0].lap_time_seconds, None);
        assert_eq!(laps[1].lap_time.as_deref(), Some("1:35.250"));
        assert_eq!(laps[1].lap_time_seconds, Some(95.25));
        assert_eq!(laps[1].tyre_life, 0);
    }

    #[test]
    fn positions_are_ordered_by_lap() {
        let s = session(vec![
            lap("HAM", 2, Some(95.0), 3),
            lap("VER", 1, Some(94.0), 1),
            lap("HAM", 1, Some(96.0), 4),
        ]);
        let history = position_history(&s).unwrap();
        assert_eq!(history.drivers, ["HAM", "VER"]);
        let ham = &history.position_data["HAM"];
        let laps: Vec<u32> = ham.positions.iter().map(|p| p.lap).collect();
        assert_eq!(laps, [1, 2]);
        assert_eq!(ham.positions[1].position, Some(3));
        assert_eq!(ham.total_laps, 2);
    }

    #[test]
    fn position_history_requires_laps() {
        let err = position_history(&session(Vec::new())).unwrap_err();
        assert_eq!(err.to_string(), "No lap data available");
    }
}
