//! [`TimingSource`] backed by the OpenF1 JSON API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{CacheScope, ResponseCache};

use super::telemetry::{assemble_frame, CarSample, PositionSample};
use super::types::{
    DriverRecord, EventRecord, EventSession, LapRecord, LoadOptions, ResultRecord, ResultTime,
    Session, SessionId, SessionType, TelemetryFrame,
};
use super::{SourceError, TimingSource};

pub const DEFAULT_BASE_URL: &str = "https://api.openf1.org/v1";

// -----------------------------------------------------------------------
// Wire rows
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct MeetingRow {
    meeting_key: i64,
    meeting_name: String,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    date_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct SessionRow {
    session_key: i64,
    session_name: String,
    meeting_key: i64,
    #[serde(default)]
    date_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct DriverRow {
    driver_number: u32,
    #[serde(default)]
    name_acronym: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    team_name: Option<String>,
    #[serde(default)]
    team_colour: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResultRow {
    driver_number: u32,
    #[serde(default)]
    position: Option<u32>,
    #[serde(default)]
    points: Option<f64>,
    #[serde(default)]
    dnf: Option<bool>,
    #[serde(default)]
    dns: Option<bool>,
    #[serde(default)]
    dsq: Option<bool>,
    /// Seconds, or one entry per qualifying segment.
    #[serde(default)]
    duration: Option<Value>,
    /// Seconds, text such as "+1 LAP", or one entry per qualifying segment.
    #[serde(default)]
    gap_to_leader: Option<Value>,
    #[serde(default)]
    number_of_laps: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct LapRow {
    driver_number: u32,
    lap_number: u32,
    #[serde(default)]
    date_start: Option<DateTime<Utc>>,
    #[serde(default)]
    lap_duration: Option<f64>,
    #[serde(default)]
    duration_sector_1: Option<f64>,
    #[serde(default)]
    duration_sector_2: Option<f64>,
    #[serde(default)]
    duration_sector_3: Option<f64>,
    #[serde(default)]
    is_pit_out_lap: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct StintRow {
    driver_number: u32,
    #[serde(default)]
    compound: Option<String>,
    #[serde(default)]
    lap_start: Option<u32>,
    #[serde(default)]
    lap_end: Option<u32>,
    #[serde(default)]
    tyre_age_at_start: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct PitRow {
    driver_number: u32,
    #[serde(default)]
    lap_number: Option<u32>,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct PositionRow {
    driver_number: u32,
    date: DateTime<Utc>,
    position: u32,
}

// -----------------------------------------------------------------------
// Client
// -----------------------------------------------------------------------

pub struct OpenF1Source {
    client: reqwest::Client,
    base_url: String,
    cache: ResponseCache,
}

impl OpenF1Source {
    pub fn new(base_url: &str, timeout: Duration, cache: ResponseCache) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("f1replay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// GET `{base_url}/{path}` and decode a JSON array, going through the
    /// disk cache first.
    async fn fetch<T: DeserializeOwned>(
        &self,
        scope: &CacheScope,
        path: &str,
    ) -> Result<Vec<T>, SourceError> {
        let url = format!("{}/{}", self.base_url, path);

        if let Some(bytes) = self.cache.load(scope, &url).await {
            match serde_json::from_slice(&bytes) {
                Ok(rows) => return Ok(rows),
                Err(e) => debug!(url, error = %e, "discarding unreadable cache entry"),
            }
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| SourceError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        // OpenF1 reports an empty result set as 404
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(url, "no rows");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| SourceError::Transport {
                url: url.clone(),
                source,
            })?;
        let rows = serde_json::from_slice(&bytes).map_err(|e| SourceError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        self.cache.store(scope, &url, &bytes).await;
        Ok(rows)
    }
}

#[async_trait]
impl TimingSource for OpenF1Source {
    fn name(&self) -> &'static str {
        "openf1"
    }

    async fn event_schedule(&self, season: i32) -> Result<Vec<EventRecord>, SourceError> {
        let scope = CacheScope::Schedule { season };
        let meetings_path = format!("meetings?year={}", season);
        let sessions_path = format!("sessions?year={}", season);
        let (meetings, sessions) = tokio::try_join!(
            self.fetch::<MeetingRow>(&scope, &meetings_path),
            self.fetch::<SessionRow>(&scope, &sessions_path),
        )?;

        if meetings.is_empty() {
            return Err(SourceError::NotFound(format!(
                "No events found for the {} season",
                season
            )));
        }
        Ok(build_schedule(meetings, sessions))
    }

    async fn load_session(
        &self,
        id: SessionId,
        options: LoadOptions,
    ) -> Result<Session, SourceError> {
        let event = self.event(id.season, id.round).await?;
        let listed = event.session(id.kind).cloned().ok_or_else(|| {
            SourceError::NotFound(format!(
                "Session {} does not exist for the {} {}",
                id.kind, id.season, event.name
            ))
        })?;

        let scope = CacheScope::Session {
            id,
            start: listed.date,
        };
        let key = listed.key;
        let drivers_path = format!("drivers?session_key={}", key);
        let results_path = format!("session_result?session_key={}", key);
        let (drivers, results) = tokio::try_join!(
            self.fetch::<DriverRow>(&scope, &drivers_path),
            self.fetch::<ResultRow>(&scope, &results_path),
        )?;

        let drivers: HashMap<u32, DriverRecord> = drivers
            .into_iter()
            .map(|row| (row.driver_number, driver_record(row)))
            .collect();

        let laps = if options.laps {
            let laps_path = format!("laps?session_key={}", key);
            let stints_path = format!("stints?session_key={}", key);
            let pit_path = format!("pit?session_key={}", key);
            let position_path = format!("position?session_key={}", key);
            let (laps, stints, pits, positions) = tokio::try_join!(
                self.fetch::<LapRow>(&scope, &laps_path),
                self.fetch::<StintRow>(&scope, &stints_path),
                self.fetch::<PitRow>(&scope, &pit_path),
                self.fetch::<PositionRow>(&scope, &position_path),
            )?;
            assemble_laps(laps, &stints, &pits, positions, &drivers)
        } else {
            Vec::new()
        };

        let total_laps = laps
            .iter()
            .map(|l| l.lap_number)
            .max()
            .or_else(|| results.iter().filter_map(|r| r.number_of_laps).max());

        let session = Session {
            id,
            key,
            name: id.kind.display_name().to_string(),
            date: listed.date,
            total_laps,
            results: build_results(results, &drivers),
            laps,
            telemetry_loaded: options.telemetry,
            event,
        };
        info!(
            session = %id,
            results = session.results.len(),
            laps = session.laps.len(),
            telemetry = options.telemetry,
            "session loaded from openf1"
        );
        Ok(session)
    }

    async fn lap_telemetry(
        &self,
        session: &Session,
        lap: &LapRecord,
    ) -> Result<TelemetryFrame, SourceError> {
        if !session.telemetry_loaded {
            return Err(SourceError::TelemetryNotLoaded(session.id));
        }
        let (start, end) = lap_window(lap).ok_or_else(|| {
            SourceError::NotFound(format!(
                "Lap {} of {} has no timing window",
                lap.lap_number, lap.driver
            ))
        })?;

        let scope = CacheScope::Session {
            id: session.id,
            start: session.date,
        };
        let range = format!(
            "session_key={}&driver_number={}&date>={}&date<={}",
            session.key,
            lap.driver_number,
            query_timestamp(start),
            query_timestamp(end)
        );
        let car_path = format!("car_data?{}", range);
        let location_path = format!("location?{}", range);
        let (car, positions) = tokio::try_join!(
            self.fetch::<CarSample>(&scope, &car_path),
            self.fetch::<PositionSample>(&scope, &location_path),
        )?;
        Ok(assemble_frame(car, positions))
    }
}

// -----------------------------------------------------------------------
// Assembly
// -----------------------------------------------------------------------

fn build_schedule(mut meetings: Vec<MeetingRow>, sessions: Vec<SessionRow>) -> Vec<EventRecord> {
    meetings.sort_by_key(|m| m.date_start);

    let mut by_meeting: HashMap<i64, Vec<SessionRow>> = HashMap::new();
    for row in sessions {
        by_meeting.entry(row.meeting_key).or_default().push(row);
    }

    let mut round = 0;
    meetings
        .into_iter()
        .map(|meeting| {
            let mut rows = by_meeting.remove(&meeting.meeting_key).unwrap_or_default();
            rows.sort_by_key(|s| s.date_start);
            let sessions: Vec<EventSession> = rows
                .into_iter()
                .map(|s| EventSession {
                    key: s.session_key,
                    kind: SessionType::from_display_name(&s.session_name),
                    name: s.session_name,
                    date: s.date_start,
                })
                .collect();

            let has_sprint = sessions
                .iter()
                .any(|s| s.kind == Some(SessionType::Sprint));
            let date = sessions
                .last()
                .and_then(|s| s.date)
                .or(meeting.date_start);

            let mut event = EventRecord {
                key: meeting.meeting_key,
                round: 0,
                name: meeting.meeting_name,
                country: meeting.country_name.unwrap_or_default(),
                location: meeting.location.unwrap_or_default(),
                date,
                format: if has_sprint {
                    "sprint_qualifying".to_string()
                } else {
                    "conventional".to_string()
                },
                sessions,
            };
            if event.is_testing() {
                event.format = "testing".to_string();
            } else {
                round += 1;
                event.round = round;
            }
            event
        })
        .collect()
}

fn driver_record(row: DriverRow) -> DriverRecord {
    DriverRecord {
        driver_number: row.driver_number.to_string(),
        abbreviation: row
            .name_acronym
            .unwrap_or_else(|| row.driver_number.to_string()),
        first_name: row.first_name.unwrap_or_default(),
        last_name: row.last_name.unwrap_or_default(),
        team_name: row.team_name.unwrap_or_default(),
        team_color: row.team_colour,
        country_code: row.country_code,
    }
}

fn placeholder_driver(number: u32) -> DriverRecord {
    DriverRecord {
        driver_number: number.to_string(),
        abbreviation: number.to_string(),
        ..Default::default()
    }
}

fn build_results(mut rows: Vec<ResultRow>, drivers: &HashMap<u32, DriverRecord>) -> Vec<ResultRecord> {
    rows.sort_by_key(|r| (r.position.is_none(), r.position));
    rows.into_iter()
        .map(|row| {
            let driver = drivers
                .get(&row.driver_number)
                .cloned()
                .unwrap_or_else(|| placeholder_driver(row.driver_number));
            ResultRecord {
                position: row.position,
                time: result_time(&row),
                status: result_status(&row),
                points: row.points,
                driver,
            }
        })
        .collect()
}

fn result_time(row: &ResultRow) -> Option<ResultTime> {
    let segmented = matches!(row.duration, Some(Value::Array(_)));
    if row.position == Some(1) || segmented {
        return row.duration.as_ref().and_then(last_number).map(ResultTime::Elapsed);
    }
    match row.gap_to_leader.as_ref()? {
        Value::Number(n) => n.as_f64().map(ResultTime::Behind),
        Value::String(s) => Some(ResultTime::Text(s.clone())),
        _ => None,
    }
}

fn result_status(row: &ResultRow) -> Option<String> {
    if row.dnf.is_none() && row.dns.is_none() && row.dsq.is_none() {
        return None;
    }
    let status = if row.dsq == Some(true) {
        "Disqualified"
    } else if row.dns == Some(true) {
        "Did not start"
    } else if row.dnf == Some(true) {
        "Retired"
    } else {
        "Finished"
    };
    Some(status.to_string())
}

/// A plain number, or the last non-null number of an array.
fn last_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Array(items) => items.iter().rev().find_map(|v| v.as_f64()),
        _ => None,
    }
}

fn assemble_laps(
    mut laps: Vec<LapRow>,
    stints: &[StintRow],
    pits: &[PitRow],
    mut positions: Vec<PositionRow>,
    drivers: &HashMap<u32, DriverRecord>,
) -> Vec<LapRecord> {
    laps.sort_by_key(|l| (l.driver_number, l.lap_number));
    positions.sort_by_key(|p| (p.driver_number, p.date));

    let mut best: HashMap<u32, f64> = HashMap::new();
    laps.into_iter()
        .map(|row| {
            let driver = drivers
                .get(&row.driver_number)
                .cloned()
                .unwrap_or_else(|| placeholder_driver(row.driver_number));

            let pit_in_time = pits
                .iter()
                .find(|p| p.driver_number == row.driver_number && p.lap_number == Some(row.lap_number))
                .and_then(|p| p.date);
            let pit_out = row.is_pit_out_lap.unwrap_or(false);

            let is_personal_best = match row.lap_duration {
                Some(t) if !pit_out && pit_in_time.is_none() => {
                    let faster = best.get(&row.driver_number).is_none_or(|b| t < *b);
                    if faster {
                        best.insert(row.driver_number, t);
                    }
                    faster
                }
                _ => false,
            };

            let stint = stints.iter().find(|s| {
                s.driver_number == row.driver_number
                    && s.lap_start.is_some_and(|start| start <= row.lap_number)
                    && s.lap_end.is_none_or(|end| row.lap_number <= end)
            });
            let tyre_life = stint.and_then(|s| {
                let start = s.lap_start?;
                Some(s.tyre_age_at_start.unwrap_or(0) + (row.lap_number - start) + 1)
            });

            let lap_end = row
                .date_start
                .zip(row.lap_duration)
                .map(|(start, secs)| start + chrono::Duration::milliseconds((secs * 1000.0) as i64));
            let position = lap_end.and_then(|end| position_at(&positions, row.driver_number, end));

            LapRecord {
                driver: driver.abbreviation.clone(),
                driver_number: driver.driver_number.clone(),
                team: driver.team_name.clone(),
                lap_number: row.lap_number,
                lap_time: row.lap_duration,
                sector_times: [
                    row.duration_sector_1,
                    row.duration_sector_2,
                    row.duration_sector_3,
                ],
                compound: stint.and_then(|s| s.compound.clone()),
                tyre_life,
                is_personal_best,
                position,
                start_time: row.date_start,
                pit_out_time: if pit_out { row.date_start } else { None },
                pit_in_time,
            }
        })
        .collect()
}

/// Last reported position of `driver` at or before `at`. `positions` must be
/// sorted by (driver_number, date).
fn position_at(positions: &[PositionRow], driver: u32, at: DateTime<Utc>) -> Option<u32> {
    let idx = positions.partition_point(|p| (p.driver_number, p.date) <= (driver, at));
    let candidate = positions.get(idx.checked_sub(1)?)?;
    (candidate.driver_number == driver).then_some(candidate.position)
}

fn lap_window(lap: &LapRecord) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = lap.start_time?;
    let secs = lap.lap_time?;
    Some((start, start + chrono::Duration::milliseconds((secs * 1000.0) as i64)))
}

/// UTC timestamp without offset; a literal `+` would not survive the query string.
fn query_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .trim_end_matches('Z')
        .to_string()
}
