#![allow(dead_code)]
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use tower::ServiceExt;

use f1replay::api::{api_router, AppState};
use f1replay::source::types::{
    DriverRecord, EventRecord, EventSession, LapRecord, LoadOptions, ResultRecord, ResultTime,
    Session, SessionId, SessionType, TelemetryFrame,
};
use f1replay::source::{SourceError, TimingSource};

pub const SEASON: i32 = 2023;

pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(SEASON, 3, day, hour, 0, 0).unwrap()
}

/// In-memory timing source with a fixed 2023 calendar.
#[derive(Default)]
pub struct FakeSource {
    pub schedule: Vec<EventRecord>,
    pub sessions: HashMap<SessionId, Session>,
    pub telemetry: HashMap<(String, u32), TelemetryFrame>,
    pub schedule_failure: bool,
}

#[async_trait]
impl TimingSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn event_schedule(&self, season: i32) -> Result<Vec<EventRecord>, SourceError> {
        if self.schedule_failure {
            return Err(SourceError::Status {
                url: "http://upstream.test/meetings".to_string(),
                status: 502,
            });
        }
        if season != SEASON {
            return Err(SourceError::NotFound(format!(
                "No events found for the {} season",
                season
            )));
        }
        Ok(self.schedule.clone())
    }

    async fn load_session(
        &self,
        id: SessionId,
        options: LoadOptions,
    ) -> Result<Session, SourceError> {
        let mut session = self.sessions.get(&id).cloned().ok_or_else(|| {
            SourceError::NotFound(format!("Session {} does not exist", id))
        })?;
        session.telemetry_loaded = options.telemetry;
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
        Ok(self
            .telemetry
            .get(&(lap.driver.clone(), lap.lap_number))
            .cloned()
            .unwrap_or_default())
    }
}

fn driver(code: &str, number: &str, first: &str, last: &str, team: &str) -> DriverRecord {
    DriverRecord {
        driver_number: number.to_string(),
        abbreviation: code.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        team_name: team.to_string(),
        team_color: Some("3671C6".to_string()),
        country_code: Some("NED".to_string()),
    }
}

pub fn lap(code: &str, number: u32, time: Option<f64>, pb: bool, position: u32) -> LapRecord {
    LapRecord {
        driver: code.to_string(),
        driver_number: "1".to_string(),
        team: "Red Bull Racing".to_string(),
        lap_number: number,
        lap_time: time,
        sector_times: [time.map(|t| t / 3.0), None, None],
        compound: Some("SOFT".to_string()),
        tyre_life: Some(number),
        is_personal_best: pb,
        position: Some(position),
        ..Default::default()
    }
}

fn event(round: u32, name: &str, day: u32) -> EventRecord {
    let kinds = [
        (SessionType::Practice1, 1),
        (SessionType::Qualifying, 2),
        (SessionType::Race, 3),
    ];
    EventRecord {
        key: round as i64 + 1000,
        round,
        name: name.to_string(),
        country: "Bahrain".to_string(),
        location: "Sakhir".to_string(),
        date: Some(at(day + 3, 15)),
        format: "conventional".to_string(),
        sessions: kinds
            .iter()
            .map(|(kind, offset)| EventSession {
                key: round as i64 * 10 + *offset as i64,
                name: kind.display_name().to_string(),
                kind: Some(*kind),
                date: Some(at(day + offset, 15)),
            })
            .collect(),
    }
}

fn session(id: SessionId, event: &EventRecord) -> Session {
    Session {
        id,
        key: event.key * 10,
        name: id.kind.display_name().to_string(),
        event: event.clone(),
        date: event.session(id.kind).and_then(|s| s.date),
        total_laps: Some(57),
        results: Vec::new(),
        laps: Vec::new(),
        telemetry_loaded: false,
    }
}

/// Telemetry of `len` samples tracing a rectangle 1000 by 500 units.
pub fn frame(len: usize) -> TelemetryFrame {
    let last = (len.max(2) - 1) as f64;
    let progress = |i: usize| i as f64 / last;
    TelemetryFrame {
        distance: (0..len).map(|i| progress(i) * 5400.0).collect(),
        speed: (0..len).map(|i| 100.0 + (i % 200) as f64).collect(),
        throttle: vec![100.0; len],
        brake: vec![0.0; len],
        rpm: Some(vec![11000.0; len]),
        gear: Some(vec![7; len]),
        drs: None,
        x: Some((0..len).map(|i| -500.0 + progress(i) * 1000.0).collect()),
        y: Some((0..len).map(|i| if (i / 4) % 2 == 0 { 0.0 } else { 500.0 }).collect()),
    }
}

/// Calendar: pre-season testing, round 1 with full data, round 2 whose race
/// has no data at all, round 3 whose race has laps but no classification.
pub fn fixture() -> FakeSource {
    let testing = EventRecord {
        key: 999,
        round: 0,
        name: "Pre-Season Testing".to_string(),
        country: "Bahrain".to_string(),
        location: "Sakhir".to_string(),
        date: Some(at(1, 15)),
        format: "testing".to_string(),
        sessions: Vec::new(),
    };
    let bahrain = event(1, "Bahrain Grand Prix", 3);
    let jeddah = event(2, "Saudi Arabian Grand Prix", 10);
    let melbourne = event(3, "Australian Grand Prix", 17);

    let ver = driver("VER", "1", "Max", "Verstappen", "Red Bull Racing");
    let ham = DriverRecord {
        team_color: None,
        country_code: Some("GBR".to_string()),
        ..driver("HAM", "44", "Lewis", "Hamilton", "Mercedes")
    };

    let mut sessions = HashMap::new();

    let race_id = SessionId::new(SEASON, 1, SessionType::Race);
    let mut race = session(race_id, &bahrain);
    race.results = vec![
        ResultRecord {
            position: Some(1),
            driver: ver.clone(),
            time: Some(ResultTime::Elapsed(5636.736)),
            status: Some("Finished".to_string()),
            points: Some(25.0),
        },
        ResultRecord {
            position: Some(2),
            driver: ham.clone(),
            time: Some(ResultTime::Behind(11.987)),
            status: Some("Finished".to_string()),
            points: Some(18.0),
        },
    ];
    race.laps = vec![
        lap("VER", 1, Some(95.0), true, 1),
        lap("VER", 2, Some(93.5), true, 1),
        lap("VER", 3, Some(94.0), false, 1),
        lap("VER", 4, None, false, 1),
        lap("HAM", 1, Some(96.0), true, 2),
        lap("HAM", 2, Some(94.2), true, 2),
        lap("HAM", 3, Some(101.0), false, 2),
    ];
    sessions.insert(race_id, race);

    let quali_id = SessionId::new(SEASON, 1, SessionType::Qualifying);
    let mut quali = session(quali_id, &bahrain);
    quali.results = vec![ResultRecord {
        position: Some(1),
        driver: ver.clone(),
        time: Some(ResultTime::Elapsed(89.708)),
        status: None,
        points: None,
    }];
    sessions.insert(quali_id, quali);

    let quali2_id = SessionId::new(SEASON, 2, SessionType::Qualifying);
    let mut quali2 = session(quali2_id, &jeddah);
    quali2.results = vec![ResultRecord {
        position: Some(1),
        driver: ham.clone(),
        time: Some(ResultTime::Elapsed(88.265)),
        status: None,
        points: None,
    }];
    sessions.insert(quali2_id, quali2);
    let race2_id = SessionId::new(SEASON, 2, SessionType::Race);
    sessions.insert(race2_id, session(race2_id, &jeddah));

    let race3_id = SessionId::new(SEASON, 3, SessionType::Race);
    let mut race3 = session(race3_id, &melbourne);
    race3.laps = vec![lap("NOR", 1, Some(82.0), true, 1), lap("PIA", 1, Some(82.5), true, 2)];
    sessions.insert(race3_id, race3);

    let mut telemetry = HashMap::new();
    telemetry.insert(("VER".to_string(), 2), frame(1200));
    telemetry.insert(("HAM".to_string(), 2), frame(250));

    FakeSource {
        schedule: vec![testing, bahrain, jeddah, melbourne],
        sessions,
        telemetry,
        schedule_failure: false,
    }
}

pub fn app_with(source: FakeSource) -> Router {
    api_router(AppState::new(Arc::new(source), None))
}

pub fn app() -> Router {
    app_with(fixture())
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("{uri} returned non-JSON body ({e}): {bytes:?}"));
    (status, body)
}

/// Asserts the uniform error body and returns its message.
pub fn error_message(status: StatusCode, body: &serde_json::Value, expected: StatusCode) -> String {
    assert_eq!(status, expected, "body: {body}");
    assert_eq!(body["error"], true);
    assert_eq!(body["status_code"], expected.as_u16());
    assert!(body["timestamp"].is_string());
    body["message"].as_str().unwrap().to_string()
}

pub async fn wait_for_port(port: u16, timeout: std::time::Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if std::net::TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    false
}
