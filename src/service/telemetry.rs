use serde::Serialize;
use tracing::debug;

use crate::source::types::{pick_fastest, LapRecord, Session, TelemetryFrame};
use crate::source::TimingSource;

use super::format::format_opt;
use super::sampling::{sample_step, subsample, TELEMETRY_TARGET_POINTS, TRACK_TARGET_POINTS};
use super::ServiceError;

#[derive(Debug, Serialize)]
pub struct TelemetryChannels {
    pub distance: Vec<f64>,
    pub speed: Vec<f64>,
    pub throttle: Vec<f64>,
    pub brake: Vec<f64>,
    pub rpm: Vec<f64>,
    pub gear: Vec<i64>,
    pub drs: Vec<i64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl TelemetryChannels {
    /// Sub-sample every channel with the same stride; absent channels
    /// become empty arrays.
    pub fn sampled(frame: &TelemetryFrame, step: usize) -> Self {
        fn optional<T: Clone>(channel: &Option<Vec<T>>, step: usize) -> Vec<T> {
            channel
                .as_deref()
                .map(|values| subsample(values, step))
                .unwrap_or_default()
        }

        Self {
            distance: subsample(&frame.distance, step),
            speed: subsample(&frame.speed, step),
            throttle: subsample(&frame.throttle, step),
            brake: subsample(&frame.brake, step),
            rpm: optional(&frame.rpm, step),
            gear: optional(&frame.gear, step),
            drs: optional(&frame.drs, step),
            x: optional(&frame.x, step),
            y: optional(&frame.y, step),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LapTelemetry {
    pub driver: String,
    pub lap_number: u32,
    pub lap_time: Option<String>,
    pub data_points: usize,
    pub sampled_points: usize,
    pub telemetry: TelemetryChannels,
}

/// Select a driver's lap: the given lap number, or their fastest lap.
pub fn select_lap<'a>(
    session: &'a Session,
    driver: &str,
    lap_number: Option<u32>,
) -> Result<&'a LapRecord, ServiceError> {
    let laps = session.laps_for(driver);
    if laps.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "No laps found for driver {}",
            driver
        )));
    }
    match lap_number {
        Some(number) => laps
            .into_iter()
            .find(|lap| lap.lap_number == number)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Lap {} not found for {}", number, driver))
            }),
        None => pick_fastest(laps).ok_or_else(|| {
            ServiceError::NotFound(format!("No timed laps found for driver {}", driver))
        }),
    }
}

/// Sub-sampled channel data for one lap of `driver`.
pub async fn lap_telemetry(
    source: &dyn TimingSource,
    session: &Session,
    driver: &str,
    lap_number: Option<u32>,
) -> Result<LapTelemetry, ServiceError> {
    let driver = driver.to_ascii_uppercase();
    let lap = select_lap(session, &driver, lap_number)?;
    let frame = source.lap_telemetry(session, lap).await?;
    if frame.is_empty() {
        return Err(ServiceError::NotFound(
            "No telemetry data available for this lap".to_string(),
        ));
    }

    let step = sample_step(frame.len(), TELEMETRY_TARGET_POINTS);
    let telemetry = TelemetryChannels::sampled(&frame, step);
    debug!(driver = %driver, lap = lap.lap_number, points = frame.len(), step, "sampled telemetry");

    Ok(LapTelemetry {
        driver,
        lap_number: lap.lap_number,
        lap_time: format_opt(lap.lap_time),
        data_points: frame.len(),
        sampled_points: telemetry.speed.len(),
        telemetry,
    })
}

#[derive(Debug, Serialize)]
pub struct TrackCoordinates {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub width: f64,
    pub height: f64,
}

impl TrackBounds {
    pub fn of(x: &[f64], y: &[f64]) -> Option<Self> {
        let (x_min, x_max) = min_max(x)?;
        let (y_min, y_max) = min_max(y)?;
        Some(Self {
            x_min,
            x_max,
            y_min,
            y_max,
            width: x_max - x_min,
            height: y_max - y_min,
        })
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[derive(Debug, Serialize)]
pub struct TrackLayout {
    pub event: String,
    pub circuit: String,
    pub coordinates: TrackCoordinates,
    pub bounds: TrackBounds,
    pub total_points: usize,
}

/// Track outline from the session's fastest lap.
pub async fn track_layout(
    source: &dyn TimingSource,
    session: &Session,
) -> Result<TrackLayout, ServiceError> {
    let lap = session
        .fastest_lap()
        .ok_or_else(|| ServiceError::NotFound("No lap data available".to_string()))?;
    let frame = source.lap_telemetry(session, lap).await?;
    if frame.is_empty() {
        return Err(ServiceError::NotFound(
            "No telemetry data available".to_string(),
        ));
    }
    let (Some(x), Some(y)) = (frame.x.as_deref(), frame.y.as_deref()) else {
        return Err(ServiceError::NotFound(
            "Position data not available in telemetry".to_string(),
        ));
    };

    let step = sample_step(x.len(), TRACK_TARGET_POINTS);
    let x = subsample(x, step);
    let y = subsample(y, step);
    let bounds = TrackBounds::of(&x, &y).ok_or_else(|| {
        ServiceError::NotFound("Position data not available in telemetry".to_string())
    })?;

    Ok(TrackLayout {
        event: session.event.name.clone(),
        circuit: session.event.location.clone(),
        total_points: x.len(),
        coordinates: TrackCoordinates { x, y },
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_derive_width_and_height() {
        let bounds = TrackBounds::of(&[-100.0, 250.0, 50.0], &[10.0, -30.0, 90.0]).unwrap();
        assert_eq!(bounds.x_min, -100.0);
        assert_eq!(bounds.x_max, 250.0);
        assert_eq!(bounds.width, 350.0);
        assert_eq!(bounds.height, 120.0);
    }

    #[test]
    fn bounds_of_empty_series_is_none() {
        assert!(TrackBounds::of(&[], &[]).is_none());
    }

    #[test]
    fn missing_channels_sample_to_empty_arrays() {
        let frame = TelemetryFrame {
            distance: vec![0.0, 1.0, 2.0, 3.0],
            speed: vec![100.0, 110.0, 120.0, 130.0],
            throttle: vec![100.0; 4],
            brake: vec![0.0; 4],
            rpm: None,
            gear: Some(vec![7, 7, 8, 8]),
            drs: None,
            x: None,
            y: None,
        };
        let channels = TelemetryChannels::sampled(&frame, 2);
        assert_eq!(channels.speed, vec![100.0, 120.0]);
        assert_eq!(channels.gear, vec![7, 8]);
        assert!(channels.rpm.is_empty());
        assert!(channels.x.is_empty() && channels.y.is_empty());
    }
}
