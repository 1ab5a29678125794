//! Merge raw car and position samples into a per-lap [`TelemetryFrame`].

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::TelemetryFrame;

#[derive(Debug, Clone, Deserialize)]
pub struct CarSample {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub throttle: Option<f64>,
    #[serde(default)]
    pub brake: Option<f64>,
    #[serde(default)]
    pub rpm: Option<f64>,
    #[serde(default)]
    pub n_gear: Option<i64>,
    #[serde(default)]
    pub drs: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionSample {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

/// Build a frame from car samples, using speed as the time base.
///
/// Samples without a speed value are dropped. Distance is integrated from
/// speed (km/h) over time with the trapezoid rule. Position samples are
/// forward-filled onto the car samples; x/y are `None` when `positions` has
/// no usable sample.
pub fn assemble_frame(mut car: Vec<CarSample>, mut positions: Vec<PositionSample>) -> TelemetryFrame {
    car.retain(|s| s.speed.is_some());
    car.sort_by_key(|s| s.date);
    positions.retain(|p| p.x.is_some() && p.y.is_some());
    positions.sort_by_key(|p| p.date);

    let mut frame = TelemetryFrame {
        distance: integrate_distance(&car),
        speed: car.iter().filter_map(|s| s.speed).collect(),
        throttle: car.iter().map(|s| s.throttle.unwrap_or(0.0)).collect(),
        brake: car.iter().map(|s| s.brake.unwrap_or(0.0)).collect(),
        rpm: fill_channel(&car, |s| s.rpm),
        gear: fill_channel(&car, |s| s.n_gear),
        drs: fill_channel(&car, |s| s.drs),
        x: None,
        y: None,
    };

    if !positions.is_empty() {
        let mut xs = Vec::with_capacity(car.len());
        let mut ys = Vec::with_capacity(car.len());
        for sample in &car {
            let idx = positions.partition_point(|p| p.date <= sample.date);
            let pos = &positions[idx.saturating_sub(1)];
            xs.push(pos.x.unwrap_or_default());
            ys.push(pos.y.unwrap_or_default());
        }
        frame.x = Some(xs);
        frame.y = Some(ys);
    }

    frame
}

fn integrate_distance(car: &[CarSample]) -> Vec<f64> {
    let mut distance = Vec::with_capacity(car.len());
    let mut total = 0.0;
    for (i, sample) in car.iter().enumerate() {
        if i > 0 {
            let prev = &car[i - 1];
            let dt = (sample.date - prev.date).num_milliseconds() as f64 / 1000.0;
            let avg_kmh = (prev.speed.unwrap_or(0.0) + sample.speed.unwrap_or(0.0)) / 2.0;
            total += avg_kmh / 3.6 * dt;
        }
        distance.push(total);
    }
    distance
}

/// `None` when no sample carries the channel; otherwise gaps repeat the
/// previous value (or the type default before the first reading).
fn fill_channel<T: Copy + Default>(
    car: &[CarSample],
    get: impl Fn(&CarSample) -> Option<T>,
) -> Option<Vec<T>> {
    if !car.iter().any(|s| get(s).is_some()) {
        return None;
    }
    let mut last = T::default();
    Some(
        car.iter()
            .map(|s| {
                if let Some(v) = get(s) {
                    last = v;
                }
                last
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 3, 5, 15, 0, 0).unwrap()
    }

    fn car(ms: i64, speed: Option<f64>, rpm: Option<f64>) -> CarSample {
        CarSample {
            date: t0() + Duration::milliseconds(ms),
            speed,
            throttle: Some(100.0),
            brake: Some(0.0),
            rpm,
            n_gear: None,
            drs: Some(8),
        }
    }

    fn pos(ms: i64, x: f64, y: f64) -> PositionSample {
        PositionSample {
            date: t0() + Duration::milliseconds(ms),
            x: Some(x),
            y: Some(y),
        }
    }

    #[test]
    fn distance_integrates_speed_over_time() {
        // 360 km/h = 100 m/s for one second
        let frame = assemble_frame(
            vec![car(0, Some(360.0), None), car(1000, Some(360.0), None)],
            vec![],
        );
        assert_eq!(frame.distance.len(), 2);
        assert!((frame.distance[1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn samples_are_ordered_and_speedless_rows_dropped() {
        let frame = assemble_frame(
            vec![
                car(500, Some(200.0), None),
                car(0, Some(100.0), None),
                car(250, None, None),
            ],
            vec![],
        );
        assert_eq!(frame.speed, vec![100.0, 200.0]);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn absent_channels_are_none_and_partial_channels_forward_fill() {
        let frame = assemble_frame(
            vec![
                car(0, Some(100.0), Some(10000.0)),
                car(100, Some(101.0), None),
                car(200, Some(102.0), Some(10500.0)),
            ],
            vec![],
        );
        assert_eq!(frame.rpm, Some(vec![10000.0, 10000.0, 10500.0]));
        assert_eq!(frame.gear, None);
        assert_eq!(frame.drs, Some(vec![8, 8, 8]));
        assert!(frame.x.is_none() && frame.y.is_none());
    }

    #[test]
    fn positions_forward_fill_onto_car_samples() {
        let frame = assemble_frame(
            vec![
                car(0, Some(100.0), None),
                car(300, Some(100.0), None),
                car(600, Some(100.0), None),
            ],
            vec![pos(100, 1.0, 2.0), pos(400, 3.0, 4.0)],
        );
        // First car sample precedes every position sample and takes the first one.
        assert_eq!(frame.x, Some(vec![1.0, 1.0, 3.0]));
        assert_eq!(frame.y, Some(vec![2.0, 2.0, 4.0]));
    }
}
