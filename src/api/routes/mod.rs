pub mod drivers;
pub mod health;
pub mod laps;
pub mod races;
pub mod seasons;
pub mod sessions;
pub mod telemetry;
pub mod track;

/// Value of the `status` field on successful responses.
pub const SUCCESS: &str = "success";
