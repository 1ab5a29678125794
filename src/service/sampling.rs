/// Point budget for per-lap telemetry channels.
pub const TELEMETRY_TARGET_POINTS: usize = 500;

/// Point budget for the track outline.
pub const TRACK_TARGET_POINTS: usize = 300;

/// Stride that keeps roughly `target` points out of `len`; never below 1.
pub fn sample_step(len: usize, target: usize) -> usize {
    (len / target.max(1)).max(1)
}

/// Every `step`-th element starting at index 0.
pub fn subsample<T: Clone>(values: &[T], step: usize) -> Vec<T> {
    values.iter().step_by(step.max(1)).cloned().collect()
}
