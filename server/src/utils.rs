use std::time::{Duration, Instant};

// Time since `last`, never more than `max`. The first call yields zero.
pub fn capped_delta(last: Option<Instant>, now: Instant, max: Duration) -> Duration {
    last.map(|last| now.saturating_duration_since(last).min(max))
        .unwrap_or_default()
}

// Pixels covered this tick at `rate` pixels per second, truncated toward zero
pub fn scaled_velocity(rate: f32, dt: Duration) -> i32 {
    (rate * dt.as_secs_f32()) as i32
}
