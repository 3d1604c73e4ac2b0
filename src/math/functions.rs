use std::time::Duration;

/// Clamp `v` into `[min, max]`
pub fn clamp(v: f64, min: f64, max: f64) -> f64 {
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

/// Scale a per-second rate to the elapsed tick duration
pub fn step(v: f64, dt: Duration) -> f64 {
    v * dt.as_secs_f64()
}

/// Value between `min` and `max`, scaled at `scale`, sampled at `point`
pub fn linear_step(min: f64, max: f64, scale: f64, point: f64) -> f64 {
    min + point * (1.0 / scale) * (max - min)
}
