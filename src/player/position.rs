//! Position conversion between seconds and normalized progress.
//!
//! The engine seeks and reports seeks in `[0, 1]`; the declarative surface
//! speaks seconds.

/// Seconds to progress in `[0, 1]`. `None` while the duration is unknown.
pub fn sec_to_pos(seconds: f64, duration: f64) -> Option<f64> {
    if !(duration.is_finite() && duration > 0.0) {
        return None;
    }
    Some((seconds / duration).clamp(0.0, 1.0))
}

/// Progress in `[0, 1]` to seconds.
pub fn pos_to_sec(progress: f64, duration: f64) -> f64 {
    progress * duration
}
