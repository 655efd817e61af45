//! Percentage arithmetic shared by every growth and share figure.

/// Period-over-period growth `(current - prior) / prior * 100`.
///
/// A zero `prior` yields exactly `0.0`. That covers both "no comparison data"
/// and "growth from nothing", so the result is a display value rather than a
/// true growth rate. The output is always finite.
pub fn growth_percentage(current: u64, prior: u64) -> f64 {
    if prior == 0 {
        return 0.0;
    }
    (current as f64 - prior as f64) / prior as f64 * 100.0
}

/// `part / whole * 100`, or `0.0` when `whole` is zero.
pub fn share_percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
