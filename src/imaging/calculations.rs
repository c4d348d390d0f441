//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::FitPolicy;

/// Scale `source` to fit inside `bounds`, preserving aspect ratio.
///
/// `ratio = min(max_w / src_w, max_h / src_h)`, each side rounded to the
/// nearest pixel. The ratio is not capped at 1: a source smaller than the box
/// is scaled up until one side touches it. Use [`plan_dimensions`] with
/// [`FitPolicy::ShrinkOnly`] to forbid that.
///
/// Neither output side is ever 0; a side that would round to zero becomes 1.
/// A zero source side is passed through unchanged since there is no ratio to
/// preserve.
///
/// # Examples
/// ```
/// # use discord_image_tools::imaging::fit_within;
/// assert_eq!(fit_within((4000, 2000), (1920, 1080)), (1920, 960));
/// // Inside the box: scaled up
/// assert_eq!(fit_within((800, 600), (1920, 1080)), (1440, 1080));
/// ```
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;
    if src_w == 0 || src_h == 0 {
        return source;
    }

    let ratio = fit_ratio(source, bounds);
    let w = (src_w as f64 * ratio).round() as u32;
    let h = (src_h as f64 * ratio).round() as u32;

    // Float error must not push the touching side past its bound
    let w = if ratio == max_w as f64 / src_w as f64 {
        max_w
    } else {
        w
    };
    let h = if ratio == max_h as f64 / src_h as f64 {
        max_h
    } else {
        h
    };

    (w.max(1), h.max(1))
}

/// The scale factor [`fit_within`] applies.
pub fn fit_ratio(source: (u32, u32), bounds: (u32, u32)) -> f64 {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;
    (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64)
}

/// Fit `source` into `bounds` under a caller policy.
pub fn plan_dimensions(source: (u32, u32), bounds: (u32, u32), policy: FitPolicy) -> (u32, u32) {
    match policy {
        FitPolicy::AllowUpscale => fit_within(source, bounds),
        FitPolicy::ShrinkOnly if source.0 == 0 || source.1 == 0 => source,
        FitPolicy::ShrinkOnly if fit_ratio(source, bounds) >= 1.0 => source,
        FitPolicy::ShrinkOnly => fit_within(source, bounds),
    }
}
