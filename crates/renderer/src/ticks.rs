//! Tick placement and labelling.

/// Multipliers tried for each power of ten.
const STEPS: [f64; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];

/// Round tick values inside `[vmin, vmax]`, at most `max_bins` intervals apart.
pub fn nice_ticks(vmin: f64, vmax: f64, max_bins: usize) -> Vec<f64> {
    if !(vmin.is_finite() && vmax.is_finite()) {
        return Vec::new();
    }
    if vmax <= vmin {
        return vec![vmin];
    }

    let raw = (vmax - vmin) / max_bins.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = STEPS
        .iter()
        .map(|m| m * magnitude)
        .find(|&s| s >= raw * (1.0 - 1e-9))
        .unwrap_or(10.0 * magnitude);

    let eps = step * 1e-9;
    let first = (vmin / step - 1e-9).ceil() as i64;
    let last = (vmax / step + 1e-9).floor() as i64;
    (first..=last)
        .map(|i| i as f64 * step)
        .filter(|&t| t >= vmin - eps && t <= vmax + eps)
        .collect()
}

/// Number of tick intervals that fit along an axis of `length` pixels.
///
/// Horizontal labels need more room than stacked vertical ones.
pub fn tick_bins(length: f32, font_px: f32, horizontal: bool) -> usize {
    let per_tick = font_px * if horizontal { 3.0 } else { 2.0 };
    if per_tick <= 0.0 {
        return 9;
    }
    ((length / per_tick).floor() as usize).clamp(1, 9)
}

/// Decimals needed to tell the ticks apart.
pub fn tick_decimals(ticks: &[f64]) -> usize {
    let step = match ticks {
        [a, b, ..] => (b - a).abs(),
        [a] => a.abs(),
        [] => return 0,
    };
    if step == 0.0 || !step.is_finite() {
        return 0;
    }
    let exponent = step.log10().floor();
    let mantissa = step / 10f64.powf(exponent);
    let mut decimals = (-exponent).max(0.0) as usize;
    // 0.25 needs two places, 25 and 250 need none
    if (mantissa - 2.5).abs() < 1e-6 && exponent < 0.0 {
        decimals += 1;
    }
    decimals
}

/// Labels with a shared number of decimals and a typographic minus sign.
pub fn format_ticks(ticks: &[f64]) -> Vec<String> {
    let decimals = tick_decimals(ticks);
    ticks.iter().map(|&t| format_tick(t, decimals)).collect()
}

/// One tick label with a typographic minus; negative zero prints as zero.
pub fn format_tick(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value + 0.0);
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().any(|c| c != '0' && c != '.') => format!("\u{2212}{}", rest),
        Some(rest) => rest.to_string(),
        None => text,
    }
}
