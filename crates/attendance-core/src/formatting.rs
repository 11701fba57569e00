/// Round `value` to `decimals` places, half away from zero.
///
/// A tiny epsilon scaled to the magnitude is added before rounding so that
/// values like `2.675` (stored as `2.67499…`) round the way a reader expects.
///
/// # Examples
///
/// ```
/// use attendance_core::formatting::round_to;
///
/// assert_eq!(round_to(20.0, 2), 20.0);
/// assert_eq!(round_to(12.345, 2), 12.35);
/// assert_eq!(round_to(2.675, 2), 2.68);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * value.abs() * factor;
    let scaled = value * factor;
    let nudged = if scaled < 0.0 {
        scaled - epsilon
    } else {
        scaled + epsilon
    };
    nudged.round() / factor
}

/// Render a minute count with exactly two decimals, as used in report cells.
///
/// # Examples
///
/// ```
/// use attendance_core::formatting::format_minutes;
///
/// assert_eq!(format_minutes(20.0), "20.00");
/// assert_eq!(format_minutes(20.5), "20.50");
/// assert_eq!(format_minutes(1.0 / 3.0), "0.33");
/// ```
pub fn format_minutes(minutes: f64) -> String {
    format!("{:.2}", round_to(minutes, 2))
}

/// Format a duration in minutes as a human-readable string.
///
/// * `< 60` minutes → `"45m"`
/// * `≥ 60` minutes, no remainder → `"3h"`
/// * `≥ 60` minutes, with remainder → `"3h 45m"`
///
/// # Examples
///
/// ```
/// use attendance_core::formatting::format_time;
///
/// assert_eq!(format_time(45.0),  "45m");
/// assert_eq!(format_time(60.0),  "1h");
/// assert_eq!(format_time(225.0), "3h 45m");
/// assert_eq!(format_time(0.0),   "0m");
/// ```
pub fn format_time(minutes: f64) -> String {
    let total_mins = minutes.round() as i64;
    if total_mins < 60 {
        format!("{}m", total_mins)
    } else {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

/// Calculate `(part / whole) * 100`, rounded to one decimal place.
///
/// Returns `0.0` if `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 1)
}
