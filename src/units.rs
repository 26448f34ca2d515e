const MS_PER_SECOND: f64 = 1000.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

pub fn ms_to_hours(ms: f64) -> f64 {
    (ms / MS_PER_SECOND) / SECONDS_PER_HOUR
}

/// Whole hours and minutes, e.g. `"2h5m"`. Leftover seconds are dropped.
pub fn ms_to_hours_minutes(ms: i64) -> String {
    let seconds = ms.div_euclid(1000);
    let (minutes, _) = divmod(seconds, 60);
    let (hours, minutes) = divmod(minutes, 60);
    format!("{hours}h{minutes}m")
}

fn divmod(value: i64, divisor: i64) -> (i64, i64) {
    (value.div_euclid(divisor), value.rem_euclid(divisor))
}
