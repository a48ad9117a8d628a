use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// First hour of the daily work window (24-hour clock).
pub const WORK_START_HOUR: u32 = 9;
/// End hour of the daily work window (24-hour clock).
pub const WORK_END_HOUR: u32 = 17;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// True for Saturday and Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0).unwrap()
}

/// Business hours elapsed between two instants, counting only the
/// 09:00–17:00 window on weekdays.
///
/// An inverted range (`end` before `start`) yields 0.0 rather than an
/// error; callers that need to distinguish genuine zero-duration spans
/// from bad data must check the inputs themselves. Fractional hours are
/// retained at millisecond precision.
pub fn business_hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    if end < start {
        return 0.0;
    }

    // Clip the start forward to the next window opening.
    let mut current = start;
    if current.hour() < WORK_START_HOUR {
        current = at_hour(current.date(), WORK_START_HOUR);
    } else if current.hour() >= WORK_END_HOUR {
        current = at_hour(current.date() + Duration::days(1), WORK_START_HOUR);
    }

    // Clip the end into the window. An end inside hour 17 (e.g. 17:30)
    // is left as-is; the per-day clamp below bounds it to 17:00.
    let mut end = end;
    if end.hour() > WORK_END_HOUR {
        end = at_hour(end.date(), WORK_END_HOUR);
    } else if end.hour() < WORK_START_HOUR {
        end = at_hour(end.date(), WORK_START_HOUR);
    }

    let mut total = Duration::zero();
    while current < end {
        if !is_weekend(current.date()) {
            let window_start = at_hour(current.date(), WORK_START_HOUR);
            let window_end = at_hour(current.date(), WORK_END_HOUR);

            let interval_start = if current > window_start {
                current
            } else {
                window_start
            };
            let interval_end = if end < window_end { end } else { window_end };

            if interval_end > interval_start {
                total += interval_end - interval_start;
            }
        }
        current = at_hour(current.date() + Duration::days(1), WORK_START_HOUR);
    }

    total.num_milliseconds() as f64 / MILLIS_PER_HOUR
}
