use chrono::{DateTime, NaiveDate, TimeZone};

/// This is the standard way of converting a date to a string in daylog. Collectors put a day's
/// records into a folder with this name.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Distance between two moments in fractional hours.
pub fn hours_between<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> f64 {
    (end.clone() - start.clone()).num_milliseconds() as f64 / 3_600_000.
}
