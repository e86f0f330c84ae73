use std::env;

use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::Timestamp;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Load a [`TimeZone`] specified by the `TZ` environment varible, or by the
/// provided string if the environment variable does not exist.
///
/// If neither exists, the system local time (or UTC on Windows) is used.
pub fn load_time_zone(tz_string: Option<&str>) -> Result<TimeZone, jiff::Error> {
    let env_string = env::var("TZ").ok();
    let Some(tz_string) = env_string.as_deref().or(tz_string) else {
        return Ok(TimeZone::system());
    };

    if tz_string == "localtime" {
        return Ok(TimeZone::system());
    }

    if let Some(tz_string) = tz_string.strip_prefix(':') {
        return TimeZone::get(tz_string);
    }

    // Parsing doesn't need a fs lookup, so try that first.
    if let Ok(tz) = TimeZone::posix(tz_string) {
        return Ok(tz);
    }

    TimeZone::get(tz_string)
}

/// Read a date as typed by a user, either `YYYY-MM-DD` or
/// `YYYY-MM-DD HH:MM`, in the given time zone.
pub fn parse_event_date(input: &str, tz: &TimeZone) -> Result<Timestamp, jiff::Error> {
    let input = input.trim();
    let datetime = match input.parse::<DateTime>() {
        Ok(datetime) => datetime,
        Err(err) => match input.parse::<Date>() {
            Ok(date) => date.to_datetime(jiff::civil::Time::midnight()),
            Err(_) => return Err(err),
        },
    };
    Ok(datetime.to_zoned(tz.clone())?.timestamp())
}

/// Show a date that came from the backend. Anything unparseable is shown
/// as-is.
pub fn format_event_date(raw: &str, tz: &TimeZone) -> String {
    match raw.parse::<Timestamp>() {
        Ok(time) => time.to_zoned(tz.clone()).strftime(TIME_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}
