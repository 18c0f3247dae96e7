use chrono::{DateTime, Local, TimeZone};

pub fn today_date() -> String {
    format_date(&Local::now())
}

pub fn current_time() -> String {
    format_time(&Local::now())
}

/// `YYYY-MM-DD`
pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%d").to_string()
}

/// `HH:MM`, 24-hour clock.
pub fn format_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M").to_string()
}
