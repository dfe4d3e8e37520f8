use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use std::sync::OnceLock;

fn display_re() -> &'static Regex {
    static DISPLAY_RE: OnceLock<Regex> = OnceLock::new();
    DISPLAY_RE.get_or_init(|| Regex::new(r"(?i)([0-9]+):([0-9]+)\s*(AM|PM)").expect("valid time pattern"))
}

/// `"14:30"` -> `"2:30 PM"`. Returns an empty string unless the input is a
/// valid 24-hour `HH:mm` time.
pub fn raw_to_display(raw: &str) -> String {
    let Ok(time) = NaiveTime::parse_from_str(raw.trim(), "%H:%M") else {
        return String::new();
    };

    let hour = time.hour();
    let ampm = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, time.minute(), ampm)
}

/// `"2:30 pm"` -> `"14:30"`. Returns an empty string when no `h:mm AM|PM`
/// value can be found in the input.
pub fn display_to_raw(display: &str) -> String {
    if !display.contains(':') {
        return String::new();
    }
    let Some(caps) = display_re().captures(display) else {
        return String::new();
    };
    let (Ok(mut hour), Ok(minute)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
        return String::new();
    };
    let is_pm = caps[3].eq_ignore_ascii_case("PM");

    if is_pm && hour < 12 {
        hour += 12;
    }
    if !is_pm && hour == 12 {
        hour = 0;
    }
    format!("{:02}:{:02}", hour, minute)
}

/// Human label for a task date relative to the local calendar day.
pub fn format_date(date_str: &str) -> String {
    format_date_on(date_str, Local::now().date_naive())
}

pub fn format_date_on(date_str: &str, today: NaiveDate) -> String {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let Some(date) = parse_calendar_date(trimmed) else {
        return trimmed.to_string();
    };

    if date == today {
        "Today".to_string()
    } else if today.succ_opt() == Some(date) {
        "Tomorrow".to_string()
    } else {
        format!("{} {}", date.format("%b"), date.day())
    }
}

fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}
