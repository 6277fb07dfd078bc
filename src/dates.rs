use chrono::{Datelike, Local, NaiveDate, NaiveTime};

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Today's local calendar day as `D/M/YYYY`, without zero padding.
pub fn current_date_string() -> String {
    date_string(Local::now().date_naive())
}

pub fn date_string(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

/// Parses a canonical `D/M/YYYY` string. Out-of-range components yield `None`.
pub fn parse_date_string(raw: &str) -> Option<NaiveDate> {
    let (day, month, year) = split_components(raw)?;
    let day = u32::try_from(day).ok()?;
    let month = u32::try_from(month).ok()?;
    let year = i32::try_from(year).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// True iff `a` is a strictly later calendar day than `b`. Unparsable input is never after.
pub fn is_after(a: &str, b: &str) -> bool {
    match (parse_date_string(a), parse_date_string(b)) {
        (Some(a), Some(b)) => a > b,
        _ => false,
    }
}

/// Renders `D/MON/YYYY`, e.g. `5/JUN/2024`. Input that does not parse is returned as-is.
pub fn format_for_display(raw: &str) -> String {
    match split_components(raw) {
        Some((day, month, year)) if (1..=12).contains(&month) => {
            format!("{}/{}/{}", day, MONTHS[(month - 1) as usize], year)
        }
        _ => raw.to_string(),
    }
}

/// Local 12-hour clock label such as `09:05 AM`.
pub fn time_label(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string().to_uppercase()
}

pub fn current_time_label() -> String {
    time_label(Local::now().time())
}

fn split_components(raw: &str) -> Option<(i64, i64, i64)> {
    let mut parts = raw.trim().split('/');
    let day = parts.next()?.trim().parse().ok()?;
    let month = parts.next()?.trim().parse().ok()?;
    let year = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((day, month, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_string_is_unpadded() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(date_string(date), "5/6/2024");
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(date_string(date), "31/12/2023");
    }

    #[test]
    fn current_date_round_trips_through_parse() {
        let today = current_date_string();
        assert!(parse_date_string(&today).is_some());
    }

    #[test]
    fn is_after_compares_calendar_days() {
        assert!(is_after("6/6/2024", "5/6/2024"));
        assert!(is_after("1/1/2025", "31/12/2024"));
        assert!(!is_after("5/6/2024", "5/6/2024"));
        assert!(!is_after("4/6/2024", "5/6/2024"));
        // lexical order would say otherwise
        assert!(is_after("10/2/2024", "9/12/2023"));
    }

    #[test]
    fn is_after_treats_garbage_as_not_after() {
        assert!(!is_after("not a date", "5/6/2024"));
        assert!(!is_after("5/6/2024", ""));
        assert!(!is_after("31/2/2024", "1/1/2000"));
        // 2^32 + 2000 must not wrap around to the year 2000
        assert!(parse_date_string("5/6/4294969296").is_none());
        assert!(!is_after("6/6/4294969296", "5/6/2000"));
    }

    #[test]
    fn display_uses_uppercase_month() {
        assert_eq!(format_for_display("5/6/2024"), "5/JUN/2024");
        assert_eq!(format_for_display("17/1/2025"), "17/JAN/2025");
        assert_eq!(format_for_display("1/12/1999"), "1/DEC/1999");
    }

    #[test]
    fn display_passes_through_bad_input() {
        assert_eq!(format_for_display("5/13/2024"), "5/13/2024");
        assert_eq!(format_for_display("5/0/2024"), "5/0/2024");
        assert_eq!(format_for_display("yesterday"), "yesterday");
        assert_eq!(format_for_display(""), "");
    }

    #[test]
    fn time_label_is_twelve_hour() {
        let t = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(time_label(t), "09:05 AM");
        let t = NaiveTime::from_hms_opt(21, 40, 0).unwrap();
        assert_eq!(time_label(t), "09:40 PM");
        let t = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        assert_eq!(time_label(t), "12:00 AM");
    }
}
