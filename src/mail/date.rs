use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime, TimeZone};
use std::fmt::Display;

use super::message::Message;
use crate::config::HeaderConfig;

/// Add a header with the message Date converted to local time.
///
/// Does nothing when there is no Date header. An unparseable Date doesn't
/// abort the filter: the added header carries `Error: <reason>` instead.
pub fn add_local_date_header(message: &mut Message, headers: &HeaderConfig) {
    let Some(date) = message.find("Date").map(|h| h.value().to_string()) else {
        return;
    };
    if date.is_empty() {
        return;
    }

    let value = local_date_value(&date, &Local);
    message.append(&headers.local_date, &value);
}

/// Header value for `date` shown in `tz`: an RFC 5322 date, or
/// `Error: <reason>` when it can't be parsed or represented.
pub fn local_date_value<Tz: TimeZone>(date: &str, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    match convert_date(date, tz) {
        // RFC 5322 only has room for four-digit years
        Ok(local) if (0..=9999).contains(&local.year()) => {
            local.format("%a, %d %b %Y %H:%M:%S %z").to_string()
        }
        Ok(local) => {
            tracing::warn!(date = %date, year = local.year(), "Date out of range");
            format!("Error: year {} cannot be represented", local.year())
        }
        Err(e) => {
            tracing::warn!(date = %date, "unparseable Date header: {}", e);
            format!("Error: {}", e)
        }
    }
}

/// Parse an RFC 5322 date and express the same instant in `tz`
pub fn convert_date<Tz: TimeZone>(value: &str, tz: &Tz) -> Result<DateTime<Tz>, chrono::ParseError> {
    let parsed = match DateTime::parse_from_rfc2822(value) {
        Ok(parsed) => parsed,
        Err(e) => parse_lenient(value)
            .or_else(|| parse_zoneless(value))
            .ok_or(e)?,
    };
    Ok(parsed.with_timezone(tz))
}

/// Dates without a zone are taken as UTC, like RFC 5322's `-0000`
fn parse_zoneless(value: &str) -> Option<DateTime<FixedOffset>> {
    const FORMATS: [&str; 4] = [
        "%a, %d %b %Y %H:%M:%S",
        "%d %b %Y %H:%M:%S",
        "%a, %d %b %Y %H:%M",
        "%d %b %Y %H:%M",
    ];

    let value = value.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Fall back to mail-parser's date parser for dates chrono's strict RFC 2822
/// parser rejects.
fn parse_lenient(value: &str) -> Option<DateTime<FixedOffset>> {
    let raw = format!("Date: {}\r\n\r\n", value);
    let message = mail_parser::MessageParser::default().parse(raw.as_bytes())?;
    let date = message.date()?;

    let offset_secs = (date.tz_hour as i32 * 3600 + date.tz_minute as i32 * 60)
        * if date.tz_before_gmt { -1 } else { 1 };
    let offset = FixedOffset::east_opt(offset_secs)?;

    let utc = DateTime::from_timestamp(date.to_timestamp(), 0)?;
    Some(utc.with_timezone(&offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(raw: &str) -> Message {
        Message::parse(raw.as_bytes()).unwrap()
    }

    fn show<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        dt.format("%Y-%m-%d %H:%M:%S %z").to_string()
    }

    #[test]
    fn test_convert_to_fixed_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = convert_date("Mon, 1 Jan 2024 12:00:00 +0000", &plus_two).unwrap();
        assert_eq!(show(&local), "2024-01-01 14:00:00 +0200");

        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let local = convert_date("Tue, 2 Jan 2024 01:30:00 +0100", &minus_five).unwrap();
        assert_eq!(show(&local), "2024-01-01 19:30:00 -0500");
    }

    #[test]
    fn test_convert_symbolic_zone() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let local = convert_date("Mon, 1 Jan 2024 12:00:00 GMT", &utc).unwrap();
        assert_eq!(show(&local), "2024-01-01 12:00:00 +0000");

        let local = convert_date("Mon, 1 Jan 2024 12:00:00 EST", &utc).unwrap();
        assert_eq!(show(&local), "2024-01-01 17:00:00 +0000");
    }

    #[test]
    fn test_convert_garbage_fails() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert!(convert_date("not a date", &utc).is_err());
        assert!(convert_date("", &utc).is_err());
    }

    #[test]
    fn test_same_instant_in_local_time() {
        let mut msg = message("Date: Mon, 1 Jan 2024 12:00:00 +0000\nSubject: x\n\n");
        add_local_date_header(&mut msg, &HeaderConfig::default());

        let added = msg.headers().last().unwrap();
        assert_eq!(added.name(), "X-Date");

        let original = DateTime::parse_from_rfc2822("Mon, 1 Jan 2024 12:00:00 +0000").unwrap();
        let converted = DateTime::parse_from_rfc2822(added.value()).unwrap();
        assert_eq!(original.timestamp(), converted.timestamp());
        assert_eq!(
            converted.offset().local_minus_utc(),
            original.with_timezone(&Local).offset().local_minus_utc()
        );
    }

    #[test]
    fn test_no_date_is_noop() {
        let mut msg = message("Subject: x\n\n");
        let before = msg.clone();
        add_local_date_header(&mut msg, &HeaderConfig::default());
        assert_eq!(msg, before);

        let mut msg = message("Date:\nSubject: x\n\n");
        let before = msg.clone();
        add_local_date_header(&mut msg, &HeaderConfig::default());
        assert_eq!(msg, before);
    }

    #[test]
    fn test_value_is_zero_padded_rfc5322() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(
            local_date_value("Mon, 1 Jan 2024 12:00:00 +0000", &utc),
            "Mon, 01 Jan 2024 12:00:00 +0000"
        );
    }

    #[test]
    fn test_out_of_range_year_degrades() {
        let utc = FixedOffset::east_opt(0).unwrap();

        let value = local_date_value("Fri, 31 Dec 9999 23:00:00 -0500", &utc);
        assert_eq!(value, "Error: year 10000 cannot be represented");

        let value = local_date_value("Sat, 1 Jan 0000 00:30:00 +0100", &utc);
        assert!(value.starts_with("Error: "), "{}", value);

        let value = local_date_value("1 Jan 65535 00:00:00 +0000", &utc);
        assert!(value.starts_with("Error: "), "{}", value);
    }

    #[test]
    fn test_out_of_range_year_in_message() {
        let mut msg = message("Date: Fri, 31 Dec 9999 23:00:00 -0500\nSubject: x\n\n");
        add_local_date_header(&mut msg, &HeaderConfig::default());
        assert!(msg.find("X-Date").is_some());
    }

    #[test]
    fn test_zoneless_date_is_utc() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let local = convert_date("Mon, 1 Jan 2024 12:00:00", &utc).unwrap();
        assert_eq!(show(&local), "2024-01-01 12:00:00 +0000");

        let local = convert_date("1 Jan 2024 12:00", &utc).unwrap();
        assert_eq!(show(&local), "2024-01-01 12:00:00 +0000");
    }

    #[test]
    fn test_bad_date_is_reported_in_header() {
        let mut msg = message("Date: sometime last week\n\n");
        add_local_date_header(&mut msg, &HeaderConfig::default());

        let added = msg.find("X-Date").unwrap();
        assert!(added.value().starts_with("Error: "));
        assert_eq!(msg.headers().len(), 2);
    }

    #[test]
    fn test_uses_first_date_and_configured_name() {
        let mut msg = message(
            "Date: Mon, 1 Jan 2024 12:00:00 +0000\nDate: Tue, 2 Jan 2024 12:00:00 +0000\n\n",
        );
        let headers = HeaderConfig {
            local_date: "X-Local-Date".to_string(),
            ..HeaderConfig::default()
        };
        add_local_date_header(&mut msg, &headers);

        let added = msg.find("x-local-date").unwrap();
        let converted = DateTime::parse_from_rfc2822(added.value()).unwrap();
        assert_eq!(converted.timestamp(), 1704110400);
        assert_eq!(msg.find_all("X-Local-Date").count(), 1);
    }
}
