//! Reference time taken from a notice's `Date` header.

use chrono::{DateTime, ParseError, Utc};

/// Parse an RFC 2822 email date such as `Tue, 4 Jun 2024 09:30:00 -0700`
///
/// Days may have one or two digits.
///
/// # Errors
///
/// The chrono parse error when the value is not an RFC 2822 date.
pub fn parse_email_date(value: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc2822(value.trim()).map(|dt| dt.with_timezone(&Utc))
}

/// The instant a notice was sent, or now when its date cannot be parsed
pub fn reference_time(date_header: &str) -> DateTime<Utc> {
    match parse_email_date(date_header) {
        Ok(sent) => sent,
        Err(err) => {
            tracing::warn!(date = date_header, error = %err, "unparseable email date, using current time");
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_two_digit_day() {
        let parsed = parse_email_date("Mon, 02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap());
    }

    #[test]
    fn test_one_digit_day() {
        let parsed = parse_email_date("Mon, 2 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_email_date("yesterday").is_err());
        assert!(parse_email_date("").is_err());
    }

    #[test]
    fn test_reference_time_falls_back_to_now() {
        let before = Utc::now();
        let reference = reference_time("not a date");
        assert!(reference >= before);
        assert!(reference <= Utc::now());
    }
}
