use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn now_utc_rfc3339() -> Result<String, time::error::Format> {
    OffsetDateTime::now_utc().format(&Rfc3339)
}

pub fn format_date(value: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        value.year(),
        u8::from(value.month()),
        value.day()
    )
}

pub fn format_date_minute(value: OffsetDateTime) -> String {
    format!(
        "{} {:02}:{:02}",
        format_date(value),
        value.hour(),
        value.minute()
    )
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn now_utc_rfc3339_formats_timestamp() {
        let value = now_utc_rfc3339().expect("timestamp");
        assert!(value.ends_with('Z'));
        assert!(value.contains('T'));
    }

    #[test]
    fn format_date_pads_components() {
        assert_eq!(format_date(datetime!(2024-03-07 09:05 UTC)), "2024-03-07");
        assert_eq!(
            format_date_minute(datetime!(2024-03-07 09:05 UTC)),
            "2024-03-07 09:05"
        );
    }
}
