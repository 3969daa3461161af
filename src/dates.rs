use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, Duration,
    OffsetDateTime, UtcOffset,
};

/// Items whose expiry falls within this many days of "now" are flagged.
pub const EXPIRY_WINDOW_DAYS: i64 = 3;

/// Serde helpers rendering [`Date`] as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(date: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => super::serialize(d, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
            let raw = Option::<String>::deserialize(d)?;
            raw.map(|r| {
                super::super::parse_date(&r).ok_or_else(|| {
                    <D::Error as serde::de::Error>::custom(format!("invalid date: {r}"))
                })
            })
            .transpose()
        }
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (its UTC calendar date).
pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if let Ok(d) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Some(d);
    }
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .map(|ts| ts.to_offset(UtcOffset::UTC).date())
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Monday of the week containing `date`.
pub fn week_start(date: Date) -> Date {
    let back = (date.weekday().number_days_from_sunday() + 6) % 7;
    date.saturating_sub(Duration::days(i64::from(back)))
}

pub fn current_week_start(now: OffsetDateTime) -> Date {
    week_start(now.to_offset(UtcOffset::UTC).date())
}

/// An expiry date counts from its UTC midnight; absent dates never expire.
pub fn is_expiring_soon(expiry: Option<Date>, now: OffsetDateTime) -> bool {
    match expiry {
        Some(d) => d.midnight().assume_utc() <= now + Duration::days(EXPIRY_WINDOW_DAYS),
        None => false,
    }
}
