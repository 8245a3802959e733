// libs/shared/utils/src/dates.rs
use chrono::{Local, NaiveDate};

/// Calendar date of a `YYYY-MM-DD` string, ignoring any time component.
///
/// Accepts `2024-06-10`, `2024-06-10T08:00:00Z` and `2024-06-10 08:00`, as
/// well as unpadded month/day parts. Returns `None` for anything else.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split('T').next()?.split(' ').next()?;
    let mut parts = date_part.split('-');

    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let day = parts.next()?.parse::<u32>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's calendar date in the local timezone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Serde adapter for dates that tolerates a trailing time component on input.
pub mod lenient {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::normalize_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date {:?}: expected YYYY-MM-DD", raw)))
    }
}

/// Like [`lenient`], for optional date fields.
pub mod lenient_option {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::normalize_date(&raw).map(Some).ok_or_else(|| {
                de::Error::custom(format!("invalid date {:?}: expected YYYY-MM-DD", raw))
            }),
            None => Ok(None),
        }
    }
}
