use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Optional `YYYY-MM-DD` date where a blank string, as left behind by an
/// empty date input, means "no date".
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| de::Error::custom(format!("invalid date '{raw}': {e}")))
}
