use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

/// Days since 1970-01-01 for `date`.
#[must_use]
pub fn epoch_day(date: NaiveDate) -> i64 {
    date.signed_duration_since(NaiveDate::default()).num_days()
}

/// Current UTC epoch day.
#[must_use]
pub fn today() -> i64 {
    epoch_day(Utc::now().date_naive())
}

/// Resolve a CLI day argument: an integer epoch day, an ISO date, or
/// `today` when nothing was given.
pub fn resolve_day(arg: Option<&str>) -> Result<i64> {
    let Some(raw) = arg.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(today());
    };
    if raw.eq_ignore_ascii_case("today") {
        return Ok(today());
    }
    if let Ok(day) = raw.parse::<i64>() {
        return Ok(day);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("'{raw}' is neither an epoch day nor a YYYY-MM-DD date"))?;
    Ok(epoch_day(date))
}
