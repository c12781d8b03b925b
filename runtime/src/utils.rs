use std::cmp::Ordering;
use std::str::FromStr;

use chrono_tz::Tz;

use crate::{RuntimeError, RuntimeResult};

fn find_tz_from_env() -> Option<Tz> {
    std::env::var("TZ").ok().and_then(|tz| Tz::from_str(&tz).ok())
}

/// The process timezone taken from `TZ`, falling back to UTC.
pub fn get_local_tz() -> Tz {
    find_tz_from_env().unwrap_or(Tz::UTC)
}

/// Resolves an IANA timezone name. An empty name or `"local"` selects the
/// process timezone.
pub fn parse_timezone(tz_name: &str) -> RuntimeResult<Tz> {
    if tz_name.is_empty() || tz_name.eq_ignore_ascii_case("local") {
        return Ok(get_local_tz());
    }
    tz_name
        .parse()
        .map_err(|e| RuntimeError::InvalidTimezone(format!("{tz_name}: {e:?}")))
}

/// Orders floats ascending with NaN after every number.
pub(crate) fn float_cmp_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Orders floats descending with NaN after every number.
pub(crate) fn float_cmp_desc_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
