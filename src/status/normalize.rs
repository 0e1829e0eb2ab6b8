//! Conversions from raw vendor values to bounded metrics.
//!
//! | Metric        | Source   | Raw              | Output                       |
//! |---------------|----------|------------------|------------------------------|
//! | power         | `fanc`   | `"0"` / `"1"`    | `raw == "1"`                 |
//! | amount        | `speedc` | `"1"`..`"3"`     | parsed, `0` if unknown       |
//! | wifi          | `wific`  | dBm, e.g. `-40`  | `clamp(100 + raw, 0, 100)`   |
//! | perfume level | `fillc`  | `0..=16000`      | `round(raw / 160)`, clamped  |
//! | battery       | `battc`  | percent          | clamped to `0..=100`         |

/// Full-cartridge value of the `fillc` sensor.
pub const FILL_FULL_SCALE: f64 = 16000.0;

/// Leading-integer parse: optional sign followed by digits, anything after
/// the digits is ignored (`"-61dBm"` → `-61`, `"8000.7"` → `8000`).
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    // Saturate rather than fail on absurdly long digit runs.
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

pub fn is_on(fan: Option<&str>) -> bool {
    fan == Some("1")
}

/// `1..=3`, or `0` when the value is missing, unparseable or out of range.
pub fn perfume_amount(speed: Option<&str>) -> i64 {
    speed
        .and_then(parse_int)
        .filter(|amount| (1..=3).contains(amount))
        .unwrap_or(0)
}

pub fn room_size(room: Option<&str>) -> Option<i64> {
    room.and_then(parse_int)
}

pub fn wifi_percent(raw_dbm: i64) -> i64 {
    raw_dbm.saturating_add(100).clamp(0, 100)
}

pub fn perfume_level_percent(raw_fill: i64) -> i64 {
    let percent = (raw_fill as f64 / FILL_FULL_SCALE * 100.0).round();
    percent.clamp(0.0, 100.0) as i64
}

pub fn battery_percent(raw: i64) -> i64 {
    raw.clamp(0, 100)
}
