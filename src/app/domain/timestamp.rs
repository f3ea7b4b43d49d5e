use time::OffsetDateTime;

/// Current time as unix seconds, the storage format for every timestamp column.
pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Convert a stored unix timestamp for RFC 3339 rendering. `None` if out of range.
pub fn from_unix(ts: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(ts).ok()
}
