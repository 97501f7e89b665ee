use super::Config;
use crate::{
    event::format_timestamp,
    util::{eprint_err, ErrorCode},
};
use chrono::{
    format::{parse, Parsed, StrftimeItems},
    DateTime, Local, NaiveDateTime, TimeDelta, TimeZone,
};
use std::{
    io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

// Start of the window that contains `now`; windows are aligned in local time.
pub(super) fn window_start<Tz: TimeZone>(now: DateTime<Tz>, interval: Duration) -> DateTime<Tz> {
    let interval_secs = i64::try_from(interval.as_secs()).unwrap_or(i64::MAX).max(1);
    let local_secs = now.naive_local().and_utc().timestamp();
    let offset_in_window = local_secs.rem_euclid(interval_secs);
    let naive_start = DateTime::from_timestamp(local_secs - offset_in_window, 0)
        .map(|utc| utc.naive_utc());
    let subsec_nanos = i64::from(now.timestamp_subsec_nanos());
    naive_start
        .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest())
        // window start falls into a gap of the local clock
        .unwrap_or_else(|| {
            now - TimeDelta::seconds(offset_in_window) - TimeDelta::nanoseconds(subsec_nanos)
        })
}

// End of the window that starts at `start`, which is also the start of the next window.
// The end is computed on the local clock, so that windows stay aligned across
// daylight saving changes; if the local end doesn't exist, the clock was put forward.
// The interval is validated to fit into an i64 number of seconds.
pub(super) fn window_end<Tz: TimeZone>(start: DateTime<Tz>, interval: Duration) -> DateTime<Tz> {
    let length = TimeDelta::seconds(
        i64::try_from(interval.as_secs()).unwrap_or(i64::from(u32::MAX)),
    );
    let local_end = start.naive_local() + length;
    start
        .timezone()
        .from_local_datetime(&local_end)
        .earliest()
        .unwrap_or(start + length)
}

// The instant at which the local clock reaches `timestamp`.
pub(super) fn deadline_of(timestamp: &DateTime<Local>) -> Instant {
    let now = Instant::now();
    match (*timestamp - Local::now()).to_std() {
        Ok(remaining) => now + remaining,
        // already passed
        Err(_) => now,
    }
}

// The path to which the live file is renamed when the window that started at `start` is closed.
pub(super) fn partition_path(config: &Config, start: &DateTime<Local>) -> PathBuf {
    let mut name = config.path.as_os_str().to_os_string();
    name.push(".");
    name.push(format_timestamp(start, &config.timestamp_format));
    PathBuf::from(name)
}

fn invalid_data<E: Into<Box<dyn std::error::Error + Send + Sync>>>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

// Parses a formatted window start back into local clock time.
// Time components that the format doesn't contain are zero, a missing time of day is midnight.
pub(super) fn parse_naive_timestamp(s: &str, format: &str) -> Result<NaiveDateTime, io::Error> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, s, StrftimeItems::new(format)).map_err(invalid_data)?;
    let date = parsed.to_naive_date().map_err(invalid_data)?;
    // only fills what is missing; values that were parsed are kept
    parsed.set_second(0).ok();
    parsed.set_minute(0).ok();
    if parsed.to_naive_time().is_err() {
        // no hour at all, or a 12-hour clock without am/pm
        parsed.set_hour(0).ok();
    }
    let time = parsed.to_naive_time().map_err(invalid_data)?;
    Ok(date.and_time(time))
}

fn parse_partition_timestamp(suffix: &str, format: &str) -> Result<DateTime<Local>, io::Error> {
    let naive = parse_naive_timestamp(suffix, format)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| invalid_data("nonexistent local time"))
}

// Whether the partition name of a window that starts at `start` identifies that start.
pub(super) fn is_reversible(format: &str, start: &DateTime<Local>) -> bool {
    parse_naive_timestamp(&format_timestamp(start, format), format)
        .is_ok_and(|naive| naive == start.naive_local())
}

fn folder_of(path: &Path) -> &Path {
    match path.parent() {
        Some(folder) if !folder.as_os_str().is_empty() => folder,
        _ => Path::new("."),
    }
}

// Removes the partitions whose window started at or before `closed_window_start - keep`.
// Files with unparseable timestamps are reported and left alone.
// Returns the number of removed files.
pub(super) fn remove_expired_partitions(
    config: &Config,
    closed_window_start: &DateTime<Local>,
) -> Result<usize, io::Error> {
    if config.keep.is_zero() {
        return Ok(0);
    }
    let Some(horizon) = TimeDelta::from_std(config.keep)
        .ok()
        .and_then(|keep| closed_window_start.checked_sub_signed(keep))
    else {
        // nothing is old enough
        return Ok(0);
    };
    let Some(live_name) = config.path.file_name().and_then(|n| n.to_str()) else {
        return Ok(0);
    };
    let prefix = format!("{live_name}.");

    let mut removed = 0;
    for entry in std::fs::read_dir(folder_of(&config.path))? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                eprint_err(ErrorCode::Cleanup, "cannot read folder entry", &e);
                continue;
            }
        };
        let file_name = entry.file_name();
        let Some(suffix) = file_name.to_str().and_then(|name| name.strip_prefix(&prefix)) else {
            continue;
        };
        match parse_partition_timestamp(suffix, &config.timestamp_format) {
            Err(e) => eprint_err(
                ErrorCode::Cleanup,
                &format!("cannot parse timestamp of {}", entry.path().display()),
                &e,
            ),
            Ok(timestamp) if timestamp <= horizon => {
                if let Err(e) = std::fs::remove_file(entry.path()) {
                    eprint_err(
                        ErrorCode::Cleanup,
                        &format!("cannot remove {}", entry.path().display()),
                        &e,
                    );
                } else {
                    removed += 1;
                }
            }
            Ok(_) => {}
        }
    }
    Ok(removed)
}
