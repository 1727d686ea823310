//! Text line rendering.
//!
//! Lines have the shape `[prefix] YYYY/MM/DD HH:MM:SS [LEVEL] message\n`,
//! followed verbatim by the stack trace for levels that capture one.

use lazy_static::lazy_static;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::record::Level;

lazy_static! {
    /// Local UTC offset, resolved once.
    ///
    /// Resolution can fail on platforms where reading the local zone is unsound
    /// once other threads exist; timestamps are then rendered in UTC.
    static ref LOCAL_OFFSET: UtcOffset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
}

/// Resolves the local offset now instead of on the first emission.
///
/// Call it from `main` before spawning threads. Every [`Logger`](crate::Logger)
/// constructor calls it too.
pub fn init_local_offset() {
    lazy_static::initialize(&LOCAL_OFFSET);
}

/// The offset timestamps are rendered in.
pub fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET
}

/// Current wall-clock time in the local offset.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(*LOCAL_OFFSET)
}

/// Formats `ts` as `YYYY/MM/DD HH:MM:SS`.
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    let layout = format_description!("[year]/[month]/[day] [hour]:[minute]:[second]");
    ts.format(layout).unwrap_or_else(|_| {
        format!(
            "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
            ts.year(),
            u8::from(ts.month()),
            ts.day(),
            ts.hour(),
            ts.minute(),
            ts.second()
        )
    })
}

/// Builds the full byte line for one emission.
///
/// An empty prefix renders no bracket segment at all.
pub fn render_line(
    prefix: &str,
    ts: OffsetDateTime,
    level: Level,
    message: &str,
    stack_trace: &[u8],
) -> Vec<u8> {
    let mut head = String::with_capacity(prefix.len() + message.len() + 32);
    if !prefix.is_empty() {
        head.push('[');
        head.push_str(prefix);
        head.push_str("] ");
    }
    head.push_str(&format_timestamp(ts));
    head.push_str(" [");
    head.push_str(level.as_str());
    head.push_str("] ");
    head.push_str(message);
    head.push('\n');

    let mut line = head.into_bytes();
    line.extend_from_slice(stack_trace);
    line
}
