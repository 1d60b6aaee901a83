//! Pipe-delimited event formatter.
//!
//! Every event becomes one line:
//!
//! ```text
//! 2024-05-01 12:00:00.000123+02:00|INFO|qtl2rest|4242|/markers|0.0021
//! ```
//!
//! The fields are the local timestamp, the level, the configured logger name,
//! the process id and finally the event message followed by any extra fields.

use std::fmt;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// `chrono` pattern for the leading timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";

/// Column separator.
pub const SEPARATOR: char = '|';

/// Formats events as `timestamp|LEVEL|logger|pid|message`.
#[derive(Debug, Clone)]
pub struct PipeFormat {
    logger_name: String,
    pid: u32,
}

impl PipeFormat {
    /// Creates a formatter that stamps lines with `logger_name` and the
    /// current process id.
    #[must_use]
    pub fn new(logger_name: impl Into<String>) -> Self {
        Self {
            logger_name: logger_name.into(),
            pid: std::process::id(),
        }
    }

    /// The logger name written in the third column.
    #[must_use]
    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }
}

impl<S, N> FormatEvent<S, N> for PipeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{ts}{sep}{level}{sep}{name}{sep}{pid}{sep}",
            ts = chrono::Local::now().format(TIMESTAMP_FORMAT),
            sep = SEPARATOR,
            level = event.metadata().level(),
            name = self.logger_name,
            pid = self.pid,
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Capture;

    fn with_capture(f: impl FnOnce()) -> Vec<String> {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(PipeFormat::new("qtl2rest"))
            .with_writer(capture.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        capture.lines()
    }

    #[test]
    fn test_line_has_five_columns() {
        let lines = with_capture(|| tracing::info!("/markers|0.25"));

        assert_eq!(lines.len(), 1);
        let columns: Vec<&str> = lines[0].splitn(5, SEPARATOR).collect();
        assert_eq!(columns.len(), 5);
        assert!(chrono::DateTime::parse_from_str(columns[0], TIMESTAMP_FORMAT).is_ok());
        assert_eq!(columns[1], "INFO");
        assert_eq!(columns[2], "qtl2rest");
        assert_eq!(columns[3], std::process::id().to_string());
        assert_eq!(columns[4], "/markers|0.25");
    }

    #[test]
    fn test_error_level_column() {
        let lines = with_capture(|| tracing::error!("/lodscan|dataset=x|boom"));

        let columns: Vec<&str> = lines[0].splitn(5, SEPARATOR).collect();
        assert_eq!(columns[1], "ERROR");
        assert_eq!(columns[4], "/lodscan|dataset=x|boom");
    }

    #[test]
    fn test_extra_fields_follow_message() {
        let lines = with_capture(|| tracing::warn!(port = 8001, "bind retry"));

        assert!(lines[0].ends_with("bind retry port=8001"));
    }

    #[test]
    fn test_one_line_per_event() {
        let lines = with_capture(|| {
            tracing::info!("first");
            tracing::info!("second");
        });

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("|first"));
        assert!(lines[1].ends_with("|second"));
    }
}
