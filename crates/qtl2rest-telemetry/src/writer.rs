//! Stdout writer that flushes after every record.

use std::io::{self, StdoutLock, Write};

use tracing_subscriber::fmt::MakeWriter;

/// [`MakeWriter`] handing out locked stdout handles that flush on drop.
///
/// The fmt layer drops its writer once per event, so every line reaches the
/// terminal (or pipe) as soon as it is formatted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlushingStdout;

impl<'a> MakeWriter<'a> for FlushingStdout {
    type Writer = FlushOnDrop<StdoutLock<'static>>;

    fn make_writer(&'a self) -> Self::Writer {
        FlushOnDrop::new(io::stdout().lock())
    }
}

/// Wraps a writer and flushes it when dropped.
#[derive(Debug)]
pub struct FlushOnDrop<W: Write> {
    inner: W,
}

impl<W: Write> FlushOnDrop<W> {
    /// Wraps `inner`.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for FlushOnDrop<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Drop for FlushOnDrop<W> {
    fn drop(&mut self) {
        // Nowhere to report a failed flush of the log stream itself.
        let _ = self.inner.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Recorder {
        flushes: Arc<Mutex<usize>>,
        data: Arc<Mutex<Vec<u8>>>,
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            *self.flushes.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_flushes_on_drop() {
        let recorder = Recorder::default();
        {
            let mut writer = FlushOnDrop::new(recorder.clone());
            writer.write_all(b"line\n").unwrap();
            assert_eq!(*recorder.flushes.lock().unwrap(), 0);
        }
        assert_eq!(*recorder.flushes.lock().unwrap(), 1);
        assert_eq!(recorder.data.lock().unwrap().as_slice(), b"line\n");
    }

    #[test]
    fn test_make_writer_yields_stdout() {
        let mut writer = FlushingStdout.make_writer();
        assert!(writer.write_all(b"").is_ok());
    }
}
