//! Bounded in-memory pipe backing the live mirror stream.
//!
//! The write half is owned by the [`Multiplexer`](crate::multiplexer::Multiplexer)
//! and receives a copy of every line; the read half is handed to the caller
//! and implements [`std::io::Read`]. The pipe holds at most `capacity` bytes.
//! A writer facing a full pipe waits for the reader to drain it, but never
//! longer than its write timeout.
//!
//! Closing the write half (explicitly or by dropping it) lets the reader drain
//! whatever was already buffered and then observe end-of-stream. Dropping the
//! read half makes every later write fail with `BrokenPipe`.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

struct PipeState {
    buf: VecDeque<u8>,
    writer_closed: bool,
    reader_gone: bool,
}

struct Pipe {
    state: Mutex<PipeState>,
    readable: Condvar,
    writable: Condvar,
    capacity: usize,
}

/// Creates a connected mirror pipe.
///
/// `capacity` is clamped to at least one byte.
pub fn pipe(capacity: usize, write_timeout: Duration) -> (MirrorWriter, MirrorReader) {
    let pipe = Arc::new(Pipe {
        state: Mutex::new(PipeState {
            buf: VecDeque::with_capacity(capacity.max(1)),
            writer_closed: false,
            reader_gone: false,
        }),
        readable: Condvar::new(),
        writable: Condvar::new(),
        capacity: capacity.max(1),
    });

    (
        MirrorWriter {
            pipe: Arc::clone(&pipe),
            write_timeout,
        },
        MirrorReader { pipe },
    )
}

/// Producer half of a mirror pipe.
pub struct MirrorWriter {
    pipe: Arc<Pipe>,
    write_timeout: Duration,
}

impl MirrorWriter {
    /// Writes all of `data`, waiting for the reader while the pipe is full.
    ///
    /// A buffer that fits in the pipe is handed over in one piece: the writer
    /// waits until there is room for all of it, and on `TimedOut` none of it
    /// has been queued. Only a buffer larger than the whole pipe is streamed
    /// in chunks, and a timeout there can leave its head in the pipe.
    /// Fails with `BrokenPipe` once either half is closed.
    ///
    /// A write timeout too large to express as a deadline waits without limit.
    pub fn write_all_timeout(&self, mut data: &[u8]) -> io::Result<()> {
        let deadline = Instant::now().checked_add(self.write_timeout);
        let mut state = self.pipe.state.lock();

        while !data.is_empty() {
            if state.writer_closed {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mirror stream closed"));
            }
            if state.reader_gone {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mirror reader dropped"));
            }

            let room = self.pipe.capacity - state.buf.len();
            let needed = data.len().min(self.pipe.capacity);
            if room < needed {
                let timed_out = match deadline {
                    Some(deadline) => self.pipe.writable.wait_until(&mut state, deadline).timed_out(),
                    None => {
                        self.pipe.writable.wait(&mut state);
                        false
                    }
                };
                if timed_out && self.pipe.capacity - state.buf.len() < needed {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!(
                            "mirror reader did not drain within {:?} ({} bytes pending)",
                            self.write_timeout,
                            data.len()
                        ),
                    ));
                }
                continue;
            }

            let n = room.min(data.len());
            state.buf.extend(&data[..n]);
            data = &data[n..];
            self.pipe.readable.notify_one();
        }

        Ok(())
    }

    /// Closes the stream. The reader drains buffered bytes, then sees EOF.
    pub fn close(&self) {
        let mut state = self.pipe.state.lock();
        if !state.writer_closed {
            state.writer_closed = true;
            self.pipe.readable.notify_all();
            self.pipe.writable.notify_all();
        }
    }

    /// Whether the reader has been dropped.
    pub fn is_reader_gone(&self) -> bool {
        self.pipe.state.lock().reader_gone
    }
}

impl Drop for MirrorWriter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Consumer half of a mirror pipe, returned by
/// [`Logger::acquire_mirror`](crate::Logger::acquire_mirror).
///
/// Reads block until bytes arrive or the stream is closed. Wrap it in a
/// [`std::io::BufReader`] to consume it line by line.
pub struct MirrorReader {
    pipe: Arc<Pipe>,
}

impl MirrorReader {
    /// Number of bytes buffered and not yet read.
    pub fn pending(&self) -> usize {
        self.pipe.state.lock().buf.len()
    }
}

impl Read for MirrorReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        let mut state = self.pipe.state.lock();
        loop {
            if !state.buf.is_empty() {
                let n = out.len().min(state.buf.len());
                for (dst, byte) in out.iter_mut().zip(state.buf.drain(..n)) {
                    *dst = byte;
                }
                self.pipe.writable.notify_one();
                return Ok(n);
            }
            if state.writer_closed {
                return Ok(0);
            }
            self.pipe.readable.wait(&mut state);
        }
    }
}

impl Drop for MirrorReader {
    fn drop(&mut self) {
        let mut state = self.pipe.state.lock();
        state.reader_gone = true;
        state.buf.clear();
        self.pipe.writable.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_close_drains_then_eof() {
        let (writer, mut reader) = pipe(64, Duration::from_millis(100));
        writer.write_all_timeout(b"hello ").unwrap();
        writer.write_all_timeout(b"world").unwrap();
        writer.close();

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello world");

        let err = writer.write_all_timeout(b"late").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_full_pipe_times_out() {
        let (writer, reader) = pipe(4, Duration::from_millis(50));
        let start = Instant::now();
        let err = writer.write_all_timeout(b"too long").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(reader.pending(), 4);
    }

    #[test]
    fn test_fitting_write_is_all_or_nothing() {
        let (writer, mut reader) = pipe(10, Duration::from_millis(30));
        writer.write_all_timeout(b"123456").unwrap();

        let err = writer.write_all_timeout(b"abcdef").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_eq!(reader.pending(), 6);

        let mut head = [0u8; 6];
        reader.read_exact(&mut head).unwrap();
        writer.write_all_timeout(b"abcdef").unwrap();
        writer.close();

        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(&head, b"123456");
        assert_eq!(rest, "abcdef");
    }

    #[test]
    fn test_unbounded_timeout_waits_for_reader() {
        let (writer, mut reader) = pipe(4, Duration::MAX);
        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let mut got = Vec::new();
            reader.read_to_end(&mut got).unwrap();
            got
        });

        writer.write_all_timeout(b"abcd").unwrap();
        writer.write_all_timeout(b"efgh").unwrap();
        drop(writer);

        assert_eq!(consumer.join().unwrap(), b"abcdefgh".to_vec());
    }

    #[test]
    fn test_dropped_reader_breaks_pipe() {
        let (writer, reader) = pipe(16, Duration::from_secs(5));
        drop(reader);
        assert!(writer.is_reader_gone());
        let err = writer.write_all_timeout(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_large_write_streams_through_small_pipe() {
        let (writer, mut reader) = pipe(8, Duration::from_secs(5));
        let payload: Vec<u8> = (0..200u8).collect();
        let expected = payload.clone();

        let consumer = thread::spawn(move || {
            let mut got = Vec::new();
            reader.read_to_end(&mut got).unwrap();
            got
        });

        writer.write_all_timeout(&payload).unwrap();
        drop(writer);

        assert_eq!(consumer.join().unwrap(), expected);
    }
}
