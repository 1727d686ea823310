use fanout_logger::{Console, Logger, LoggerConfig, LoggerError, TargetKind};
use parking_lot::Mutex;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn logger_with(config: LoggerConfig) -> Logger {
    Logger::with_config(config.with_product_prefix("Mirror").with_console(Console::Silent))
}

fn read_all_in_background(mut reader: impl Read + Send + 'static) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        text
    })
}

#[test]
fn test_mirror_requires_primary_output() {
    let logger = logger_with(LoggerConfig::default());
    match logger.acquire_mirror() {
        Err(LoggerError::NoPrimaryOutput) => {}
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("mirror acquired without a primary output"),
    }

    logger.set_primary_output(io::sink());
    logger.remove_primary_output();
    assert!(logger.acquire_mirror().is_err());
    assert!(!logger.has_mirror());
}

#[test]
fn test_mirror_copies_primary_output() {
    let logger = logger_with(LoggerConfig::default());
    let buf = SharedBuffer::default();
    logger.set_primary_output(buf.clone());

    let reader = logger.acquire_mirror().unwrap();
    let consumer = read_all_in_background(reader);

    fanout_logger::info!(logger, "Reader test message");
    fanout_logger::warn!(logger, "Reader warning");
    thread::sleep(Duration::from_millis(100));
    logger.release_mirror();

    let mirrored = consumer.join().unwrap();
    assert!(mirrored.contains("[INFO] Reader test message"));
    assert!(mirrored.contains("[WARN] Reader warning"));
    assert_eq!(mirrored, buf.text());
}

#[test]
fn test_reacquire_closes_previous_stream() {
    let logger = logger_with(LoggerConfig::default());
    logger.set_primary_output(io::sink());

    let first = logger.acquire_mirror().unwrap();
    let first_consumer = read_all_in_background(first);

    fanout_logger::info!(logger, "First reader message");

    let second = logger.acquire_mirror().unwrap();
    let first_text = first_consumer.join().unwrap();

    fanout_logger::warn!(logger, "Second reader message");
    logger.release_mirror();

    let mut second_text = String::new();
    let mut second = second;
    second.read_to_string(&mut second_text).unwrap();

    assert!(first_text.contains("First reader message"));
    assert!(!first_text.contains("Second reader message"));
    assert!(second_text.contains("Second reader message"));
    assert!(!second_text.contains("First reader message"));
}

#[test]
fn test_release_is_idempotent_and_detaches() {
    let logger = logger_with(LoggerConfig::default());
    logger.set_primary_output(io::sink());

    let _reader = logger.acquire_mirror().unwrap();
    assert_eq!(
        logger.targets(),
        vec![TargetKind::Console, TargetKind::Primary, TargetKind::Mirror]
    );

    logger.release_mirror();
    logger.release_mirror();
    assert_eq!(logger.targets(), vec![TargetKind::Console, TargetKind::Primary]);
}

#[test]
fn test_stalled_reader_costs_at_most_the_timeout() {
    let logger = logger_with(
        LoggerConfig::default()
            .with_mirror_capacity(16)
            .with_mirror_write_timeout(Duration::from_millis(50)),
    );
    let buf = SharedBuffer::default();
    logger.set_primary_output(buf.clone());

    let reader = logger.acquire_mirror().unwrap();

    let start = Instant::now();
    fanout_logger::info!(logger, "this line is longer than sixteen bytes");
    fanout_logger::info!(logger, "and so is this one");
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(5));
    assert!(buf.text().contains("longer than sixteen bytes"));
    assert!(buf.text().contains("and so is this one"));
    assert_eq!(reader.pending(), 16);
}

#[test]
fn test_timed_out_line_leaves_no_fragment() {
    let logger = logger_with(
        LoggerConfig::default()
            .with_mirror_capacity(64)
            .with_mirror_write_timeout(Duration::from_millis(30)),
    );
    let buf = SharedBuffer::default();
    logger.set_primary_output(buf.clone());
    let mut reader = logger.acquire_mirror().unwrap();

    fanout_logger::info!(logger, "first");
    let queued = reader.pending();
    fanout_logger::info!(logger, "second");
    assert_eq!(reader.pending(), queued);

    let mut head = vec![0u8; queued];
    reader.read_exact(&mut head).unwrap();
    fanout_logger::info!(logger, "third");
    logger.release_mirror();

    let mut rest = String::new();
    reader.read_to_string(&mut rest).unwrap();
    let mirrored = String::from_utf8(head).unwrap() + &rest;

    let lines: Vec<&str> = mirrored.lines().collect();
    assert_eq!(lines.len(), 2, "mirror saw: {:?}", mirrored);
    assert!(lines[0].ends_with("[INFO] first"));
    assert!(lines[1].ends_with("[INFO] third"));
    assert!(mirrored.ends_with('\n'));
    assert!(buf.text().contains("[INFO] second"));
}

#[test]
fn test_unbounded_write_timeout_is_accepted() {
    let logger = logger_with(
        LoggerConfig::default()
            .with_mirror_capacity(32)
            .with_mirror_write_timeout(Duration::MAX),
    );
    let buf = SharedBuffer::default();
    logger.set_primary_output(buf.clone());
    let consumer = read_all_in_background(logger.acquire_mirror().unwrap());

    for i in 0..20 {
        fanout_logger::info!(logger, "waits as long as it takes {}", i);
    }
    logger.release_mirror();

    let mirrored = consumer.join().unwrap();
    assert_eq!(mirrored, buf.text());
    assert_eq!(mirrored.lines().count(), 20);
}

#[test]
fn test_dropped_reader_does_not_block_logging() {
    let logger = logger_with(LoggerConfig::default().with_mirror_write_timeout(Duration::from_secs(30)));
    let buf = SharedBuffer::default();
    logger.set_primary_output(buf.clone());

    drop(logger.acquire_mirror().unwrap());

    let start = Instant::now();
    fanout_logger::info!(logger, "nobody is watching");
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(buf.text().contains("nobody is watching"));
}

#[test]
fn test_mirror_survives_primary_removal() {
    let logger = logger_with(LoggerConfig::default());
    logger.set_primary_output(io::sink());
    let reader = logger.acquire_mirror().unwrap();
    let consumer = read_all_in_background(reader);

    logger.remove_primary_output();
    fanout_logger::info!(logger, "mirror still attached");
    logger.release_mirror();

    assert!(consumer.join().unwrap().contains("mirror still attached"));
}
