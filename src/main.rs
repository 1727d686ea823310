use std::fs;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fanout_logger::{Level, Logger, Subscription};
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    fanout_logger::format::init_local_offset();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    println!("=== Fan-out logger walkthrough ===");

    let logger = Arc::new(Logger::new());
    logger.set_product_prefix("AdvancedExample");

    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("advanced_example.log");
    logger.set_primary_output(tracing_appender::rolling::never(dir.path(), "advanced_example.log"));

    println!("\n--- Demo 1: mirror stream ---");
    demo_mirror(&logger);

    println!("\n--- Demo 2: live channel ---");
    demo_channel(&logger);

    println!("\n--- Demo 3: multiple channels ---");
    demo_multiple_channels(&logger);

    println!("\n--- Demo 4: drop-oldest overflow ---");
    demo_drop_oldest(&logger);

    logger.remove_primary_output();
    println!("\n=== Log file content ===");
    print!("{}", fs::read_to_string(&log_path)?);

    println!("\n=== Walkthrough completed ===");
    Ok(())
}

fn demo_mirror(logger: &Arc<Logger>) {
    let reader = match logger.acquire_mirror() {
        Ok(reader) => reader,
        Err(err) => {
            println!("failed to acquire mirror: {}", err);
            return;
        }
    };

    let processor = thread::spawn(move || {
        for line in BufReader::new(reader).lines().map_while(Result::ok) {
            if line.contains("[ERROR]") {
                println!("mirror saw an error: {}", line);
            } else if line.contains("[WARN]") {
                println!("mirror saw a warning: {}", line);
            } else if line.contains("[INFO]") {
                println!("mirror saw info: {}", line);
            }
        }
    });

    fanout_logger::info!(logger, "Mirror demo started");
    thread::sleep(Duration::from_millis(50));
    fanout_logger::warn!(logger, "This is a warning in the mirror demo");
    thread::sleep(Duration::from_millis(50));
    fanout_logger::info!(logger, "Mirror demo completed");

    thread::sleep(Duration::from_millis(200));
    logger.release_mirror();
    let _ = processor.join();
}

fn demo_channel(logger: &Arc<Logger>) {
    let monitor = logger.subscribe("realtime-monitor");
    let handle = spawn_consumer("Monitor", monitor, |_| true);

    fanout_logger::info!(logger, "Starting real-time monitoring");
    thread::sleep(Duration::from_millis(50));
    fanout_logger::warn!(logger, "High CPU usage detected");
    thread::sleep(Duration::from_millis(50));
    fanout_logger::error!(logger, "Network connection failed");
    thread::sleep(Duration::from_millis(50));
    fanout_logger::info!(logger, "Recovery completed");

    thread::sleep(Duration::from_millis(200));
    logger.unsubscribe("realtime-monitor");
    let _ = handle.join();
}

fn demo_multiple_channels(logger: &Arc<Logger>) {
    let alerts = spawn_consumer("Alerts", logger.subscribe("alerts"), |level| level >= Level::Warn);
    let debug = spawn_consumer("Debug", logger.subscribe("debug"), |_| true);

    fanout_logger::info!(logger, "System initialization");
    thread::sleep(Duration::from_millis(30));
    fanout_logger::warn!(logger, "Memory usage at {}%", 80);
    thread::sleep(Duration::from_millis(30));
    fanout_logger::error!(logger, "Database connection lost");
    thread::sleep(Duration::from_millis(30));
    fanout_logger::info!(logger, "Automatic recovery initiated");
    thread::sleep(Duration::from_millis(30));
    fanout_logger::warn!(logger, "Disk space low");

    thread::sleep(Duration::from_millis(300));
    logger.unsubscribe("alerts");
    logger.unsubscribe("debug");
    let _ = alerts.join();
    let _ = debug.join();
}

fn demo_drop_oldest(logger: &Arc<Logger>) {
    logger.set_default_channel_capacity(3);
    let channel = logger.subscribe("drop-oldest-demo");

    let consumer = thread::spawn(move || {
        let mut received = Vec::new();
        for record in &channel {
            println!("received: {}", record.message());
            received.push(record.message().to_owned());
            thread::sleep(Duration::from_millis(150));
        }
        received
    });

    let messages = [
        "Message ONE",
        "Message TWO",
        "Message THREE",
        "Message FOUR",
        "Message FIVE",
        "Message SIX",
        "Message SEVEN",
    ];
    for msg in messages {
        fanout_logger::info!(logger, "{}", msg);
        println!("sent: {}", msg);
        thread::sleep(Duration::from_millis(50));
    }

    thread::sleep(Duration::from_millis(1500));
    logger.unsubscribe("drop-oldest-demo");
    let received = consumer.join().unwrap_or_default();

    println!("\ntotal sent: {}", messages.len());
    println!("total received: {}", received.len());
    if let (Some(first), Some(last)) = (received.first(), received.last()) {
        println!("first received: {}", first);
        println!("last received: {}", last);
    }
}

fn spawn_consumer(
    label: &'static str,
    sub: Subscription,
    wants: fn(Level) -> bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for record in &sub {
            if wants(record.level()) {
                println!("[{}] {} {}", label, record.level(), record.message());
            }
        }
    })
}
