use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fanout_logger::{Console, Logger, LoggerConfig};
use log::{info, LevelFilter};
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::io;
use std::path::Path;
use std::sync::Once;
use tempfile::tempdir;

static LOG4RS_INIT: Once = Once::new();

#[derive(Debug)]
struct TestEvent {
    id: i32,
    active: bool,
    large_number: u64,
    description: String,
}

impl std::fmt::Display for TestEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event[id={}, active={}, large_number={}, desc={}]",
            self.id, self.active, self.large_number, self.description)
    }
}

fn test_event() -> TestEvent {
    TestEvent {
        id: 42,
        active: true,
        large_number: u64::MAX,
        description: "CPU: 95%, Memory: 2.5GB, Network: 1.2Gbps".to_string(),
    }
}

fn setup_log4rs(log_file: &Path) {
    LOG4RS_INIT.call_once(|| {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("[Bench] {d(%Y/%m/%d %H:%M:%S)} [{l}] {m}{n}")))
            .append(true)
            .build(log_file)
            .unwrap();

        let config = Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder().appender("logfile").build(LevelFilter::Info))
            .unwrap();

        log4rs::init_config(config).unwrap();
    });
}

fn quiet_logger() -> Logger {
    Logger::with_config(
        LoggerConfig::default()
            .with_product_prefix("Bench")
            .with_console(Console::Silent),
    )
}

fn bench_emission(c: &mut Criterion) {
    let mut group = c.benchmark_group("Emission");
    let event = test_event();

    let logger = quiet_logger();
    group.bench_function("info_no_channels", |b| {
        b.iter(|| fanout_logger::info!(logger, "Test perf: event={}", black_box(&event)))
    });

    let logger = quiet_logger();
    let _subs: Vec<_> = (0..4)
        .map(|i| logger.subscribe_with_capacity(&format!("idle-{}", i), 64))
        .collect();
    group.bench_function("info_four_full_channels", |b| {
        b.iter(|| fanout_logger::info!(logger, "Test perf: event={}", black_box(&event)))
    });

    let logger = quiet_logger();
    logger.set_primary_output(io::sink());
    group.bench_function("warn_with_stack_trace", |b| {
        b.iter(|| fanout_logger::warn!(logger, "Test perf: event={}", black_box(&event)))
    });

    group.finish();
}

fn bench_file_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("File Output");
    group.sample_size(20);
    let event = test_event();
    let dir = tempdir().unwrap();

    let logger = quiet_logger();
    let file = std::fs::File::create(dir.path().join("fanout.log")).unwrap();
    logger.set_primary_output(file);
    group.bench_function("fanout_logger", |b| {
        b.iter(|| fanout_logger::info!(logger, "Test perf: event={}", black_box(&event)))
    });

    setup_log4rs(&dir.path().join("log4rs.log"));
    group.bench_function("log4rs", |b| {
        b.iter(|| info!("Test perf: event={}", black_box(&event)))
    });

    group.finish();
}

criterion_group!(benches, bench_emission, bench_file_comparison);
criterion_main!(benches);
