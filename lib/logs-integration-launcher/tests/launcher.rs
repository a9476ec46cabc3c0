//! End-to-end scenarios driving a real `Launcher` against a real temporary
//! directory. Built on `tempfile`, for tests that need an on-disk fixture
//! rather than an in-memory one.

use std::time::Duration;

use logs_integration_launcher::{
    ChannelPipelineProvider, DefaultLauncherInternalEvents, IntegrationConfigEntry, LauncherConfig,
    LogLine, Registration,
};
use tempfile::tempdir;

fn config_entry(source: &str, service: &str) -> Vec<IntegrationConfigEntry> {
    vec![IntegrationConfigEntry {
        entry_type: "integration".to_string(),
        source: Some(source.to_string()),
        service: Some(service.to_string()),
        tags: Vec::new(),
    }]
}

fn one_mb_file(dir: &std::path::Path, name: &str) {
    std::fs::write(dir.join(name), vec![0u8; 1024 * 1024]).unwrap();
}

/// `TEST_LOG=debug cargo test` to see what the launcher logged during a
/// test; silent otherwise.
fn trace_init() {
    let levels = std::env::var("TEST_LOG").unwrap_or_else(|_| "off".to_string());
    let _ = tracing_subscriber::fmt().with_env_filter(levels).try_init();
}

/// A registered integration's first log line lands on disk and its source
/// is published downstream.
#[test]
fn basic_write() {
    trace_init();
    let dir = tempdir().unwrap();
    let settings = LauncherConfig {
        run_path: Some(dir.path().to_path_buf()),
        integrations_logs_files_max_size: Some(10 * 1024 * 1024),
        max_open_integrations: Some(1),
        ..Default::default()
    }
    .build()
    .unwrap();

    let (source_tx, source_rx) = crossbeam_channel::unbounded();
    let pipeline = ChannelPipelineProvider::new(source_tx);
    let launcher = logs_integration_launcher::Launcher::new(
        settings,
        pipeline,
        DefaultLauncherInternalEvents,
    );

    let (reg_tx, reg_rx) = crossbeam_channel::bounded(16);
    let (log_tx, log_rx) = crossbeam_channel::bounded(16);
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

    let handle = launcher.spawn(reg_rx, log_rx, shutdown_rx);

    reg_tx
        .send(Registration {
            id: "123456789".to_string(),
            config: config_entry("foo", "bar"),
        })
        .unwrap();
    log_tx
        .send(LogLine {
            id: "123456789".to_string(),
            line: "hello world".to_string(),
        })
        .unwrap();

    let published = source_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("source should be published");
    assert_eq!(published.source_type, "file");
    assert_eq!(published.source.as_deref(), Some("foo"));
    assert_eq!(published.service.as_deref(), Some("bar"));
    assert_eq!(published.path, dir.path().join("123456789.log"));

    shutdown_tx.send(()).unwrap();
    let launcher = handle.join().unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("123456789.log")).unwrap(),
        "hello world\n"
    );
    assert_eq!(launcher.registry().combined_usage_size(), 12);
}

/// An ID with a colon round-trips through the filename codec.
#[test]
fn id_with_colon_round_trips() {
    trace_init();
    use logs_integration_launcher::{filename_to_id, id_to_filename};

    let id = "sample_integration:123";
    let filename = id_to_filename(id);
    assert_eq!(filename, "sample_integration_123.log");
    assert_eq!(filename_to_id(&filename), id);
}

/// A file that would cross the per-file cap is truncated before the next
/// write lands.
#[test]
fn per_file_truncation() {
    trace_init();
    let dir = tempdir().unwrap();
    one_mb_file(dir.path(), "sample_integration_123.log");

    let settings = LauncherConfig {
        run_path: Some(dir.path().to_path_buf()),
        integrations_logs_files_max_size: Some(10 * 1024 * 1024),
        max_open_integrations: Some(10), // 1 MiB per file
        ..Default::default()
    }
    .build()
    .unwrap();
    assert_eq!(settings.file_size_max, 1024 * 1024);

    let (source_tx, _source_rx) = crossbeam_channel::unbounded();
    let pipeline = ChannelPipelineProvider::new(source_tx);
    let launcher = logs_integration_launcher::Launcher::new(
        settings,
        pipeline,
        DefaultLauncherInternalEvents,
    );

    let (_reg_tx, reg_rx) = crossbeam_channel::bounded(16);
    let (log_tx, log_rx) = crossbeam_channel::bounded(16);
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

    let handle = launcher.spawn(reg_rx, log_rx, shutdown_rx);
    log_tx
        .send(LogLine {
            id: "sample_integration:123".to_string(),
            line: "sample log".to_string(),
        })
        .unwrap();

    // Give the loop a moment to process before asking it to stop.
    std::thread::sleep(Duration::from_millis(200));
    shutdown_tx.send(()).unwrap();
    let launcher = handle.join().unwrap();

    let contents = std::fs::read_to_string(dir.path().join("sample_integration_123.log")).unwrap();
    assert_eq!(contents, "sample log\n");
    assert_eq!(launcher.registry().combined_usage_size(), 11);
}

/// Growing one file past the combined usage cap evicts the
/// least-recently-modified file among the rest.
#[test]
fn global_eviction_by_lru() {
    trace_init();
    let dir = tempdir().unwrap();
    // Write in order so integration2 is the oldest by mtime, integration3 the
    // newest of the three pre-existing files.
    one_mb_file(dir.path(), "integration2_123.log");
    std::thread::sleep(Duration::from_millis(20));
    one_mb_file(dir.path(), "integration1_123.log");
    std::thread::sleep(Duration::from_millis(20));
    one_mb_file(dir.path(), "integration3_123.log");

    let settings = LauncherConfig {
        run_path: Some(dir.path().to_path_buf()),
        integrations_logs_files_max_size: Some(3 * 1024 * 1024),
        max_open_integrations: Some(1),
        ..Default::default()
    }
    .build()
    .unwrap();

    let (source_tx, _source_rx) = crossbeam_channel::unbounded();
    let pipeline = ChannelPipelineProvider::new(source_tx);
    let launcher = logs_integration_launcher::Launcher::new(
        settings,
        pipeline,
        DefaultLauncherInternalEvents,
    );

    let (_reg_tx, reg_rx) = crossbeam_channel::bounded(16);
    let (log_tx, log_rx) = crossbeam_channel::bounded(16);
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

    let handle = launcher.spawn(reg_rx, log_rx, shutdown_rx);
    log_tx
        .send(LogLine {
            id: "integration1:123".to_string(),
            line: "more data".to_string(),
        })
        .unwrap();

    std::thread::sleep(Duration::from_millis(200));
    shutdown_tx.send(()).unwrap();
    let launcher = handle.join().unwrap();

    assert!(!dir.path().join("integration2_123.log").exists());
    assert!(launcher.registry().lookup("integration2:123").is_none());

    let (id, _) = launcher.registry().least_recently_modified().unwrap();
    assert_eq!(id, "integration3:123");

    let actual_total: u64 = ["integration1_123.log", "integration3_123.log"]
        .iter()
        .map(|name| std::fs::metadata(dir.path().join(name)).unwrap().len())
        .sum();
    assert_eq!(launcher.registry().combined_usage_size(), actual_total);
}

/// The startup scanner evicts down to budget before the loop starts
/// consuming events.
#[test]
fn scanner_evicts_under_budget_at_startup() {
    trace_init();
    let dir = tempdir().unwrap();
    one_mb_file(dir.path(), "integration1_123.log");
    one_mb_file(dir.path(), "integration2_123.log");

    let settings = LauncherConfig {
        run_path: Some(dir.path().to_path_buf()),
        integrations_logs_files_max_size: Some(1024 * 1024),
        max_open_integrations: Some(1),
        ..Default::default()
    }
    .build()
    .unwrap();

    let (source_tx, _source_rx) = crossbeam_channel::unbounded();
    let pipeline = ChannelPipelineProvider::new(source_tx);
    let launcher = logs_integration_launcher::Launcher::new(
        settings,
        pipeline,
        DefaultLauncherInternalEvents,
    );

    let (_reg_tx, reg_rx) = crossbeam_channel::bounded(16);
    let (_log_tx, log_rx) = crossbeam_channel::bounded(16);
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

    let handle = launcher.spawn(reg_rx, log_rx, shutdown_rx);
    std::thread::sleep(Duration::from_millis(100));
    shutdown_tx.send(()).unwrap();
    let launcher = handle.join().unwrap();

    assert_eq!(launcher.registry().combined_usage_size(), 1024 * 1024);
    assert_eq!(launcher.registry().len(), 1);
}

/// A read-only run_path never panics or blocks the loop.
#[cfg(unix)]
#[test]
fn read_only_filesystem_does_not_block_the_loop() {
    trace_init();
    use std::os::unix::fs::PermissionsExt;

    // Root bypasses the DAC permission bits this test relies on, so a
    // chmod-based fixture can't produce a write failure under that uid.
    if unsafe { libc::geteuid() } == 0 {
        eprintln!("skipping: running as root, permission bits are not enforced");
        return;
    }

    let parent = tempdir().unwrap();
    let run_path = parent.path().join("readonly");
    std::fs::create_dir(&run_path).unwrap();
    std::fs::set_permissions(&run_path, std::fs::Permissions::from_mode(0o555)).unwrap();

    let settings = LauncherConfig {
        run_path: Some(run_path.clone()),
        integrations_logs_files_max_size: Some(10 * 1024 * 1024),
        max_open_integrations: Some(1),
        ..Default::default()
    }
    .build()
    .unwrap();

    let (source_tx, _source_rx) = crossbeam_channel::unbounded();
    let pipeline = ChannelPipelineProvider::new(source_tx);
    let launcher = logs_integration_launcher::Launcher::new(
        settings,
        pipeline,
        DefaultLauncherInternalEvents,
    );

    let (reg_tx, reg_rx) = crossbeam_channel::bounded(16);
    let (log_tx, log_rx) = crossbeam_channel::bounded(16);
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

    let handle = launcher.spawn(reg_rx, log_rx, shutdown_rx);

    reg_tx
        .send(Registration {
            id: "123456789".to_string(),
            config: config_entry("foo", "bar"),
        })
        .unwrap();
    log_tx
        .send(LogLine {
            id: "123456789".to_string(),
            line: "hello world".to_string(),
        })
        .unwrap();
    log_tx
        .send(LogLine {
            id: "123456789".to_string(),
            line: "hello again".to_string(),
        })
        .unwrap();

    std::thread::sleep(Duration::from_millis(200));
    shutdown_tx.send(()).unwrap();
    let launcher = handle
        .join()
        .expect("the loop must stay responsive and must not panic");

    if let Some(record) = launcher.registry().lookup("123456789") {
        assert_eq!(record.size, 0, "no write should have succeeded");
    }

    std::fs::set_permissions(&run_path, std::fs::Permissions::from_mode(0o755)).unwrap();
}
