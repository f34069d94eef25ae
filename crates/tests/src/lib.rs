//! # Integration Tests
//!
//! Cross-crate end-to-end tests.
//!
//! Covers:
//! - contract smoke tests
//! - mock-broker e2e runs (no network needed)
//! - spool durability across restarts
//! - rotating log and monitor files

#[cfg(test)]
mod contract_tests {
    use std::collections::HashSet;

    use contracts::{BrokerEndpoint, FatalKind, DEFAULT_BROKER_PORT};

    #[test]
    fn test_exit_codes_distinct() {
        let kinds = [
            FatalKind::Config,
            FatalKind::Usage,
            FatalKind::MonitorLogOpen,
            FatalKind::ErrorLogOpen,
            FatalKind::SpoolPersist,
            FatalKind::SpoolFlush,
            FatalKind::AllBrokersDown,
            FatalKind::SpoolReplay,
            FatalKind::BrokerConnect,
        ];
        let codes: HashSet<u8> = kinds.iter().map(|k| k.exit_code()).collect();
        assert_eq!(codes, (1..=9).collect());
    }

    #[test]
    fn test_endpoint_list() {
        let endpoints = BrokerEndpoint::parse_list("k1,k2:9093,file:/tmp/out,mock:m").unwrap();
        assert_eq!(endpoints.len(), 4);
        assert_eq!(
            endpoints[0],
            BrokerEndpoint::Tcp {
                host: "k1".to_string(),
                port: DEFAULT_BROKER_PORT
            }
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use broker_client::{AnyBroker, EndpointConnector, MockConfig, MockRegistry};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BrokerEndpoint, ForwarderConfig, LogDestination};
    use dispatcher::{
        BrokerPool, DispatchSettings, Dispatcher, DispatcherError, Engine, EngineSettings,
        ShutdownFlag,
    };
    use observability::{Clock, ManualClock, MonitorSampler, RotatingLog, SystemClock};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use spool::SpoolStore;
    use tempfile::tempdir;

    fn config(dir: &Path, brokers: &str) -> ForwarderConfig {
        ForwarderConfig {
            brokers: brokers.to_string(),
            topic: "logs".to_string(),
            partitions: 4,
            spool_path: dir.join("queue.data"),
            error_log_path: dir.join("error.log"),
            monitor_log_path: dir.join("queuesize.log"),
            retry_backoff_ms: 0,
            log_destination: LogDestination::Stderr,
            ..Default::default()
        }
    }

    /// Wire an engine the way the binary does, with a seeded rng and an
    /// injectable clock
    async fn engine(
        config: &ForwarderConfig,
        connector: &EndpointConnector,
        clock: Arc<dyn Clock>,
    ) -> Result<Engine<AnyBroker>, DispatcherError> {
        let log = RotatingLog::new(
            &config.monitor_log_path,
            config.max_log_size,
            config.max_log_backups,
        );
        let monitor = MonitorSampler::with_clock(log, config.monitor_period_secs, clock);
        let endpoints = config.endpoints().unwrap();
        let pool = BrokerPool::connect(connector, &endpoints, monitor).await?;

        let dispatcher = Dispatcher::with_rng(
            pool,
            SpoolStore::new(&config.spool_path),
            DispatchSettings::from_config(config),
            StdRng::seed_from_u64(7),
        );
        Ok(Engine::new(
            dispatcher,
            ShutdownFlag::new(),
            EngineSettings::from_config(config),
        ))
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .split_inclusive('\n')
            .map(str::to_string)
            .collect()
    }

    /// Full outage, then a restart against a healthy broker: nothing is lost
    /// and nothing is delivered twice
    #[tokio::test]
    async fn test_e2e_outage_then_restart() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), "mock:a,mock:b");

        // Run 1: both brokers down
        let registry = MockRegistry::new();
        let a = registry.configure("a", MockConfig::failing());
        let b = registry.configure("b", MockConfig::failing());
        let connector = EndpointConnector::with_mocks(registry);
        let run1 = engine(&config, &connector, Arc::new(SystemClock)).await.unwrap();

        let err = run1.run(&b"X\nY\n"[..]).await.unwrap_err();
        assert!(matches!(err, DispatcherError::AllBrokersDown { cycles: 5, .. }));
        assert_eq!(err.fatal_kind().exit_code(), 7);
        // 2 brokers x 5 cycles for the first message
        assert_eq!(a.attempts() + b.attempts(), 10);

        let spooled = read_lines(&config.spool_path);
        assert_eq!(spooled[0], "X\n");
        assert!(spooled.len() <= 2);

        // Run 2: brokers back
        let registry = MockRegistry::new();
        let a = registry.state("a");
        let b = registry.state("b");
        let connector = EndpointConnector::with_mocks(registry);
        let run2 = engine(&config, &connector, Arc::new(SystemClock)).await.unwrap();

        let report = run2.run(&b"Z\n"[..]).await.unwrap();
        assert_eq!(report.replayed, spooled.len() as u64);
        assert_eq!(report.sent, spooled.len() as u64 + 1);
        assert!(!config.spool_path.exists());

        let mut delivered: Vec<String> = a
            .delivered_text()
            .into_iter()
            .chain(b.delivered_text())
            .collect();
        delivered.sort();
        let mut expected = spooled.clone();
        expected.push("Z\n".to_string());
        expected.sort();
        assert_eq!(delivered, expected);
    }

    #[tokio::test]
    async fn test_e2e_failover_to_healthy_broker() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), "mock:down,mock:up");
        let registry = MockRegistry::new();
        registry.configure("down", MockConfig::failing());
        let up = registry.state("up");
        let connector = EndpointConnector::with_mocks(registry);

        let engine = engine(&config, &connector, Arc::new(SystemClock)).await.unwrap();
        let report = engine.run(&b"1\n2\n3\n4\n5\n"[..]).await.unwrap();

        assert_eq!(up.delivered_text(), vec!["1\n", "2\n", "3\n", "4\n", "5\n"]);
        assert_eq!(report.sent, 5);
        assert_eq!(report.metrics.retry_cycles, 0);
        assert!(report.metrics.failed_attempts <= 5);
        assert!(up.delivered().iter().all(|d| d.partition < 4 && d.topic == "logs"));
    }

    #[tokio::test]
    async fn test_e2e_file_broker() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.log");
        let config = config(dir.path(), &format!("file:{}", out.display()));

        let engine = engine(&config, &EndpointConnector::new(), Arc::new(SystemClock))
            .await
            .unwrap();
        let report = engine.run(&b"alpha\nbeta\ngamma"[..]).await.unwrap();

        assert_eq!(report.sent, 3);
        // the unterminated last record gets its delimiter on the way out
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "alpha\nbeta\ngamma\n");
    }

    #[tokio::test]
    async fn test_e2e_shutdown_persists_backlog() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), "mock:slow");
        let registry = MockRegistry::new();
        let slow = registry.configure("slow", MockConfig::holding());
        let connector = EndpointConnector::with_mocks(registry);

        let engine = engine(&config, &connector, Arc::new(SystemClock)).await.unwrap();
        let report = engine.run(&b"p1\np2\np3\n"[..]).await.unwrap();

        assert_eq!(report.sent, 3);
        assert_eq!(report.spooled, 3);
        assert!(slow.delivered().is_empty());
        assert_eq!(read_lines(&config.spool_path), vec!["p1\n", "p2\n", "p3\n"]);
    }

    #[tokio::test]
    async fn test_e2e_monitor_lines() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), "mock:a,mock:b");
        let clock = ManualClock::at(1_700_000_000);
        let connector = EndpointConnector::with_mocks(MockRegistry::new());

        let engine = engine(&config, &connector, Arc::new(clock.clone())).await.unwrap();
        engine.run(&b"one\ntwo\n"[..]).await.unwrap();

        // two messages at the same instant: one sample, one line per broker
        let lines = read_lines(&config.monitor_log_path);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("|mock:a| queue size= 0\n"));
        assert!(lines[1].ends_with("|mock:b| queue size= 0\n"));
    }

    #[tokio::test]
    async fn test_e2e_legacy_config() {
        let dir = tempdir().unwrap();
        let legacy = format!(
            "# sendkafka\nbrokers = mock:a\ntopic = legacy\npartitions = 999\ndata_path = {}\nerror_path = {}\nqueue_sizepath = {}\n",
            dir.path().join("queue.data").display(),
            dir.path().join("error.log").display(),
            dir.path().join("queuesize.log").display(),
        );
        let mut config = ConfigLoader::load_from_str(&legacy, ConfigFormat::KeyValue).unwrap();
        assert_eq!(config.partitions, 4);
        config.retry_backoff_ms = 0;

        let registry = MockRegistry::new();
        let a = registry.state("a");
        let connector = EndpointConnector::with_mocks(registry);
        let engine = engine(&config, &connector, Arc::new(SystemClock)).await.unwrap();
        engine.run(&b"m\n"[..]).await.unwrap();

        let delivered = a.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].topic, "legacy");
    }

    #[tokio::test]
    async fn test_e2e_connect_failure_leaves_spool() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), "mock:a,mock:b");
        std::fs::write(&config.spool_path, "kept\n").unwrap();
        let registry = MockRegistry::new();
        registry.configure(
            "b",
            MockConfig {
                refuse_connect: true,
                ..Default::default()
            },
        );
        let connector = EndpointConnector::with_mocks(registry);

        let err = engine(&config, &connector, Arc::new(SystemClock)).await.unwrap_err();
        assert_eq!(err.fatal_kind().exit_code(), 9);
        assert_eq!(std::fs::read_to_string(&config.spool_path).unwrap(), "kept\n");
    }

    #[tokio::test]
    async fn test_e2e_retry_recovers() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path(), "mock:flaky");
        config.retry_backoff_ms = 1;
        let registry = MockRegistry::new();
        let flaky = registry.configure(
            "flaky",
            MockConfig {
                fail_first: 3,
                ..Default::default()
            },
        );
        let connector = EndpointConnector::with_mocks(registry);

        let engine = engine(&config, &connector, Arc::new(SystemClock)).await.unwrap();
        let started = tokio::time::Instant::now();
        let report = engine.run(&b"late\n"[..]).await.unwrap();

        assert_eq!(flaky.delivered_text(), vec!["late\n"]);
        assert_eq!(report.metrics.retry_cycles, 3);
        assert!(started.elapsed() >= Duration::from_millis(3));
        assert!(!config.spool_path.exists());
    }

    #[test]
    fn test_rotation_keeps_backup_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("error.log");
        let log = RotatingLog::new(&path, 10, 3);

        for i in 0..50 {
            log.append_line(&format!("line number {i}")).unwrap();
        }

        assert_eq!(log.backup_count(), 3);
        assert!(log.backup_path(0).exists());
        assert!(log.backup_path(2).exists());
        assert!(!log.backup_path(3).exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line number 49\n");
    }

    #[test]
    fn test_endpoint_list_matches_pool_order() {
        let endpoints = BrokerEndpoint::parse_list("mock:x, mock:y ,").unwrap();
        let names: Vec<String> = endpoints.iter().map(BrokerEndpoint::name).collect();
        assert_eq!(names, vec!["mock:x", "mock:y"]);
    }
}
