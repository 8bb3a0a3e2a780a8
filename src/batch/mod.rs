//! Batch runner - expands target specifications and queries every address.
//!
//! Queries are strictly sequential and globally paced: the pacer is shared by
//! every specification in a run, so a file of many small ranges is throttled
//! exactly like one large range. A failed lookup is reported and skipped, an
//! invalid specification is reported and the next one is processed.

pub mod rate_limiter;

use crate::error::QueryError;
use crate::query::HostLookup;
use crate::types::{HostRecord, TargetError, TargetSpec};
use std::net::IpAddr;
use tracing::{debug, info, warn};

pub use rate_limiter::{Pacer, RateLimiter, DEFAULT_INTERVAL, MAX_INTERVAL};

/// A lookup that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
    pub ip: IpAddr,
    pub error: QueryError,
}

/// A specification that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSpec {
    pub spec: String,
    pub error: TargetError,
}

/// Results for one target specification.
#[derive(Debug, Clone, Default)]
pub struct SpecBatch {
    /// The specification as given.
    pub spec: String,
    /// Successfully queried hosts, in query order.
    pub hosts: Vec<HostRecord>,
    /// Addresses whose lookup failed.
    pub failures: Vec<HostFailure>,
}

/// Everything produced by one run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub batches: Vec<SpecBatch>,
    pub invalid: Vec<InvalidSpec>,
}

impl BatchOutcome {
    /// All successful hosts across every batch, in encounter order.
    pub fn hosts(&self) -> impl Iterator<Item = &HostRecord> {
        self.batches.iter().flat_map(|b| b.hosts.iter())
    }

    /// All failed lookups across every batch.
    pub fn failures(&self) -> impl Iterator<Item = &HostFailure> {
        self.batches.iter().flat_map(|b| b.failures.iter())
    }

    /// Whether any host has open-port data, i.e. a report would hold rows.
    pub fn has_report_rows(&self) -> bool {
        self.hosts().any(HostRecord::has_ports)
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            specs: self.batches.len() + self.invalid.len(),
            invalid_specs: self.invalid.len(),
            queried: self
                .batches
                .iter()
                .map(|b| b.hosts.len() + b.failures.len())
                .sum(),
            found: self.hosts().count(),
            failed: self.failures().count(),
        }
    }
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub specs: usize,
    pub invalid_specs: usize,
    pub queried: usize,
    pub found: usize,
    pub failed: usize,
}

/// Callbacks fired while a run progresses.
///
/// All methods default to doing nothing.
pub trait BatchObserver: Send {
    /// A specification parsed and is about to be expanded.
    fn on_spec_start(&mut self, _spec: &TargetSpec) {}

    /// A lookup succeeded.
    fn on_host(&mut self, _host: &HostRecord) {}

    /// A lookup failed and the address was skipped.
    fn on_failure(&mut self, _ip: IpAddr, _error: &QueryError) {}

    /// A specification failed to parse and was skipped.
    fn on_invalid_spec(&mut self, _spec: &str, _error: &TargetError) {}
}

impl BatchObserver for () {}

/// Drives lookups for a sequence of target specifications.
pub struct BatchRunner<L, P = RateLimiter> {
    lookup: L,
    pacer: P,
}

impl<L: HostLookup, P: Pacer> BatchRunner<L, P> {
    pub fn new(lookup: L, pacer: P) -> Self {
        Self { lookup, pacer }
    }

    /// Access the underlying lookup.
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Run every specification, skipping invalid ones.
    pub async fn run<I, S>(&self, specs: I, observer: &mut dyn BatchObserver) -> BatchOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcome = BatchOutcome::default();

        for spec in specs {
            let spec = spec.as_ref();
            match self.run_spec(spec, observer).await {
                Ok(batch) => outcome.batches.push(batch),
                Err(error) => outcome.invalid.push(InvalidSpec {
                    spec: spec.trim().to_string(),
                    error,
                }),
            }
        }

        let summary = outcome.summary();
        info!(
            specs = summary.specs,
            queried = summary.queried,
            found = summary.found,
            failed = summary.failed,
            "Batch complete"
        );
        outcome
    }

    /// Expand one specification and look up each address.
    ///
    /// Fails only if the specification does not parse, in which case no
    /// address is queried.
    pub async fn run_spec(
        &self,
        spec: &str,
        observer: &mut dyn BatchObserver,
    ) -> Result<SpecBatch, TargetError> {
        let target = match TargetSpec::parse(spec) {
            Ok(target) => target,
            Err(error) => {
                warn!(spec = spec.trim(), %error, "Skipping invalid target specification");
                observer.on_invalid_spec(spec.trim(), &error);
                return Err(error);
            }
        };

        debug!(spec = %target, hosts = %target.host_count(), "Expanding target");
        observer.on_spec_start(&target);

        let mut batch = SpecBatch {
            spec: spec.trim().to_string(),
            ..SpecBatch::default()
        };

        for ip in target.addresses() {
            self.pacer.wait().await;

            match self.lookup.lookup(ip).await {
                Ok(host) => {
                    debug!(%ip, ports = host.ports.len(), "Host found");
                    observer.on_host(&host);
                    batch.hosts.push(host);
                }
                Err(error) => {
                    warn!(%ip, kind = error.kind(), %error, "Lookup failed, skipping host");
                    observer.on_failure(ip, &error);
                    batch.failures.push(HostFailure { ip, error });
                }
            }
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryResult;
    use crate::types::PortBanner;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Serves canned records, failing for anything not in the table.
    #[derive(Default)]
    struct TableLookup {
        hosts: HashMap<IpAddr, HostRecord>,
        errors: HashMap<IpAddr, QueryError>,
        calls: Mutex<Vec<IpAddr>>,
    }

    impl TableLookup {
        fn with_host(mut self, ip: &str) -> Self {
            let ip: IpAddr = ip.parse().unwrap();
            let host = HostRecord::unknown(ip).with_port(PortBanner::new(80, "tcp", "HTTP/1.1"));
            self.hosts.insert(ip, host);
            self
        }

        fn with_error(mut self, ip: &str, error: QueryError) -> Self {
            self.errors.insert(ip.parse().unwrap(), error);
            self
        }
    }

    #[async_trait]
    impl HostLookup for TableLookup {
        async fn lookup(&self, ip: IpAddr) -> QueryResult<HostRecord> {
            self.calls.lock().unwrap().push(ip);
            if let Some(error) = self.errors.get(&ip) {
                return Err(error.clone());
            }
            self.hosts
                .get(&ip)
                .cloned()
                .ok_or_else(|| QueryError::NotFound("No information available".into()))
        }
    }

    #[derive(Default)]
    struct CountingPacer {
        waits: AtomicUsize,
    }

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn wait(&self) {
            self.waits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct Recorder {
        hosts: Vec<IpAddr>,
        failures: Vec<IpAddr>,
        invalid: Vec<String>,
    }

    impl BatchObserver for Recorder {
        fn on_host(&mut self, host: &HostRecord) {
            self.hosts.push(host.ip);
        }

        fn on_failure(&mut self, ip: IpAddr, _error: &QueryError) {
            self.failures.push(ip);
        }

        fn on_invalid_spec(&mut self, spec: &str, _error: &TargetError) {
            self.invalid.push(spec.to_string());
        }
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_failed_host_is_skipped() {
        let lookup = TableLookup::default()
            .with_host("10.0.0.1")
            .with_error("10.0.0.2", QueryError::Fault("boom".into()))
            .with_host("10.0.0.3");
        let runner = BatchRunner::new(lookup, CountingPacer::default());
        let mut recorder = Recorder::default();

        let batch = runner.run_spec("10.0.0.1-3", &mut recorder).await.unwrap();

        let found: Vec<IpAddr> = batch.hosts.iter().map(|h| h.ip).collect();
        assert_eq!(found, vec![ip("10.0.0.1"), ip("10.0.0.3")]);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].ip, ip("10.0.0.2"));
        assert_eq!(recorder.hosts, found);
        assert_eq!(recorder.failures, vec![ip("10.0.0.2")]);
    }

    #[tokio::test]
    async fn test_every_error_kind_is_non_fatal() {
        let lookup = TableLookup::default()
            .with_error("10.0.0.0", QueryError::RateLimited("slow down".into()))
            .with_error("10.0.0.1", QueryError::Fault("HTTP 500".into()))
            .with_host("10.0.0.3");
        let runner = BatchRunner::new(lookup, CountingPacer::default());

        let batch = runner.run_spec("10.0.0.0/30", &mut ()).await.unwrap();

        assert_eq!(batch.hosts.len(), 1);
        assert_eq!(batch.failures.len(), 3);
        assert_eq!(runner.lookup().calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_spec_queries_nothing() {
        let runner = BatchRunner::new(TableLookup::default(), CountingPacer::default());
        let mut recorder = Recorder::default();

        let result = runner.run_spec("10.0.0.1/33", &mut recorder).await;

        assert!(matches!(result, Err(TargetError::InvalidCidr(_))));
        assert!(runner.lookup().calls.lock().unwrap().is_empty());
        assert_eq!(runner.pacer.waits.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.invalid, vec!["10.0.0.1/33".to_string()]);
    }

    #[tokio::test]
    async fn test_run_continues_past_invalid_specs() {
        let lookup = TableLookup::default()
            .with_host("10.0.0.1")
            .with_host("192.168.5.5");
        let runner = BatchRunner::new(lookup, CountingPacer::default());

        let outcome = runner
            .run(["10.0.0.1", "abc", "192.168.5.4-5"], &mut ())
            .await;

        assert_eq!(outcome.batches.len(), 2);
        assert_eq!(outcome.invalid.len(), 1);
        assert_eq!(outcome.invalid[0].spec, "abc");

        let hosts: Vec<IpAddr> = outcome.hosts().map(|h| h.ip).collect();
        assert_eq!(hosts, vec![ip("10.0.0.1"), ip("192.168.5.5")]);

        let summary = outcome.summary();
        assert_eq!(summary.specs, 3);
        assert_eq!(summary.queried, 3);
        assert_eq!(summary.found, 2);
        assert_eq!(summary.failed, 1);
        assert!(outcome.has_report_rows());
    }

    #[tokio::test]
    async fn test_hosts_without_ports_give_no_report_rows() {
        let mut lookup = TableLookup::default();
        lookup
            .hosts
            .insert(ip("10.0.0.1"), HostRecord::unknown(ip("10.0.0.1")));
        let runner = BatchRunner::new(lookup, CountingPacer::default());

        let outcome = runner.run(["10.0.0.1-2"], &mut ()).await;

        assert_eq!(outcome.hosts().count(), 1);
        assert!(!outcome.has_report_rows());
        assert!(!BatchOutcome::default().has_report_rows());
    }

    #[tokio::test]
    async fn test_pacer_is_consulted_once_per_query_across_specs() {
        let runner = BatchRunner::new(TableLookup::default(), CountingPacer::default());

        runner.run(["10.0.0.1-2", "10.0.1.0/30"], &mut ()).await;

        assert_eq!(runner.pacer.waits.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_queries() {
        let interval = Duration::from_millis(40);
        let runner = BatchRunner::new(TableLookup::default(), RateLimiter::new(interval));

        let start = Instant::now();
        runner.run(["10.0.0.1", "10.0.0.2-3"], &mut ()).await;

        // three queries across two specs: two gaps
        assert!(start.elapsed() >= Duration::from_millis(75));
        assert_eq!(runner.lookup().calls.lock().unwrap().len(), 3);
    }
}
