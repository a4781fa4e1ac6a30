//! The position publishing loop.
//!
//! Walks the route one waypoint per tick, overwriting the bus's database
//! reference with a freshly timestamped record each time.

use std::future::Future;
use std::time::Duration;

use bus_common::firebase::DatabaseReference;
use bus_common::{PositionRecord, Result, Route};

/// Destination for published positions.
///
/// Implemented by [`DatabaseReference`]; tests substitute in-memory sinks.
pub trait PositionSink {
    /// Replaces the currently stored position with `record`.
    fn publish(&self, record: &PositionRecord) -> impl Future<Output = Result<()>> + Send;
}

impl PositionSink for DatabaseReference {
    async fn publish(&self, record: &PositionRecord) -> Result<()> {
        self.set(record).await
    }
}

pub struct Publisher<S> {
    sink: S,
    route: Route,
    interval: Duration,
    /// Number of successful writes so far.
    ticks: usize,
}

impl<S: PositionSink> Publisher<S> {
    pub fn new(sink: S, route: Route, interval: Duration) -> Self {
        Self {
            sink,
            route,
            interval,
            ticks: 0,
        }
    }

    /// Index into the route of the waypoint the next tick will publish.
    pub fn position(&self) -> usize {
        self.ticks % self.route.len()
    }

    /// Publishes the current waypoint and advances to the next one.
    ///
    /// The cursor only moves once the write has succeeded.
    pub async fn tick(&mut self) -> Result<PositionRecord> {
        let record = PositionRecord::now(self.route.point_at(self.ticks));

        self.sink.publish(&record).await?;
        tracing::info!(waypoint = self.position(), "Updated: {}", record);

        self.ticks += 1;
        Ok(record)
    }

    /// Publishes forever at the configured cadence. Returns only when a write fails.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.tick().await?;
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus_common::route::campus_loop;
    use bus_common::BusError;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Records every published position together with the (virtual) time of the write.
    #[derive(Clone, Default)]
    struct RecordingSink {
        written: Arc<Mutex<Vec<(PositionRecord, Instant)>>>,
        /// Fail every write after this many successes.
        fail_after: Option<usize>,
    }

    impl RecordingSink {
        fn failing_after(n: usize) -> Self {
            Self {
                fail_after: Some(n),
                ..Self::default()
            }
        }

        fn records(&self) -> Vec<PositionRecord> {
            self.written.lock().unwrap().iter().map(|(r, _)| *r).collect()
        }

        fn instants(&self) -> Vec<Instant> {
            self.written.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }
    }

    impl PositionSink for RecordingSink {
        async fn publish(&self, record: &PositionRecord) -> Result<()> {
            let mut written = self.written.lock().unwrap();
            if self.fail_after.is_some_and(|n| written.len() >= n) {
                return Err(BusError::Database {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            written.push((*record, Instant::now()));
            Ok(())
        }
    }

    fn publisher(sink: RecordingSink) -> Publisher<RecordingSink> {
        Publisher::new(sink, campus_loop(), Duration::from_secs(3))
    }

    #[tokio::test]
    #[test_log::test]
    async fn writes_follow_route_cyclically() {
        let sink = RecordingSink::default();
        let mut publisher = publisher(sink.clone());
        let route = campus_loop();

        for _ in 0..(route.len() * 2 + 3) {
            publisher.tick().await.unwrap();
        }

        for (i, record) in sink.records().iter().enumerate() {
            let expected = route.point_at(i);
            assert_eq!((record.lat, record.lon), (expected.y, expected.x), "write {i}");
        }
    }

    #[tokio::test]
    #[test_log::test]
    async fn first_and_ninth_writes_are_loop_origin() {
        let sink = RecordingSink::default();
        let mut publisher = publisher(sink.clone());

        for _ in 0..10 {
            publisher.tick().await.unwrap();
        }

        let records = sink.records();
        assert_eq!((records[0].lat, records[0].lon), (37.4219983, -122.084));
        assert_eq!((records[8].lat, records[8].lon), (37.4219983, -122.084));
        // Wrapped around: the tenth write starts the loop again
        assert_eq!((records[9].lat, records[9].lon), (37.4219983, -122.084));
        assert_eq!(publisher.position(), 1);
    }

    #[tokio::test]
    #[test_log::test]
    async fn timestamps_track_wall_clock() {
        let sink = RecordingSink::default();
        let mut publisher = publisher(sink.clone());

        let before = chrono::Utc::now().timestamp();
        for _ in 0..5 {
            publisher.tick().await.unwrap();
        }
        let after = chrono::Utc::now().timestamp();

        let records = sink.records();
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(records
            .iter()
            .all(|r| r.timestamp >= before && r.timestamp <= after));
    }

    #[tokio::test]
    #[test_log::test]
    async fn failed_write_does_not_advance() {
        let sink = RecordingSink::failing_after(2);
        let mut publisher = publisher(sink.clone());

        publisher.tick().await.unwrap();
        publisher.tick().await.unwrap();
        assert!(publisher.tick().await.is_err());
        assert_eq!(publisher.position(), 2);
        assert_eq!(sink.records().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    #[test_log::test]
    async fn run_stops_on_first_write_error() {
        let sink = RecordingSink::failing_after(4);
        let mut publisher = publisher(sink.clone());

        let err = publisher.run().await.unwrap_err();
        assert!(matches!(err, BusError::Database { status: 503, .. }));
        assert_eq!(sink.records().len(), 4);
        assert_eq!(publisher.position(), 4);
    }

    #[tokio::test(start_paused = true)]
    #[test_log::test]
    async fn run_writes_at_fixed_interval() {
        let sink = RecordingSink::failing_after(6);
        let mut publisher = Publisher::new(sink.clone(), campus_loop(), Duration::from_secs(10));

        publisher.run().await.unwrap_err();

        let instants = sink.instants();
        assert_eq!(instants.len(), 6);
        for pair in instants.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                gap >= Duration::from_secs(10) && gap < Duration::from_millis(10_050),
                "gap {gap:?}"
            );
        }
    }

    mod against_database {
        use super::*;
        use bus_common::firebase::test_support::{FakeFirebase, StatusCode};
        use bus_common::firebase::FirebaseDatabase;

        fn bus_ref(server: &FakeFirebase) -> DatabaseReference {
            let db = Arc::new(
                FirebaseDatabase::new(&server.base_url, server.service_account()).unwrap(),
            );
            db.reference("buses/bus1")
        }

        #[tokio::test]
        #[test_log::test]
        async fn each_tick_overwrites_bus_reference() {
            let server = FakeFirebase::start(3600, StatusCode::NO_CONTENT).await;
            let route = campus_loop();
            let mut publisher = Publisher::new(bus_ref(&server), route.clone(), Duration::from_secs(3));

            for _ in 0..3 {
                publisher.tick().await.unwrap();
            }

            let writes = server.writes();
            assert_eq!(writes.len(), 3);
            for (i, write) in writes.iter().enumerate() {
                assert_eq!(write.path, "/buses/bus1.json");
                let body: serde_json::Value = serde_json::from_str(&write.body).unwrap();
                let expected = route.point_at(i);
                assert_eq!(body["lat"], expected.y);
                assert_eq!(body["lon"], expected.x);
                assert!(body["timestamp"].is_i64());
            }
            assert_eq!(server.token_requests().len(), 1);
        }

        #[tokio::test]
        #[test_log::test]
        async fn rejected_write_stops_run() {
            let server = FakeFirebase::start(3600, StatusCode::UNAUTHORIZED).await;
            let mut publisher = Publisher::new(bus_ref(&server), campus_loop(), Duration::from_secs(3));

            let err = publisher.run().await.unwrap_err();
            assert!(matches!(err, BusError::Database { status: 401, .. }));
            assert_eq!(server.writes().len(), 1);
            assert_eq!(publisher.position(), 0);
        }
    }
}
