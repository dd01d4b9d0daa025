//! Statistics and counters for broadcasters

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of broadcaster activity
///
/// Purely informational. Values are read independently, so a snapshot taken
/// while writes are running may be slightly inconsistent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcasterStats {
    /// Connections currently registered
    pub connections: usize,
    /// Writes that have started but not returned
    pub outstanding_writes: usize,
    /// Write tasks that have been spawned but not finished
    pub in_flight_tasks: usize,
    /// Number of broadcast calls
    pub broadcasts: u64,
    /// Successful writes
    pub writes_completed: u64,
    /// Failed writes (each one removed its connection)
    pub writes_failed: u64,
    /// Total bytes successfully written across all connections
    pub bytes_sent: u64,
    /// Connections registered over the broadcaster's lifetime
    pub connections_added: u64,
    /// Connections removed by write failure or shutdown
    pub connections_removed: u64,
}

impl BroadcasterStats {
    /// Fraction of finished writes that failed, 0.0 if none finished yet
    pub fn failure_ratio(&self) -> f64 {
        let total = self.writes_completed + self.writes_failed;
        if total == 0 {
            0.0
        } else {
            self.writes_failed as f64 / total as f64
        }
    }
}

/// Lifetime counters, updated from write tasks
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub broadcasts: AtomicU64,
    pub writes_completed: AtomicU64,
    pub writes_failed: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub connections_added: AtomicU64,
    pub connections_removed: AtomicU64,
}

impl Counters {
    pub fn record_broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self, bytes: usize) {
        self.writes_completed.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.writes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_added(&self) {
        self.connections_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removed(&self, count: usize) {
        self.connections_removed.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Fill the lifetime fields of a snapshot
    pub fn snapshot(
        &self,
        connections: usize,
        outstanding: usize,
        in_flight: usize,
    ) -> BroadcasterStats {
        BroadcasterStats {
            connections,
            outstanding_writes: outstanding,
            in_flight_tasks: in_flight,
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            writes_completed: self.writes_completed.load(Ordering::Relaxed),
            writes_failed: self.writes_failed.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            connections_added: self.connections_added.load(Ordering::Relaxed),
            connections_removed: self.connections_removed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = Counters::default();
        counters.record_broadcast();
        counters.record_added();
        counters.record_added();
        counters.record_write(5);
        counters.record_write(7);
        counters.record_failure();
        counters.record_removed(1);

        let stats = counters.snapshot(1, 0, 0);
        assert_eq!(stats.connections, 1);
        assert_eq!(stats.broadcasts, 1);
        assert_eq!(stats.connections_added, 2);
        assert_eq!(stats.connections_removed, 1);
        assert_eq!(stats.writes_completed, 2);
        assert_eq!(stats.writes_failed, 1);
        assert_eq!(stats.bytes_sent, 12);
    }

    #[test]
    fn test_failure_ratio() {
        let stats = BroadcasterStats::default();
        assert_eq!(stats.failure_ratio(), 0.0);

        let stats = BroadcasterStats {
            writes_completed: 3,
            writes_failed: 1,
            ..Default::default()
        };
        assert!((stats.failure_ratio() - 0.25).abs() < f64::EPSILON);
    }
}
