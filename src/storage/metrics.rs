use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use log::trace;

/// Tracks storage operation metrics for monitoring
#[derive(Debug)]
pub struct StorageMetrics {
    write_ops: AtomicU64,
    read_ops: AtomicU64,
    failed_ops: AtomicU64,
    retried_ops: AtomicU64,
    total_bytes_written: AtomicU64,
    total_bytes_read: AtomicU64,
    start_time: Instant,
}

impl StorageMetrics {
    pub fn new() -> Self {
        Self {
            write_ops: AtomicU64::new(0),
            read_ops: AtomicU64::new(0),
            failed_ops: AtomicU64::new(0),
            retried_ops: AtomicU64::new(0),
            total_bytes_written: AtomicU64::new(0),
            total_bytes_read: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn increment_writes(&self) {
        self.write_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reads(&self) {
        self.read_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed_ops(&self) {
        self.failed_ops.fetch_add(1, Ordering::Relaxed);
        trace!("Failed operation recorded. Total failures: {}", self.failed_ops.load(Ordering::Relaxed));
    }

    pub fn increment_retries(&self) {
        self.retried_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes_written(&self, bytes: u64) {
        self.total_bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_bytes_read(&self, bytes: u64) {
        self.total_bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> StorageMetricsStats {
        StorageMetricsStats {
            write_operations: self.write_ops.load(Ordering::Relaxed),
            read_operations: self.read_ops.load(Ordering::Relaxed),
            failed_operations: self.failed_ops.load(Ordering::Relaxed),
            retried_operations: self.retried_ops.load(Ordering::Relaxed),
            bytes_written: self.total_bytes_written.load(Ordering::Relaxed),
            bytes_read: self.total_bytes_read.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageMetricsStats {
    pub write_operations: u64,
    pub read_operations: u64,
    pub failed_operations: u64,
    pub retried_operations: u64,
    pub bytes_written: u64,
    pub bytes_read: u64,
    pub uptime_seconds: u64,
}

impl StorageMetricsStats {
    pub fn failure_rate(&self) -> f64 {
        let total_ops = self.write_operations + self.read_operations;
        if total_ops == 0 {
            return 0.0;
        }
        self.failed_operations as f64 / total_ops as f64
    }
}

impl Default for StorageMetrics {
    fn default() -> Self {
        Self::new()
    }
}
