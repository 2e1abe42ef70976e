//! Transfer progress tracking

use std::time::{Duration, Instant};

/// Progress tracker for file transfers
#[derive(Debug, Clone)]
pub struct TransferProgress {
    total_bytes: Option<u64>,
    transferred_bytes: u64,
    chunks: u64,
    start_time: Instant,
}

impl TransferProgress {
    /// Create a new progress tracker; `total_bytes` is unknown for plain readers
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            total_bytes,
            transferred_bytes: 0,
            chunks: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one chunk handed to the data connection
    pub fn add_chunk(&mut self, bytes: usize) {
        self.transferred_bytes += bytes as u64;
        self.chunks += 1;
    }

    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    /// Get current progress percentage, if the total is known
    pub fn percentage(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(100.0),
            Some(total) => Some((self.transferred_bytes as f64 / total as f64) * 100.0),
            None => None,
        }
    }

    /// Get transfer speed in bytes per second
    pub fn speed_bps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transferred_bytes as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Check if transfer is complete
    pub fn is_complete(&self) -> bool {
        self.total_bytes
            .is_some_and(|total| self.transferred_bytes >= total)
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
