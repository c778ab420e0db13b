#![cfg(feature = "std")]
//! Board read latency collection.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::config::{MeasureConfig, MEASURE_COUNT};

/// Fixed-capacity, append-only set of read latencies in microseconds.
#[derive(Debug, Clone)]
pub struct LatencySampler {
    samples: Vec<u64>,
    capacity: usize,
    threshold: Duration,
}

impl LatencySampler {
    pub fn new(capacity: usize, threshold: Duration) -> Self {
        Self {
            // large capacities grow as samples arrive
            samples: Vec::with_capacity(capacity.min(MEASURE_COUNT)),
            capacity,
            threshold,
        }
    }

    pub fn from_config(config: &MeasureConfig) -> Self {
        Self::new(config.capacity, config.threshold)
    }

    /// Records `elapsed` unless it is below the noise threshold or the set is
    /// already full. Returns whether the sample was kept.
    pub fn record(&mut self, elapsed: Duration) -> bool {
        if self.is_full() || elapsed < self.threshold {
            return false;
        }
        self.samples.push(elapsed.as_micros() as u64);
        true
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.samples.len())
    }

    pub fn samples(&self) -> &[u64] {
        &self.samples
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Writes one sample per line.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for sample in &self.samples {
            writeln!(out, "{}", sample)?;
        }
        out.flush()
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        self.write_to(BufWriter::new(File::create(path)?))
    }
}
