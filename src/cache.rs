// Single-shot memoization of the load-and-normalize stage.
//
// The result is a pure function of the input files, so it is keyed on the
// ordered list of resolved paths and kept until `invalidate` is called.
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DataConfig;
use crate::loader::{self, LoadReport};

#[derive(Debug, Default)]
pub struct LoadCache {
    entry: Option<(Vec<PathBuf>, Arc<LoadReport>)>,
    loads: usize,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized report for this input set, loading it on a miss.
    pub fn get_or_load(&mut self, data: &DataConfig) -> Arc<LoadReport> {
        self.get_or_load_with(data, loader::load_all)
    }

    /// Same as [`get_or_load`](Self::get_or_load) with a caller-supplied loader.
    pub fn get_or_load_with<F>(&mut self, data: &DataConfig, load: F) -> Arc<LoadReport>
    where
        F: FnOnce(&DataConfig) -> LoadReport,
    {
        let key = loader::source_paths(data);
        if let Some((cached_key, report)) = &self.entry {
            if *cached_key == key {
                debug!(files = key.len(), "load cache hit");
                return Arc::clone(report);
            }
        }
        info!(files = key.len(), "load cache miss, reading source files");
        let report = Arc::new(load(data));
        self.loads += 1;
        self.entry = Some((key, Arc::clone(&report)));
        report
    }

    /// Drop the memoized result; the next request recomputes from disk.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            info!("load cache cleared");
        }
    }

    pub fn is_cached(&self) -> bool {
        self.entry.is_some()
    }

    /// How many times the loader actually ran.
    pub fn load_count(&self) -> usize {
        self.loads
    }
}
