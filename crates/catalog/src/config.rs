//! `RuntimeConfig` — the enumerated configuration knobs (spec.md §6
//! "Configuration knobs"), validated once at construction the way the
//! teacher's storage layer validates its own tunables rather than
//! re-checking them on every access.

use graph_model::{GraphError, GraphResult};

/// Runtime-tunable knobs. All fields are immutable after construction —
/// a query reads `nthreads_max`/`query_mem_cap`/the storage-promotion
/// thresholds many times per execution, so re-validating them per read
/// would be wasted work for values that can only change between queries.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    thread_pool_size: usize,
    query_mem_cap: u64,
    hyper_switch: f64,
    bitmap_switch: f64,
    edge_bulk_delete_threshold: usize,
}

impl RuntimeConfig {
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    pub fn thread_pool_size(&self) -> usize {
        self.thread_pool_size
    }

    /// Bytes; `0` means unlimited (spec.md §6).
    pub fn query_mem_cap(&self) -> u64 {
        self.query_mem_cap
    }

    pub fn hyper_switch(&self) -> f64 {
        self.hyper_switch
    }

    pub fn bitmap_switch(&self) -> f64 {
        self.bitmap_switch
    }

    pub fn edge_bulk_delete_threshold(&self) -> usize {
        self.edge_bulk_delete_threshold
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfigBuilder::default().build().expect("defaults are valid")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfigBuilder {
    thread_pool_size: usize,
    query_mem_cap: u64,
    hyper_switch: f64,
    bitmap_switch: f64,
    edge_bulk_delete_threshold: usize,
}

impl Default for RuntimeConfigBuilder {
    fn default() -> Self {
        Self {
            thread_pool_size: 4,
            query_mem_cap: 0,
            hyper_switch: 0.1,
            bitmap_switch: 0.5,
            edge_bulk_delete_threshold: 1_000,
        }
    }
}

impl RuntimeConfigBuilder {
    pub fn thread_pool_size(mut self, n: usize) -> Self {
        self.thread_pool_size = n;
        self
    }

    pub fn query_mem_cap(mut self, bytes: u64) -> Self {
        self.query_mem_cap = bytes;
        self
    }

    pub fn hyper_switch(mut self, ratio: f64) -> Self {
        self.hyper_switch = ratio;
        self
    }

    pub fn bitmap_switch(mut self, ratio: f64) -> Self {
        self.bitmap_switch = ratio;
        self
    }

    pub fn edge_bulk_delete_threshold(mut self, n: usize) -> Self {
        self.edge_bulk_delete_threshold = n;
        self
    }

    pub fn build(self) -> GraphResult<RuntimeConfig> {
        if self.thread_pool_size < 1 {
            return Err(GraphError::InvalidParameter(
                "thread_pool_size must be >= 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.hyper_switch) {
            return Err(GraphError::InvalidParameter(
                "hyper_switch must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.bitmap_switch) {
            return Err(GraphError::InvalidParameter(
                "bitmap_switch must be in [0, 1]".into(),
            ));
        }
        Ok(RuntimeConfig {
            thread_pool_size: self.thread_pool_size,
            query_mem_cap: self.query_mem_cap,
            hyper_switch: self.hyper_switch,
            bitmap_switch: self.bitmap_switch,
            edge_bulk_delete_threshold: self.edge_bulk_delete_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.thread_pool_size(), 4);
        assert_eq!(cfg.query_mem_cap(), 0);
    }

    #[test]
    fn zero_thread_pool_size_is_rejected() {
        let err = RuntimeConfig::builder().thread_pool_size(0).build().unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameter(_)));
    }

    #[test]
    fn out_of_range_switch_is_rejected() {
        let err = RuntimeConfig::builder().hyper_switch(1.5).build().unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameter(_)));
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = RuntimeConfig::builder()
            .thread_pool_size(8)
            .query_mem_cap(1 << 20)
            .build()
            .unwrap();
        assert_eq!(cfg.thread_pool_size(), 8);
        assert_eq!(cfg.query_mem_cap(), 1 << 20);
    }
}
