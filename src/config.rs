use crate::error::{Error, Result};
use std::time::Duration;

/// Scaling policy for the worker set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkMode {
    /// Worker count is fixed at construction for the pool's lifetime.
    Fixed,
    /// Workers are added under load up to a ceiling and retire back toward
    /// the floor after sitting idle past the pool timeout.
    Elastic,
}

impl Default for WorkMode {
    fn default() -> Self {
        WorkMode::Fixed
    }
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Requested worker floor. `None` means the hardware concurrency.
    pub workers: Option<usize>,
    pub mode: WorkMode,
    /// Elastic ceiling. `None` means twice the requested floor. Always
    /// capped at the hardware concurrency.
    pub max_workers: Option<usize>,
    /// Queue capacity enforced at submission. `None` means twice the floor.
    pub max_queue_length: Option<usize>,
    /// Bounds both the admission wait in `submit` and the idle wait after
    /// which an elastic worker above the floor retires.
    pub admission_timeout: Duration,
    /// Priority assigned to submissions that don't pass one explicitly.
    pub priority_level: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: None,
            mode: WorkMode::default(),
            max_workers: None,
            max_queue_length: None,
            admission_timeout: Duration::from_millis(3000),
            priority_level: 1,
            thread_name_prefix: "foundry-worker".to_string(),
            stack_size: Some(2 * 1024 * 1024),
        }
    }
}

impl PoolConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.workers {
            if n == 0 {
                return Err(Error::config("workers must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("workers too large (max 1024)"));
            }
        }

        if let Some(max) = self.max_workers {
            if max < self.worker_threads() {
                return Err(Error::config("max_workers below worker floor"));
            }
        }

        if self.max_queue_length == Some(0) {
            return Err(Error::config("max_queue_length must be > 0"));
        }

        if self.admission_timeout.is_zero() {
            return Err(Error::config("admission_timeout must be > 0"));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    pub fn queue_capacity(&self) -> usize {
        self.max_queue_length
            .unwrap_or_else(|| 2 * self.worker_threads())
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: PoolConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = Some(n);
        self
    }

    pub fn mode(mut self, mode: WorkMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.max_workers = Some(n);
        self
    }

    pub fn max_queue_length(mut self, n: usize) -> Self {
        self.config.max_queue_length = Some(n);
        self
    }

    pub fn admission_timeout(mut self, timeout: Duration) -> Self {
        self.config.admission_timeout = timeout;
        self
    }

    pub fn priority_level(mut self, level: usize) -> Self {
        self.config.priority_level = level;
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.mode, WorkMode::Fixed);
        assert_eq!(config.priority_level, 1);
        assert_eq!(config.admission_timeout, Duration::from_millis(3000));
        assert_eq!(config.queue_capacity(), 2 * config.worker_threads());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = PoolConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_ceiling_below_floor() {
        let result = PoolConfig::builder().workers(4).max_workers(2).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::builder()
            .workers(2)
            .mode(WorkMode::Elastic)
            .max_workers(6)
            .max_queue_length(32)
            .admission_timeout(Duration::from_millis(50))
            .priority_level(3)
            .build()
            .unwrap();

        assert_eq!(config.worker_threads(), 2);
        assert_eq!(config.mode, WorkMode::Elastic);
        assert_eq!(config.max_workers, Some(6));
        assert_eq!(config.queue_capacity(), 32);
        assert_eq!(config.priority_level, 3);
    }
}
