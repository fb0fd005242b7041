pub use crate::config::{ConfigBuilder, PoolConfig, WorkMode};
pub use crate::error::{Error, Result};
pub use crate::logger::{Logger, LoggerConfig, OpenMode, TimeFormat};
pub use crate::net::{FrameListener, FramedStream};
pub use crate::pool::{TaskHandle, ThreadPool};

#[cfg(feature = "telemetry")]
pub use crate::telemetry::{Metrics, MetricsSnapshot};
