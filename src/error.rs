pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pool is closed")]
    PoolClosed,

    #[error("submission timed out waiting for queue capacity")]
    AdmissionTimeout,

    #[error("task panicked: {0}")]
    TaskPanicked(String),

    #[error("task dropped before completion")]
    TaskDropped,

    #[error("worker spawn failed: {0}")]
    Spawn(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn spawn<S: Into<String>>(msg: S) -> Self {
        Error::Spawn(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// True for the two admission-side failures a submitter can observe
    /// without the task ever running.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::PoolClosed | Error::AdmissionTimeout)
    }
}
