use std::error::Error;
use std::fmt;
use tokio_cron_scheduler::JobSchedulerError;

/// Custom Error and Result types to unify errors from all sources.
pub type BoardResult<T> = Result<T, BoardError>;

#[derive(Debug)]
pub enum BoardError {
    Server(String),
    Scheduler(String),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BoardError::Server(s) => write!(f, "Server Error: {}", s),
            BoardError::Scheduler(s) => write!(f, "Scheduler Error: {}", s),
        }
    }
}

impl Error for BoardError {}

impl From<std::io::Error> for BoardError {
    fn from(error: std::io::Error) -> Self {
        BoardError::Server(error.to_string())
    }
}

impl From<JobSchedulerError> for BoardError {
    fn from(error: JobSchedulerError) -> Self {
        BoardError::Scheduler(error.to_string())
    }
}
