use thiserror::Error;

use crate::engine::InputError;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("batch of {size} addresses exceeds the limit of {limit}")]
    LimitExceeded { size: usize, limit: usize },
    #[error("cannot start batch threads: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
}
