use crate::content::ContentStatus;
use crate::repositories::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Content {id} was modified concurrently: expected version {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: u32,
        actual: u32,
    },

    /// Another write landed between this operation's read and its write.
    #[error("Content {id} was written concurrently: read revision {expected}, found {actual}")]
    ConcurrentWrite {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Content {id} cannot {action} while {from}")]
    InvalidTransition {
        id: String,
        action: &'static str,
        from: ContentStatus,
    },

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ContentError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            RepositoryError::Conflict {
                id,
                expected,
                actual,
            } => Self::ConcurrentWrite {
                id,
                expected,
                actual,
            },
            other => Self::Repository(other),
        }
    }
}
