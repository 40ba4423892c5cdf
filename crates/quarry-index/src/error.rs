use crate::backend::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("index build failed: {reason}")]
    Build { reason: String },

    #[error("index not built: call build() before retrieve()")]
    NotBuilt,

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] BackendError),

    #[error("k must be positive")]
    InvalidK,
}

impl IndexError {
    pub(crate) fn build(reason: impl Into<String>) -> Self {
        Self::Build {
            reason: reason.into(),
        }
    }
}
