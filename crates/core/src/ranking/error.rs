use std::fmt;

/// Raised when the engine is handed input it cannot score meaningfully.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingError {
    /// 0-based position of the offending entry in the input sequence.
    pub index: usize,
    pub stage: &'static str,
    pub detail: String,
}

impl RankingError {
    pub(crate) fn new(index: usize, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            index,
            stage,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for RankingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ranking error (index={}, stage={}): {}",
            self.index, self.stage, self.detail
        )
    }
}

impl std::error::Error for RankingError {}
