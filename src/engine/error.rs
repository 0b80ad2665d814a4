use thiserror::Error;

use crate::MAX_SHAPES;

/// Rejected engine configuration. Raised by controller and wiring calls,
/// never from inside the audio callback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("stage {0} out of range (engine has {MAX_SHAPES} stages)")]
    StageOutOfRange(usize),

    #[error("stage {stage} cannot read stage {input}: a stage only takes input from earlier stages")]
    ForwardStageInput { stage: usize, input: usize },

    #[error("unknown controller index {0}")]
    UnknownController(usize),
}
