// Error types module

use std::fmt;
use thiserror::Error;

/// Dispatch stage a request failed in.
///
/// The stage alone decides the HTTP status, so the mapping lives in one
/// place (`DispatchError::status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Parse,
    Fetch,
    Process,
    Encode,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Fetch => "fetch",
            Stage::Process => "process",
            Stage::Encode => "encode",
        }
    }

    /// HTTP status for a failure in this stage
    pub fn status(&self) -> u16 {
        match self {
            Stage::Parse => 400,
            Stage::Fetch => 502,
            Stage::Process | Stage::Encode => 500,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal error of one dispatched request.
///
/// `message` is the client-facing text written as the response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub stage: Stage,
    pub message: String,
}

impl DispatchError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }

    pub fn missing_path() -> Self {
        Self::new(Stage::Parse, "missing image path")
    }

    pub fn parse(cause: impl fmt::Display) -> Self {
        Self::new(Stage::Parse, format!("failed to parse options: {}", cause))
    }

    pub fn fetch(cause: impl fmt::Display) -> Self {
        Self::new(Stage::Fetch, format!("failed to fetch image: {}", cause))
    }

    pub fn process(cause: impl fmt::Display) -> Self {
        Self::new(Stage::Process, format!("failed to process image: {}", cause))
    }

    pub fn encode(format: impl fmt::Display, cause: impl fmt::Display) -> Self {
        Self::new(
            Stage::Encode,
            format!("failed to encode {}: {}", format, cause),
        )
    }

    pub fn status(&self) -> u16 {
        self.stage.status()
    }
}
