//! Pipeline phases and relative insertion positions

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five fixed stages an operation call passes through.
///
/// The derived ordering is the execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Prepares the input and stamps static metadata
    Initialize,
    /// Turns the input into a wire request
    Serialize,
    /// Decorates the wire request (headers, ids)
    Build,
    /// Last chance before sending (retry, logging)
    Finalize,
    /// Turns the wire response into the output
    Deserialize,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 5] = [
        Phase::Initialize,
        Phase::Serialize,
        Phase::Build,
        Phase::Finalize,
        Phase::Deserialize,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Phase::Initialize => 0,
            Phase::Serialize => 1,
            Phase::Build => 2,
            Phase::Finalize => 3,
            Phase::Deserialize => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Initialize => "initialize",
            Phase::Serialize => "serialize",
            Phase::Build => "build",
            Phase::Finalize => "finalize",
            Phase::Deserialize => "deserialize",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a step lands relative to the group (or to an anchor step)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativePosition {
    Before,
    After,
}
