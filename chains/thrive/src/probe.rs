use alloy_primitives::Bytes;
use std::fmt;

/// Outcome of a single diagnostic attempt. Displayed immediately, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    ContractFound { byte_length: usize },
    NoContract,
    CallSucceeded { return_data: Bytes },
    CallReverted { reason: String },
    CallFailed { message: String },
}

impl ProbeResult {
    pub fn from_code(code: &Bytes) -> Self {
        if code.is_empty() {
            ProbeResult::NoContract
        } else {
            ProbeResult::ContractFound {
                byte_length: code.len(),
            }
        }
    }

    pub fn has_contract(&self) -> bool {
        matches!(self, ProbeResult::ContractFound { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ProbeResult::CallFailed { .. })
    }
}

/// What a trial call says about a function on the target.
///
/// Derived from a revert heuristic, so `ExistsButReverted` can also mean the
/// function is missing and a fallback reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionVerdict {
    Exists,
    ExistsButReverted,
    AbsentOrIncompatible,
}

impl From<&ProbeResult> for FunctionVerdict {
    fn from(result: &ProbeResult) -> Self {
        match result {
            ProbeResult::CallSucceeded { .. } => FunctionVerdict::Exists,
            ProbeResult::CallReverted { .. } => FunctionVerdict::ExistsButReverted,
            _ => FunctionVerdict::AbsentOrIncompatible,
        }
    }
}

impl FunctionVerdict {
    pub fn describe(&self, function: &str) -> String {
        match self {
            FunctionVerdict::Exists => format!("{}() function exists", function),
            FunctionVerdict::ExistsButReverted => format!(
                "{}() exists but reverted (normal for non-view function)",
                function
            ),
            FunctionVerdict::AbsentOrIncompatible => {
                format!("{}() function not found or incompatible", function)
            }
        }
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeResult::ContractFound { byte_length } => {
                write!(f, "Contract exists ({} bytes)", byte_length)
            }
            ProbeResult::NoContract => write!(f, "No contract code found (EOA or non-existent)"),
            ProbeResult::CallSucceeded { return_data } => {
                write!(f, "Call succeeded (returned {})", return_data)
            }
            ProbeResult::CallReverted { reason } => write!(f, "Call reverted: {}", reason),
            ProbeResult::CallFailed { message } => write!(f, "Error: {}", message),
        }
    }
}
