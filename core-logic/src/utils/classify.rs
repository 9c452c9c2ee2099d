use crate::error::FailureKind;

// Checked in order: ethers-style revert messages also mention `method=`,
// so revert patterns must win over the missing-function patterns.
const NONCE_PATTERNS: &[&str] = &["nonce"];

const REVERT_PATTERNS: &[&str] = &[
    "call revert exception",
    "execution reverted",
    "revert",
    "call_exception",
];

const MISSING_FUNCTION_PATTERNS: &[&str] = &["function", "method", "selector"];

const MISSING_CONTRACT_PATTERNS: &[&str] = &[
    "forwarder",
    "contract",
    "no code",
    "not deployed",
];

/// Best-effort mapping of a free-text error message onto a [`FailureKind`].
///
/// Error strings are not a stable contract of any RPC or relay client, so
/// the result is a hint for branching and reporting, never a proof.
pub fn classify_failure(message: &str) -> FailureKind {
    let msg = message.to_lowercase();
    let matches = |patterns: &[&str]| patterns.iter().any(|p| msg.contains(p));

    if matches(NONCE_PATTERNS) {
        FailureKind::NonceConflict
    } else if matches(REVERT_PATTERNS) {
        FailureKind::Reverted
    } else if matches(MISSING_FUNCTION_PATTERNS) {
        FailureKind::MissingFunction
    } else if matches(MISSING_CONTRACT_PATTERNS) {
        FailureKind::MissingContract
    } else {
        FailureKind::Other
    }
}

/// Truncates `message` to at most `max_chars` characters, appending `...`
/// when something was cut.
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message.to_string(),
    }
}
