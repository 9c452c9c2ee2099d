//! Call data for the zero-argument functions the diagnostics poke at.

use alloy_primitives::{keccak256, Bytes};
use alloy_sol_types::sol;
use anyhow::{bail, Result};

sol! {
    interface ICounter {
        function increment();
    }
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Selector of `name()`.
pub fn zero_arg_selector(name: &str) -> Result<[u8; 4]> {
    if !is_identifier(name) {
        bail!("'{}' is not a valid function name", name);
    }
    let hash = keccak256(format!("{}()", name).as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    Ok(selector)
}

/// ABI-encoded call to `name()`. Zero-argument calls are just the selector.
pub fn zero_arg_call(name: &str) -> Result<Bytes> {
    Ok(Bytes::copy_from_slice(&zero_arg_selector(name)?))
}
