//! CAIP-2 chain identifier parsing: `"solana:<genesisHash>"`.
//!
//! Grounded on the teacher's CAIP-2-style chain identity convention used throughout
//! `state_chain_observer`/`settings` — here specialised to the single `"solana:"` namespace
//! this adapter owns.

use crate::errors::SvmAdapterError;

const NAMESPACE: &str = "solana";

/// A parsed `"solana:<genesisHash>"` identifier. `reference` is the part after the colon,
/// which the repository treats as the (possibly CAIP-2-truncated) genesis hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolanaChainId {
	pub reference: String,
}

impl SolanaChainId {
	pub fn parse(s: &str) -> Result<Self, SvmAdapterError> {
		let mut parts = s.split(':');
		let namespace = parts.next().ok_or(SvmAdapterError::InvalidCaip2)?;
		let reference = parts.next().ok_or(SvmAdapterError::InvalidCaip2)?;
		if parts.next().is_some() {
			// More than one ':' — not a valid CAIP-2 string.
			return Err(SvmAdapterError::InvalidCaip2);
		}
		if namespace != NAMESPACE {
			return Err(SvmAdapterError::NotSolanaChain);
		}
		if reference.is_empty() {
			return Err(SvmAdapterError::EmptyGenesisHash);
		}
		Ok(Self { reference: reference.to_string() })
	}
}

impl std::fmt::Display for SolanaChainId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{NAMESPACE}:{}", self.reference)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_valid() {
		assert_eq!(SolanaChainId::parse("solana:H").unwrap().reference, "H");
	}

	#[test]
	fn rejects_empty_reference() {
		assert!(matches!(SolanaChainId::parse("solana:"), Err(SvmAdapterError::EmptyGenesisHash)));
	}

	#[test]
	fn rejects_wrong_namespace() {
		assert!(matches!(SolanaChainId::parse("x:y"), Err(SvmAdapterError::NotSolanaChain)));
	}

	#[test]
	fn rejects_extra_colons() {
		assert!(matches!(SolanaChainId::parse("a:b:c"), Err(SvmAdapterError::InvalidCaip2)));
	}

	#[test]
	fn rejects_missing_colon() {
		assert!(matches!(SolanaChainId::parse("abc"), Err(SvmAdapterError::InvalidCaip2)));
	}
}
