use core::{fmt, str::FromStr};

use crate::consts::SOLANA_SIGNATURE_LEN;

/// A 64-byte Solana transaction signature, rendered as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SOLANA_SIGNATURE_LEN]);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
	#[error("invalid base58 encoding")]
	InvalidBase58,
	#[error("decoded signature is not {SOLANA_SIGNATURE_LEN} bytes")]
	WrongLength,
}

impl AsRef<[u8]> for Signature {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl FromStr for Signature {
	type Err = SignatureError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let decoded = bs58::decode(s).into_vec().map_err(|_| SignatureError::InvalidBase58)?;
		let bytes: [u8; SOLANA_SIGNATURE_LEN] =
			decoded.try_into().map_err(|_| SignatureError::WrongLength)?;
		Ok(Self(bytes))
	}
}

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", bs58::encode(&self.0).into_string())
	}
}

impl fmt::Debug for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Signature({self})")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trip() {
		for input in [
			"5cKt1H4Yn7LLJ2Jh8gudHYq3xaaSFoZh4U8TVouHe1o9KJ2dqfd6kKNAfKgnxpjr4fWBb8AnrSnrs4Z9fq9qeCth",
			"46vy3sp4k5pQDjVymzrD58L4strx5vmK5B9pjsEuNcXKfaZpWie5r6bQYnrzpu3giaZL1b8NmFhDDhz9U3bTgQkP",
		] {
			let parsed: Signature = input.parse().unwrap();
			assert_eq!(parsed.to_string(), input);
		}
	}
}
