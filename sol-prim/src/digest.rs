use core::{fmt, str::FromStr};

use crate::consts::SOLANA_DIGEST_LEN;

/// A 32-byte Solana digest (genesis hash, blockhash, block hash), rendered as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; SOLANA_DIGEST_LEN]);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DigestError {
	#[error("invalid base58 encoding")]
	InvalidBase58,
	#[error("decoded digest is not {SOLANA_DIGEST_LEN} bytes")]
	WrongLength,
}

impl Digest {
	pub const fn new(bytes: [u8; SOLANA_DIGEST_LEN]) -> Self {
		Self(bytes)
	}
}

impl AsRef<[u8]> for Digest {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl FromStr for Digest {
	type Err = DigestError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let decoded = bs58::decode(s).into_vec().map_err(|_| DigestError::InvalidBase58)?;
		let bytes: [u8; SOLANA_DIGEST_LEN] =
			decoded.try_into().map_err(|_| DigestError::WrongLength)?;
		Ok(Self(bytes))
	}
}

impl fmt::Display for Digest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", bs58::encode(&self.0).into_string())
	}
}

impl fmt::Debug for Digest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Digest({self})")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trip() {
		for input in [
			"EtWTRABZaYq6iMfeYKouRu166VU2xqa1wcaWoxPkrZBG",
			"4uhcVJyU9pJkvQyS88uRDiswHXSCkY3zQawwpjk2NsNY",
			"5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d",
		] {
			let parsed: Digest = input.parse().unwrap();
			assert_eq!(parsed.to_string(), input);
		}
	}
}
