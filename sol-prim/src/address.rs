use core::{fmt, str::FromStr};

use crate::consts::SOLANA_ADDRESS_LEN;

/// A 32-byte Solana account/program address, rendered as base58.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; SOLANA_ADDRESS_LEN]);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
	#[error("invalid base58 encoding")]
	InvalidBase58,
	#[error("decoded address is not {SOLANA_ADDRESS_LEN} bytes")]
	WrongLength,
}

impl Address {
	pub const fn new(bytes: [u8; SOLANA_ADDRESS_LEN]) -> Self {
		Self(bytes)
	}

	pub fn as_bytes(&self) -> &[u8; SOLANA_ADDRESS_LEN] {
		&self.0
	}
}

impl AsRef<[u8]> for Address {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl From<[u8; SOLANA_ADDRESS_LEN]> for Address {
	fn from(bytes: [u8; SOLANA_ADDRESS_LEN]) -> Self {
		Self(bytes)
	}
}

impl FromStr for Address {
	type Err = AddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let decoded = bs58::decode(s).into_vec().map_err(|_| AddressError::InvalidBase58)?;
		let bytes: [u8; SOLANA_ADDRESS_LEN] =
			decoded.try_into().map_err(|_| AddressError::WrongLength)?;
		Ok(Self(bytes))
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", bs58::encode(&self.0).into_string())
	}
}

impl fmt::Debug for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Address({self})")
	}
}

#[cfg(feature = "serde")]
impl serde::Serialize for Address {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_string())
	}
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Address {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_address_from_str() {
		assert_eq!(
			"11111111111111111111111111111111".parse::<Address>().unwrap(),
			Address([0; SOLANA_ADDRESS_LEN])
		);
	}

	#[test]
	fn zero_address_to_str() {
		assert_eq!(Address([0; SOLANA_ADDRESS_LEN]).to_string(), "11111111111111111111111111111111");
	}

	#[test]
	fn round_trip() {
		for input in [
			"96yeNG1KYJKAVnfKqfkfktkXuPj1CLPEsgCDkm42VcaT",
			"7TecQdLbPuxt3mWukbZ1g1dTZeA6rxgjMxfS9MRURaEP",
			"ARdmZ4WrV8pnsjtCa4V67zv8vTUTmF798UPvmnkTZ3Gx",
		] {
			let parsed: Address = input.parse().unwrap();
			assert_eq!(parsed.to_string(), input);
		}
	}

	#[test]
	fn rejects_wrong_length() {
		assert_eq!("11111111111111111111111111111".parse::<Address>(), Err(AddressError::WrongLength));
	}

	#[cfg(feature = "serde")]
	#[test]
	fn zero_address_to_json() {
		let addr = Address([0u8; SOLANA_ADDRESS_LEN]);
		assert_eq!(serde_json::to_string(&addr).unwrap(), "\"11111111111111111111111111111111\"");
	}
}
