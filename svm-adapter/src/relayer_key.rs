//! Loads the relayer's Ed25519 signing key from `<node_home>/relayer/<namespace>.json` (spec §6
//! "Relayer key file"): a JSON array of exactly 64 u8 values, the first 32 being the seed and the
//! last 32 the public key.

use std::path::Path;

use ed25519_dalek::SigningKey;

use crate::errors::SvmAdapterError;

pub fn load(path: &Path) -> Result<SigningKey, SvmAdapterError> {
	let raw = std::fs::read_to_string(path).map_err(|e| SvmAdapterError::Other(e.into()))?;
	let bytes: Vec<u8> = serde_json::from_str(&raw).map_err(|e| SvmAdapterError::Other(e.into()))?;
	if bytes.len() != 64 {
		return Err(SvmAdapterError::Truncated { field: "relayer_key" });
	}
	let seed: [u8; 32] = bytes[0..32].try_into().expect("checked len == 64 above");
	Ok(SigningKey::from_bytes(&seed))
}

#[cfg(test)]
mod tests {
	use ed25519_dalek::Signer;

	use super::*;

	#[test]
	fn loads_seed_and_produces_matching_public_key() {
		let dir = std::env::temp_dir().join(format!("svm-adapter-relayer-key-test-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("solana.json");

		let signing_key = SigningKey::from_bytes(&[7u8; 32]);
		let mut bytes = signing_key.to_bytes().to_vec();
		bytes.extend_from_slice(signing_key.verifying_key().as_bytes());
		std::fs::write(&path, serde_json::to_string(&bytes).unwrap()).unwrap();

		let loaded = load(&path).unwrap();
		assert_eq!(loaded.verifying_key(), signing_key.verifying_key());
		let _ = loaded.sign(b"message");

		std::fs::remove_file(&path).ok();
		std::fs::remove_dir(&dir).ok();
	}

	#[test]
	fn rejects_wrong_length() {
		let dir = std::env::temp_dir().join(format!("svm-adapter-relayer-key-test-bad-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("solana.json");
		std::fs::write(&path, serde_json::to_string(&vec![0u8; 10]).unwrap()).unwrap();

		assert!(matches!(load(&path), Err(SvmAdapterError::Truncated { field: "relayer_key" })));

		std::fs::remove_file(&path).ok();
		std::fs::remove_dir(&dir).ok();
	}
}
