use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest as _, Sha256};

use crate::{
	address::Address,
	consts::{PDA_MARKER, SOLANA_PDA_MAX_SEEDS, SOLANA_PDA_MAX_SEED_LEN},
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PdaError {
	#[error("seed exceeds {SOLANA_PDA_MAX_SEED_LEN} bytes")]
	SeedTooLarge,
	#[error("more than {SOLANA_PDA_MAX_SEEDS} seeds were chained")]
	TooManySeeds,
	#[error("address lies on the ed25519 curve and cannot seed further derivation")]
	NotAValidPoint,
	#[error("no bump seed in 0..=255 yields an off-curve address")]
	NoViableBump,
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
	CompressedEdwardsY(*bytes).decompress().is_some()
}

/// Derives a program-derived address the way `solana_program::pubkey::Pubkey::find_program_address`
/// does: hash seeds ‖ bump ‖ program_id ‖ marker with SHA-256, starting at bump 255 and counting
/// down until the candidate does not decompress to a valid ed25519 point.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Address) -> Result<(Address, u8), PdaError> {
	if seeds.len() > SOLANA_PDA_MAX_SEEDS {
		return Err(PdaError::TooManySeeds);
	}
	for seed in seeds {
		if seed.len() > SOLANA_PDA_MAX_SEED_LEN {
			return Err(PdaError::SeedTooLarge);
		}
	}

	for bump in (0u8..=255).rev() {
		let mut hasher = Sha256::new();
		for seed in seeds {
			hasher.update(seed);
		}
		hasher.update([bump]);
		hasher.update(program_id.as_bytes());
		hasher.update(PDA_MARKER);
		let candidate: [u8; 32] = hasher.finalize().into();
		if !is_on_curve(&candidate) {
			return Ok((Address::new(candidate), bump));
		}
	}
	Err(PdaError::NoViableBump)
}

/// Derives the canonical SPL Associated Token Account address for `(owner, mint)` under
/// `token_program`, seeded `[owner, token_program, mint]` under the ATA program.
pub fn find_associated_token_address(
	owner: &Address,
	token_program: &Address,
	mint: &Address,
	ata_program: &Address,
) -> Result<(Address, u8), PdaError> {
	find_program_address(&[owner.as_ref(), token_program.as_ref(), mint.as_ref()], ata_program)
}

/// A seed-accumulating builder mirroring the chained-derivation style used for nested PDAs
/// (e.g. deriving a PDA from another PDA's address used as a further seed).
pub struct Pda {
	program_id: Address,
	seeds: Vec<Vec<u8>>,
}

impl Pda {
	/// Starts a derivation from a genuine (on-curve) address. Errors if `address` is itself a
	/// PDA, since PDAs are constructed to never be valid curve points.
	pub fn from_address(address: Address) -> Result<Self, PdaError> {
		if !is_on_curve(address.as_bytes()) {
			return Err(PdaError::NotAValidPoint);
		}
		Ok(Self { program_id: address, seeds: Vec::new() })
	}

	pub fn chain_seed(mut self, seed: impl AsRef<[u8]>) -> Result<Self, PdaError> {
		let seed = seed.as_ref();
		if seed.len() > SOLANA_PDA_MAX_SEED_LEN {
			return Err(PdaError::SeedTooLarge);
		}
		if self.seeds.len() >= SOLANA_PDA_MAX_SEEDS {
			return Err(PdaError::TooManySeeds);
		}
		self.seeds.push(seed.to_vec());
		Ok(self)
	}

	pub fn finish(self) -> Result<(Address, u8), PdaError> {
		let seed_refs: Vec<&[u8]> = self.seeds.iter().map(Vec::as_slice).collect();
		find_program_address(&seed_refs, &self.program_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn seed_too_long() {
		let public_key: Address = "J4mK4RXAuizk5aMZw8Vz8W3y7mrCy6dcgniZ4qwZimZE".parse().unwrap();
		assert_eq!(
			Pda::from_address(public_key)
				.unwrap()
				.chain_seed("01234567890123456789012345678912")
				.unwrap()
				.chain_seed("012345678901234567890123456789123")
				.unwrap_err(),
			PdaError::SeedTooLarge
		);
	}

	#[test]
	fn too_many_seeds() {
		let public_key: Address = "J4mK4RXAuizk5aMZw8Vz8W3y7mrCy6dcgniZ4qwZimZE".parse().unwrap();
		let ok = (1..SOLANA_PDA_MAX_SEEDS as u8)
			.map(|i| [i])
			.try_fold(Pda::from_address(public_key).unwrap(), Pda::chain_seed);
		assert!(ok.is_ok());

		let too_many = (1..=SOLANA_PDA_MAX_SEEDS as u8)
			.map(|i| [i])
			.try_fold(Pda::from_address(public_key).unwrap(), Pda::chain_seed);
		assert_eq!(too_many.unwrap_err(), PdaError::TooManySeeds);
	}

	#[test]
	fn initial_address_should_be_a_valid_point() {
		let public_key: Address = "J4mK4RXAuizk5aMZw8Vz8W3y7mrCy6dcgniZ4qwZimZE".parse().unwrap();
		let (pda, _bump) = Pda::from_address(public_key).unwrap().finish().unwrap();
		assert_eq!(Pda::from_address(pda).unwrap_err(), PdaError::NotAValidPoint);
	}

	#[test]
	fn known_vectors() {
		let public_key: Address = "J4mK4RXAuizk5aMZw8Vz8W3y7mrCy6dcgniZ4qwZimZE".parse().unwrap();
		let seeds = ["01", "02", "03"];
		let expected = [
			"5y4ZsPDKAXv4FTmK7C4BVhRRcqhrHYhUfYNhj1nS2EJR",
			"26ytLSPyng5vEbiU5oheMWjFcnsqjZ7pDZh7VeY3opVA",
			"56v8wrZ3XnVEDKBNf61wXGSZUytG74HL15U6QKSBPcfs",
		];
		for (i, exp) in expected.iter().enumerate() {
			let (pda, _bump) = seeds[..i]
				.iter()
				.try_fold(Pda::from_address(public_key).unwrap(), Pda::chain_seed)
				.unwrap()
				.finish()
				.unwrap();
			assert_eq!(&pda.to_string(), exp);
		}
	}

	#[test]
	fn associated_token_account_is_deterministic() {
		let owner: Address = "J4mK4RXAuizk5aMZw8Vz8W3y7mrCy6dcgniZ4qwZimZE".parse().unwrap();
		let mint: Address = "CMvtEhZFrNckPbBBAMG9H5vWQKgRhizUpa1zgsocHitt".parse().unwrap();
		let token_program: Address =
			"TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".parse().unwrap();
		let ata_program: Address =
			crate::consts::ATA_PROGRAM_ID_B58.parse().unwrap();

		let (a, bump_a) =
			find_associated_token_address(&owner, &token_program, &mint, &ata_program).unwrap();
		let (b, bump_b) =
			find_associated_token_address(&owner, &token_program, &mint, &ata_program).unwrap();
		assert_eq!(a, b);
		assert_eq!(bump_a, bump_b);
	}
}
