pub const SOLANA_ADDRESS_LEN: usize = 32;
pub const SOLANA_SIGNATURE_LEN: usize = 64;
pub const SOLANA_DIGEST_LEN: usize = 32;

/// Solana enforces at most 16 seeds per PDA derivation.
pub const SOLANA_PDA_MAX_SEEDS: usize = 16;

/// Each individual seed is at most 32 bytes.
pub const SOLANA_PDA_MAX_SEED_LEN: usize = 32;

/// Appended to the seed list before hashing so a derived address can never collide
/// with a valid ed25519 public key.
pub const PDA_MARKER: &[u8; 21] = b"ProgramDerivedAddress";

/// The canonical SPL Associated Token Account program, base58-encoded.
/// Decode with [`crate::address::Address::from_str`].
pub const ATA_PROGRAM_ID_B58: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

/// The canonical SPL Token program, base58-encoded.
/// Decode with [`crate::address::Address::from_str`].
pub const TOKEN_PROGRAM_ID_B58: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
