//! Outbound transaction construction: the TSS message builder (C9) and the Borsh/Anchor
//! assembler that turns a TSS signature into a broadcastable transaction (C10).

pub mod assembler;
pub mod message;
pub mod wire;
