//! Local binary forging of operations.
//!
//! Wire layout per content: a 1-byte kind tag followed by the kind's fixed
//! fields. Manager operations share the envelope
//! `source(21) ‖ fee ‖ counter ‖ gas_limit ‖ storage_limit` with zarith
//! quantities. Output must match the node's `forge/operations` byte for
//! byte; `verify_against_remote` enforces that before anything is signed.

use crate::operation::{ManagerMeta, OperationContent};
use crate::ForgeError;
use shared_codec::base58::{b58check_decode, Prefix};
use shared_codec::{encode_nat, from_hex, to_hex};

/// Kind tags of the protocol's operation encoding.
mod tag {
    pub const ENDORSEMENT: u8 = 0;
    pub const SEED_NONCE_REVELATION: u8 = 1;
    pub const DOUBLE_ENDORSEMENT_EVIDENCE: u8 = 2;
    pub const DOUBLE_BAKING_EVIDENCE: u8 = 3;
    pub const ACTIVATE_ACCOUNT: u8 = 4;
    pub const PROPOSALS: u8 = 5;
    pub const BALLOT: u8 = 6;
    pub const REVEAL: u8 = 107;
    pub const TRANSACTION: u8 = 108;
    pub const DELEGATION: u8 = 110;
}

/// Encode an implicit account as curve tag ‖ 20-byte hash.
fn implicit_address(address: &str) -> Result<[u8; 21], ForgeError> {
    let (curve, prefix) = if address.starts_with("tz1") {
        (0u8, Prefix::Tz1)
    } else if address.starts_with("tz2") {
        (1, Prefix::Tz2)
    } else if address.starts_with("tz3") {
        (2, Prefix::Tz3)
    } else {
        return Err(ForgeError::InvalidAddress(address.into()));
    };

    let hash = b58check_decode(prefix, address)?;
    let mut out = [0u8; 21];
    out[0] = curve;
    out[1..].copy_from_slice(&hash);
    Ok(out)
}

/// Encode a transaction destination: implicit accounts under tag 0,
/// originated contracts under tag 1 with a trailing padding byte.
fn contract_address(address: &str) -> Result<[u8; 22], ForgeError> {
    let mut out = [0u8; 22];
    if address.starts_with("KT1") {
        let hash = b58check_decode(Prefix::Kt1, address)?;
        out[0] = 1;
        out[1..21].copy_from_slice(&hash);
        // out[21] stays 0x00: originated-contract padding
    } else {
        out[1..].copy_from_slice(&implicit_address(address)?);
    }
    Ok(out)
}

/// Encode an ed25519 public key as curve tag ‖ 32 bytes.
fn public_key(key: &str) -> Result<Vec<u8>, ForgeError> {
    let bytes = b58check_decode(Prefix::EdPk, key)?;
    let mut out = Vec::with_capacity(33);
    out.push(0u8);
    out.extend_from_slice(&bytes);
    Ok(out)
}

fn manager_envelope(out: &mut Vec<u8>, meta: &ManagerMeta) -> Result<(), ForgeError> {
    out.extend_from_slice(&implicit_address(&meta.source)?);
    out.extend_from_slice(&encode_nat(meta.fee));
    out.extend_from_slice(&encode_nat(meta.counter));
    out.extend_from_slice(&encode_nat(meta.gas_limit));
    out.extend_from_slice(&encode_nat(meta.storage_limit));
    Ok(())
}

fn length_prefixed(out: &mut Vec<u8>, payload_hex: &str) -> Result<(), ForgeError> {
    let payload =
        from_hex(payload_hex).map_err(|e| ForgeError::InvalidEvidence(e.to_string()))?;
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload);
    Ok(())
}

fn encode_content(out: &mut Vec<u8>, content: &OperationContent) -> Result<(), ForgeError> {
    match content {
        OperationContent::Endorsement { level } => {
            out.push(tag::ENDORSEMENT);
            out.extend_from_slice(&level.to_be_bytes());
        }
        OperationContent::SeedNonceRevelation { level, nonce } => {
            out.push(tag::SEED_NONCE_REVELATION);
            out.extend_from_slice(&level.to_be_bytes());
            let nonce =
                from_hex(nonce).map_err(|e| ForgeError::InvalidEvidence(e.to_string()))?;
            if nonce.len() != 32 {
                return Err(ForgeError::InvalidEvidence(format!(
                    "seed nonce must be 32 bytes, got {}",
                    nonce.len()
                )));
            }
            out.extend_from_slice(&nonce);
        }
        OperationContent::DoubleEndorsementEvidence { op1, op2 } => {
            out.push(tag::DOUBLE_ENDORSEMENT_EVIDENCE);
            length_prefixed(out, op1)?;
            length_prefixed(out, op2)?;
        }
        OperationContent::DoubleBakingEvidence { bh1, bh2 } => {
            out.push(tag::DOUBLE_BAKING_EVIDENCE);
            length_prefixed(out, bh1)?;
            length_prefixed(out, bh2)?;
        }
        OperationContent::ActivateAccount { pkh, secret } => {
            out.push(tag::ACTIVATE_ACCOUNT);
            let hash = b58check_decode(Prefix::Tz1, pkh)?;
            out.extend_from_slice(&hash);
            let secret =
                from_hex(secret).map_err(|e| ForgeError::InvalidEvidence(e.to_string()))?;
            out.extend_from_slice(&secret);
        }
        OperationContent::Proposals { source, period, proposals } => {
            out.push(tag::PROPOSALS);
            out.extend_from_slice(&implicit_address(source)?);
            out.extend_from_slice(&period.to_be_bytes());
            let mut payload = Vec::with_capacity(proposals.len() * 32);
            for proposal in proposals {
                payload.extend_from_slice(&b58check_decode(Prefix::Protocol, proposal)?);
            }
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out.extend_from_slice(&payload);
        }
        OperationContent::Ballot { source, period, proposal, ballot } => {
            out.push(tag::BALLOT);
            out.extend_from_slice(&implicit_address(source)?);
            out.extend_from_slice(&period.to_be_bytes());
            out.extend_from_slice(&b58check_decode(Prefix::Protocol, proposal)?);
            out.push(match ballot.as_str() {
                "yay" => 0,
                "nay" => 1,
                "pass" => 2,
                other => {
                    return Err(ForgeError::InvalidEvidence(format!(
                        "unknown ballot: {}",
                        other
                    )))
                }
            });
        }
        OperationContent::Reveal { meta, public_key: key } => {
            out.push(tag::REVEAL);
            manager_envelope(out, meta)?;
            out.extend_from_slice(&public_key(key)?);
        }
        OperationContent::Transaction { meta, amount, destination } => {
            out.push(tag::TRANSACTION);
            manager_envelope(out, meta)?;
            out.extend_from_slice(&encode_nat(*amount));
            out.extend_from_slice(&contract_address(destination)?);
            // no parameters
            out.push(0x00);
        }
        OperationContent::Origination { .. } => {
            return Err(ForgeError::UnsupportedKind("origination"));
        }
        OperationContent::Delegation { meta, delegate } => {
            out.push(tag::DELEGATION);
            manager_envelope(out, meta)?;
            match delegate {
                Some(delegate) => {
                    out.push(0xff);
                    out.extend_from_slice(&implicit_address(delegate)?);
                }
                None => out.push(0x00),
            }
        }
    }
    Ok(())
}

/// Forge `contents` against `branch` into protocol wire bytes.
///
/// # Errors
///
/// Codec errors on malformed addresses/hashes, `UnsupportedKind` for the
/// origination placeholder.
pub fn forge_operations(
    branch: &str,
    contents: &[OperationContent],
) -> Result<Vec<u8>, ForgeError> {
    let mut out = Vec::with_capacity(64 + contents.len() * 64);
    out.extend_from_slice(&b58check_decode(Prefix::Block, branch)?);
    for content in contents {
        encode_content(&mut out, content)?;
    }
    Ok(out)
}

/// Compare locally forged bytes against the node's forge output.
///
/// # Errors
///
/// `VerificationMismatch` when they differ; the caller must not sign.
pub fn verify_against_remote(local: &[u8], remote_hex: &str) -> Result<(), ForgeError> {
    let local_hex = to_hex(local);
    if local_hex != remote_hex.to_lowercase() {
        return Err(ForgeError::VerificationMismatch {
            local: local_hex,
            remote: remote_hex.to_lowercase(),
        });
    }
    Ok(())
}
