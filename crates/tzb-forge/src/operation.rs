//! Protocol operation model.
//!
//! A closed tagged union over the operation kinds this client builds or
//! classifies. Each variant carries exactly its required fields; forging and
//! classification are exhaustive matches, so adding a kind without updating
//! them is a compile error.

use serde_json::{json, Value};

/// Common envelope of every manager operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagerMeta {
    /// Acting account (always this client's delegate)
    pub source: String,
    /// Fee in mutez
    pub fee: u64,
    /// Strictly increasing per-source counter
    pub counter: u64,
    /// Gas limit
    pub gas_limit: u64,
    /// Storage limit
    pub storage_limit: u64,
}

/// One operation content, by kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationContent {
    /// Attestation of a block at `level`
    Endorsement {
        /// Endorsed level
        level: i32,
    },
    /// Disclosure of a committed seed
    SeedNonceRevelation {
        /// Commitment level
        level: i32,
        /// 32-byte seed, hex
        nonce: String,
    },
    /// Two endorsements by one delegate for the same level
    DoubleEndorsementEvidence {
        /// First inlined endorsement, forged hex
        op1: String,
        /// Second inlined endorsement, forged hex
        op2: String,
    },
    /// Two block headers signed by one delegate at the same level
    DoubleBakingEvidence {
        /// First block header, forged hex
        bh1: String,
        /// Second block header, forged hex
        bh2: String,
    },
    /// Fundraiser account activation
    ActivateAccount {
        /// Activated public key hash
        pkh: String,
        /// Activation secret, hex
        secret: String,
    },
    /// Protocol amendment proposals (classification only)
    Proposals {
        /// Proposing delegate
        source: String,
        /// Voting period
        period: i32,
        /// Proposed protocol hashes
        proposals: Vec<String>,
    },
    /// Amendment ballot
    Ballot {
        /// Voting delegate
        source: String,
        /// Voting period
        period: i32,
        /// Protocol hash voted on
        proposal: String,
        /// `yay`, `nay` or `pass`
        ballot: String,
    },
    /// Public key revelation for a manager account
    Reveal {
        /// Manager envelope
        meta: ManagerMeta,
        /// Key being revealed (`edpk...`)
        public_key: String,
    },
    /// Mutez transfer
    Transaction {
        /// Manager envelope
        meta: ManagerMeta,
        /// Amount in mutez
        amount: u64,
        /// Receiving contract (`tz...` or `KT1...`)
        destination: String,
    },
    /// Contract origination. Placeholder: classified and serialized, no
    /// local binary encoding.
    Origination {
        /// Manager envelope
        meta: ManagerMeta,
        /// Initial balance in mutez
        balance: u64,
        /// Optional delegate of the originated contract
        delegate: Option<String>,
    },
    /// Delegation change (`None` withdraws the delegation)
    Delegation {
        /// Manager envelope
        meta: ManagerMeta,
        /// New delegate, if any
        delegate: Option<String>,
    },
}

impl OperationContent {
    /// Protocol kind string, as the node spells it.
    pub fn kind(&self) -> &'static str {
        match self {
            OperationContent::Endorsement { .. } => "endorsement",
            OperationContent::SeedNonceRevelation { .. } => "seed_nonce_revelation",
            OperationContent::DoubleEndorsementEvidence { .. } => "double_endorsement_evidence",
            OperationContent::DoubleBakingEvidence { .. } => "double_baking_evidence",
            OperationContent::ActivateAccount { .. } => "activate_account",
            OperationContent::Proposals { .. } => "proposals",
            OperationContent::Ballot { .. } => "ballot",
            OperationContent::Reveal { .. } => "reveal",
            OperationContent::Transaction { .. } => "transaction",
            OperationContent::Origination { .. } => "origination",
            OperationContent::Delegation { .. } => "delegation",
        }
    }

    /// Validation pass this kind is included under when assembling a block:
    /// endorsements (0), votes (1), anonymous (2), manager (3).
    pub fn acceptable_pass(&self) -> u8 {
        match self {
            OperationContent::Endorsement { .. } => 0,
            OperationContent::Proposals { .. } | OperationContent::Ballot { .. } => 1,
            OperationContent::SeedNonceRevelation { .. }
            | OperationContent::DoubleEndorsementEvidence { .. }
            | OperationContent::DoubleBakingEvidence { .. }
            | OperationContent::ActivateAccount { .. } => 2,
            OperationContent::Reveal { .. }
            | OperationContent::Transaction { .. }
            | OperationContent::Origination { .. }
            | OperationContent::Delegation { .. } => 3,
        }
    }

    /// Manager envelope, when this kind carries one.
    pub fn manager_meta(&self) -> Option<&ManagerMeta> {
        match self {
            OperationContent::Reveal { meta, .. }
            | OperationContent::Transaction { meta, .. }
            | OperationContent::Origination { meta, .. }
            | OperationContent::Delegation { meta, .. } => Some(meta),
            _ => None,
        }
    }

    /// Node-shaped JSON for remote forging and preapply.
    ///
    /// Mutez and counter quantities are serialized as strings, matching the
    /// node's encoding.
    pub fn to_json(&self) -> Value {
        match self {
            OperationContent::Endorsement { level } => json!({
                "kind": "endorsement",
                "level": level,
            }),
            OperationContent::SeedNonceRevelation { level, nonce } => json!({
                "kind": "seed_nonce_revelation",
                "level": level,
                "nonce": nonce,
            }),
            OperationContent::DoubleEndorsementEvidence { op1, op2 } => json!({
                "kind": "double_endorsement_evidence",
                "op1": op1,
                "op2": op2,
            }),
            OperationContent::DoubleBakingEvidence { bh1, bh2 } => json!({
                "kind": "double_baking_evidence",
                "bh1": bh1,
                "bh2": bh2,
            }),
            OperationContent::ActivateAccount { pkh, secret } => json!({
                "kind": "activate_account",
                "pkh": pkh,
                "secret": secret,
            }),
            OperationContent::Proposals { source, period, proposals } => json!({
                "kind": "proposals",
                "source": source,
                "period": period,
                "proposals": proposals,
            }),
            OperationContent::Ballot { source, period, proposal, ballot } => json!({
                "kind": "ballot",
                "source": source,
                "period": period,
                "proposal": proposal,
                "ballot": ballot,
            }),
            OperationContent::Reveal { meta, public_key } => {
                let mut body = manager_json(meta);
                body["kind"] = "reveal".into();
                body["public_key"] = public_key.clone().into();
                body
            }
            OperationContent::Transaction { meta, amount, destination } => {
                let mut body = manager_json(meta);
                body["kind"] = "transaction".into();
                body["amount"] = amount.to_string().into();
                body["destination"] = destination.clone().into();
                body
            }
            OperationContent::Origination { meta, balance, delegate } => {
                let mut body = manager_json(meta);
                body["kind"] = "origination".into();
                body["balance"] = balance.to_string().into();
                if let Some(delegate) = delegate {
                    body["delegate"] = delegate.clone().into();
                }
                body
            }
            OperationContent::Delegation { meta, delegate } => {
                let mut body = manager_json(meta);
                body["kind"] = "delegation".into();
                if let Some(delegate) = delegate {
                    body["delegate"] = delegate.clone().into();
                }
                body
            }
        }
    }
}

fn manager_json(meta: &ManagerMeta) -> Value {
    json!({
        "source": meta.source,
        "fee": meta.fee.to_string(),
        "counter": meta.counter.to_string(),
        "gas_limit": meta.gas_limit.to_string(),
        "storage_limit": meta.storage_limit.to_string(),
    })
}

/// Validation pass for a kind string out of mempool JSON; `None` for kinds
/// this client does not recognize.
pub fn pass_of_kind(kind: &str) -> Option<u8> {
    match kind {
        "endorsement" => Some(0),
        "proposals" | "ballot" => Some(1),
        "seed_nonce_revelation"
        | "double_endorsement_evidence"
        | "double_baking_evidence"
        | "activate_account" => Some(2),
        "reveal" | "transaction" | "origination" | "delegation" => Some(3),
        _ => None,
    }
}
