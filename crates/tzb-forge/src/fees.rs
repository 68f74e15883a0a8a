//! Fee tiers and gas/storage defaults for manager operations.

/// Flat fee tiers in mutez.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeeTier {
    /// Minimum fee most bakers still include
    Low,
    /// Default tier
    #[default]
    Medium,
    /// Priority inclusion
    High,
}

impl FeeTier {
    /// Fee in mutez.
    pub fn mutez(self) -> u64 {
        match self {
            FeeTier::Low => 1_420,
            FeeTier::Medium => 1_520,
            FeeTier::High => 3_000,
        }
    }
}

/// Default gas limit for transactions.
pub const GAS_LIMIT_TRANSACTION: u64 = 10_600;
/// Default gas limit for reveals and delegations.
pub const GAS_LIMIT_MANAGER: u64 = 10_000;
/// Default storage limit for transactions.
pub const STORAGE_LIMIT_TRANSACTION: u64 = 300;
/// Default storage limit for reveals and delegations.
pub const STORAGE_LIMIT_MANAGER: u64 = 0;

/// Per-call overrides for the send pipeline.
#[derive(Clone, Debug)]
pub struct OperationOptions {
    /// Fee tier applied when no explicit fee is set
    pub tier: FeeTier,
    /// Explicit fee in mutez, overriding the tier
    pub fee: Option<u64>,
    /// Explicit gas limit
    pub gas_limit: Option<u64>,
    /// Explicit storage limit
    pub storage_limit: Option<u64>,
    /// Compare local and remote forge before signing
    pub verify_forge: bool,
}

impl Default for OperationOptions {
    fn default() -> Self {
        Self {
            tier: FeeTier::Medium,
            fee: None,
            gas_limit: None,
            storage_limit: None,
            verify_forge: true,
        }
    }
}

impl OperationOptions {
    /// Effective fee in mutez.
    pub fn fee(&self) -> u64 {
        self.fee.unwrap_or_else(|| self.tier.mutez())
    }

    /// Effective gas limit for a transaction-shaped operation.
    pub fn transaction_gas(&self) -> u64 {
        self.gas_limit.unwrap_or(GAS_LIMIT_TRANSACTION)
    }

    /// Effective gas limit for reveal/delegation.
    pub fn manager_gas(&self) -> u64 {
        self.gas_limit.unwrap_or(GAS_LIMIT_MANAGER)
    }

    /// Effective storage limit for a transaction-shaped operation.
    pub fn transaction_storage(&self) -> u64 {
        self.storage_limit.unwrap_or(STORAGE_LIMIT_TRANSACTION)
    }

    /// Effective storage limit for reveal/delegation.
    pub fn manager_storage(&self) -> u64 {
        self.storage_limit.unwrap_or(STORAGE_LIMIT_MANAGER)
    }
}
