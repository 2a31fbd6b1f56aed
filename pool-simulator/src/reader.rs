//! Authoritative on-chain reads
//!
//! The simulator cannot derive every value from events: external vault
//! mint/burn changes the pooled value without reporting it. The caller
//! fetches those reads (asynchronously, however it likes) before handing the
//! transaction over, and passes them in through a [`ChainReader`].

use crate::{Error, Result};
use alloy_primitives::{Address, U256};
use std::collections::HashMap;

/// Read access to authoritative state at the block being processed
pub trait ChainReader {
    /// Current pooled value
    fn total_pooled_value(&self) -> Result<U256>;

    /// Current total share units
    fn total_shares(&self) -> Result<U256>;

    /// Current share balance of a holder
    fn shares_of(&self, holder: &Address) -> Result<U256>;
}

/// Reader with no data; any read is an error
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReads;

impl ChainReader for NoReads {
    fn total_pooled_value(&self) -> Result<U256> {
        Err(Error::MissingAuthoritativeRead("total pooled value".to_string()))
    }

    fn total_shares(&self) -> Result<U256> {
        Err(Error::MissingAuthoritativeRead("total shares".to_string()))
    }

    fn shares_of(&self, holder: &Address) -> Result<U256> {
        Err(Error::MissingAuthoritativeRead(format!("shares of {}", holder)))
    }
}

/// Prefetched reads for one block
#[derive(Debug, Clone, Default)]
pub struct SnapshotReader {
    pooled_value: Option<U256>,
    total_shares: Option<U256>,
    balances: HashMap<Address, U256>,
}

impl SnapshotReader {
    /// Empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pooled value
    pub fn with_pooled_value(mut self, value: U256) -> Self {
        self.pooled_value = Some(value);
        self
    }

    /// Set total shares
    pub fn with_total_shares(mut self, shares: U256) -> Self {
        self.total_shares = Some(shares);
        self
    }

    /// Set one holder's balance
    pub fn with_balance(mut self, holder: Address, shares: U256) -> Self {
        self.balances.insert(holder, shares);
        self
    }
}

impl ChainReader for SnapshotReader {
    fn total_pooled_value(&self) -> Result<U256> {
        self.pooled_value
            .ok_or_else(|| Error::MissingAuthoritativeRead("total pooled value".to_string()))
    }

    fn total_shares(&self) -> Result<U256> {
        self.total_shares
            .ok_or_else(|| Error::MissingAuthoritativeRead("total shares".to_string()))
    }

    fn shares_of(&self, holder: &Address) -> Result<U256> {
        self.balances
            .get(holder)
            .copied()
            .ok_or_else(|| Error::MissingAuthoritativeRead(format!("shares of {}", holder)))
    }
}
