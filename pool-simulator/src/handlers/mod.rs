//! Event handlers
//!
//! One handler per event family. Every handler receives the transaction
//! context, the look-ahead window and the store for the duration of the call,
//! applies its mutations, and returns the entities it created together with
//! any consistency warnings as an [`Effects`] value. Nothing is retained
//! between calls.

pub mod burn;
pub mod external;
pub mod fees;
pub mod rebase;
pub mod submission;
pub mod transfer;

use crate::{
    config::Config,
    entities::{PerModuleFee, PerModuleShares, Reward, ShareBurn, Submission, Transfer},
    reader::ChainReader,
    types::TxContext,
    warning::Warning,
};
use alloy_primitives::Address;

/// Call-scoped inputs shared by all handlers
pub struct Context<'a> {
    /// Transaction being processed
    pub tx: &'a TxContext,
    /// Simulator configuration
    pub config: &'a Config,
    /// Authoritative reads prefetched by the caller
    pub reader: &'a dyn ChainReader,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("tx", self.tx)
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

/// Entity created by a handler
#[derive(Debug, Clone, PartialEq)]
pub enum Created {
    /// Deposit
    Submission(Submission),
    /// Value transfer
    Transfer(Transfer),
    /// Share burn
    ShareBurn(ShareBurn),
    /// Rebase reward
    Reward(Reward),
    /// Per-module fee
    ModuleFee(PerModuleFee),
    /// Per-module shares
    ModuleShares(PerModuleShares),
}

/// What a handler did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    /// Entities created, in creation order
    pub created: Vec<Created>,
    /// Holders whose share position changed
    pub touched: Vec<Address>,
    /// Consistency warnings
    pub warnings: Vec<Warning>,
}

impl Effects {
    /// Nothing happened
    pub fn none() -> Self {
        Self::default()
    }

    /// Record a created entity
    pub fn created(&mut self, entity: Created) {
        self.created.push(entity);
    }

    /// Record a touched holder
    pub fn touched(&mut self, holder: Address) {
        if !self.touched.contains(&holder) {
            self.touched.push(holder);
        }
    }

    /// Record a warning
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(code = warning.code(), "{}", warning);
        self.warnings.push(warning);
    }

    /// Fold another handler's effects into this one
    pub fn merge(&mut self, other: Effects) {
        self.created.extend(other.created);
        for holder in other.touched {
            self.touched(holder);
        }
        self.warnings.extend(other.warnings);
    }
}
