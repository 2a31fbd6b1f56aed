//! Staking Pool Simulator
//!
//! Rebuilds the accounting of a rebasing staking pool token from its event
//! logs: pool totals, per-holder share positions, deposits, transfers, burns
//! and the reward breakdown of every oracle report.
//!
//! # Architecture
//!
//! - **Event Sourcing**: All state is derived from ordered event records
//! - **Single Writer**: One run owns its store; transactions are applied in order
//! - **Look-ahead Windows**: Paired events are found by searching the decoded transaction
//! - **Integer Math**: 256-bit arithmetic, one conversion to `f64` for rates
//!
//! # Invariants
//!
//! - Deterministic replay: Same records + same seed state → byte-identical results
//! - Fee split: minted fee shares == treasury shares + operator shares
//! - Append-only: Immutable entities are never overwritten

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod checkpoint;
pub mod config;
pub mod entities;
pub mod error;
pub mod events;
pub mod handlers;
pub mod math;
pub mod metrics;
pub mod processor;
pub mod query;
pub mod reader;
pub mod simulator;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod warning;
pub mod window;

// Re-exports
pub use config::Config;
pub use entities::{PerModuleFee, PerModuleShares, Reward, ShareBurn, Shares, Submission, Totals, Transfer};
pub use error::{Error, Result};
pub use processor::{process_transaction, TxResult};
pub use query::{Direction, OrderBy, RewardQuery};
pub use reader::{ChainReader, NoReads, SnapshotReader};
pub use simulator::Simulator;
pub use store::EntityStore;
pub use types::{ArgValue, EventArgs, EventKey, LogRecord, TxContext};
pub use warning::Warning;
