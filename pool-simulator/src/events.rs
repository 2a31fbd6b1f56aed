//! Typed views over decoded log records
//!
//! Each modeled event family gets a plain struct. [`ProtocolEvent::decode`]
//! turns a [`LogRecord`] into one of them, or reports a malformed record.
//! Unknown names decode to `None` and are skipped by the processor.

use crate::{
    types::{EventArgs, LogRecord},
    Error, Result,
};
use alloy_primitives::{Address, U256};

/// Event names as emitted by the pool contract
pub mod names {
    /// Deposit
    pub const SUBMITTED: &str = "Submitted";
    /// Token value transfer
    pub const TRANSFER: &str = "Transfer";
    /// Share transfer paired with every token transfer
    pub const TRANSFER_SHARES: &str = "TransferShares";
    /// Oracle report: consensus-layer accounting
    pub const ETH_DISTRIBUTED: &str = "ETHDistributed";
    /// Oracle report: resulting totals
    pub const TOKEN_REBASED: &str = "TokenRebased";
    /// Shares burnt on withdrawal finalization
    pub const SHARES_BURNT: &str = "SharesBurnt";
    /// External vault mint
    pub const EXTERNAL_SHARES_MINTED: &str = "ExternalSharesMinted";
    /// External vault burn
    pub const EXTERNAL_SHARES_BURNT: &str = "ExternalSharesBurnt";
}

/// `Submitted(sender, amount, referral)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    /// Depositor
    pub sender: Address,
    /// Deposited value
    pub amount: U256,
    /// Referral, if any
    pub referral: Option<Address>,
}

/// `Transfer(from, to, value)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    /// Source (null for mints)
    pub from: Address,
    /// Destination (null for burns)
    pub to: Address,
    /// Token value
    pub value: U256,
}

/// `TransferShares(from, to, sharesValue)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharesTransfer {
    /// Source
    pub from: Address,
    /// Destination
    pub to: Address,
    /// Share units moved
    pub shares: U256,
}

/// `ETHDistributed(...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthDistributed {
    /// Oracle report reference time
    pub report_timestamp: U256,
    /// Consensus-layer balance before the report
    pub pre_cl_balance: U256,
    /// Consensus-layer balance after the report
    pub post_cl_balance: U256,
    /// Withdrawals moved to the pool
    pub withdrawals_withdrawn: U256,
    /// Execution-layer rewards moved to the pool
    pub execution_layer_rewards_withdrawn: U256,
    /// Buffered value after the report
    pub post_buffered_ether: U256,
}

impl EthDistributed {
    /// `postCL + withdrawals > preCL`
    pub fn is_profitable(&self) -> bool {
        self.post_cl_balance.saturating_add(self.withdrawals_withdrawn) > self.pre_cl_balance
    }

    /// Consensus-layer gain plus execution-layer rewards. Zero when not profitable.
    pub fn total_rewards_with_fees(&self) -> U256 {
        if !self.is_profitable() {
            return U256::ZERO;
        }
        self.post_cl_balance.saturating_add(self.withdrawals_withdrawn) - self.pre_cl_balance
            + self.execution_layer_rewards_withdrawn
    }
}

/// `TokenRebased(...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRebased {
    /// Oracle report reference time
    pub report_timestamp: U256,
    /// Seconds since the previous report
    pub time_elapsed: U256,
    /// Total shares before
    pub pre_total_shares: U256,
    /// Pooled value before
    pub pre_total_ether: U256,
    /// Total shares after
    pub post_total_shares: U256,
    /// Pooled value after
    pub post_total_ether: U256,
    /// Shares minted as protocol fee
    pub shares_minted_as_fees: U256,
}

/// `SharesBurnt(account, preRebaseTokenAmount, postRebaseTokenAmount, sharesAmount)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharesBurnt {
    /// Account whose shares are burnt
    pub account: Address,
    /// Token amount before the rebase
    pub pre_rebase_token_amount: U256,
    /// Token amount after the rebase
    pub post_rebase_token_amount: U256,
    /// Shares burnt
    pub shares_amount: U256,
}

/// `ExternalSharesMinted(receiver, amountOfShares, amountOfStETH)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSharesMinted {
    /// Receiver of the minted shares
    pub receiver: Address,
    /// Shares minted
    pub amount_of_shares: U256,
    /// Token amount at mint time
    pub token_amount: U256,
}

/// `ExternalSharesBurnt(amountOfShares)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSharesBurnt {
    /// Shares burnt
    pub amount_of_shares: U256,
}

/// A modeled event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// Deposit
    Submitted(Submitted),
    /// Token transfer
    Transfer(TokenTransfer),
    /// Share transfer
    TransferShares(SharesTransfer),
    /// Oracle report accounting
    EthDistributed(EthDistributed),
    /// Oracle report totals
    TokenRebased(TokenRebased),
    /// Share burn
    SharesBurnt(SharesBurnt),
    /// External mint
    ExternalSharesMinted(ExternalSharesMinted),
    /// External burn
    ExternalSharesBurnt(ExternalSharesBurnt),
}

impl ProtocolEvent {
    /// Decode a record. `Ok(None)` for event families the simulator does not model.
    pub fn decode(record: &LogRecord) -> Result<Option<Self>> {
        let args = &record.args;
        let decoded = match record.name.as_str() {
            names::SUBMITTED => ProtocolEvent::Submitted(Submitted {
                sender: field(record, args.address("sender"))?,
                amount: field(record, args.uint("amount"))?,
                referral: field(record, args.optional_address("referral"))?,
            }),
            names::TRANSFER => ProtocolEvent::Transfer(TokenTransfer {
                from: field(record, args.address("from"))?,
                to: field(record, args.address("to"))?,
                value: field(record, args.uint("value"))?,
            }),
            names::TRANSFER_SHARES => ProtocolEvent::TransferShares(SharesTransfer {
                from: field(record, args.address("from"))?,
                to: field(record, args.address("to"))?,
                shares: field(record, args.uint("sharesValue"))?,
            }),
            names::ETH_DISTRIBUTED => ProtocolEvent::EthDistributed(EthDistributed {
                report_timestamp: field(record, args.uint("reportTimestamp"))?,
                pre_cl_balance: field(record, args.uint("preCLBalance"))?,
                post_cl_balance: field(record, args.uint("postCLBalance"))?,
                withdrawals_withdrawn: field(record, args.uint("withdrawalsWithdrawn"))?,
                execution_layer_rewards_withdrawn: field(
                    record,
                    args.uint("executionLayerRewardsWithdrawn"),
                )?,
                post_buffered_ether: field(record, args.uint("postBufferedEther"))?,
            }),
            names::TOKEN_REBASED => ProtocolEvent::TokenRebased(TokenRebased {
                report_timestamp: field(record, args.uint("reportTimestamp"))?,
                time_elapsed: field(record, args.uint("timeElapsed"))?,
                pre_total_shares: field(record, args.uint("preTotalShares"))?,
                pre_total_ether: field(record, args.uint("preTotalEther"))?,
                post_total_shares: field(record, args.uint("postTotalShares"))?,
                post_total_ether: field(record, args.uint("postTotalEther"))?,
                shares_minted_as_fees: field(record, args.uint("sharesMintedAsFees"))?,
            }),
            names::SHARES_BURNT => ProtocolEvent::SharesBurnt(SharesBurnt {
                account: field(record, args.address("account"))?,
                pre_rebase_token_amount: field(record, args.uint("preRebaseTokenAmount"))?,
                post_rebase_token_amount: field(record, args.uint("postRebaseTokenAmount"))?,
                shares_amount: field(record, args.uint("sharesAmount"))?,
            }),
            names::EXTERNAL_SHARES_MINTED => ProtocolEvent::ExternalSharesMinted(ExternalSharesMinted {
                receiver: field(record, args.address("receiver"))?,
                amount_of_shares: field(record, args.uint("amountOfShares"))?,
                token_amount: field(record, args.uint("amountOfStETH"))?,
            }),
            names::EXTERNAL_SHARES_BURNT => ProtocolEvent::ExternalSharesBurnt(ExternalSharesBurnt {
                amount_of_shares: field(record, args.uint("amountOfShares"))?,
            }),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}

fn field<T>(record: &LogRecord, value: std::result::Result<T, String>) -> Result<T> {
    value.map_err(|reason| Error::MalformedEvent {
        event: record.name.clone(),
        log_index: record.log_index,
        reason,
    })
}

/// Argument builders matching the decoder, used by tests and replay fixtures
pub mod build {
    use super::*;

    /// `Submitted` arguments
    pub fn submitted(sender: Address, amount: U256, referral: Option<Address>) -> EventArgs {
        let args = EventArgs::new().with("sender", sender).with("amount", amount);
        match referral {
            Some(referral) => args.with("referral", referral),
            None => args,
        }
    }

    /// `Transfer` arguments
    pub fn transfer(from: Address, to: Address, value: U256) -> EventArgs {
        EventArgs::new()
            .with("from", from)
            .with("to", to)
            .with("value", value)
    }

    /// `TransferShares` arguments
    pub fn transfer_shares(from: Address, to: Address, shares: U256) -> EventArgs {
        EventArgs::new()
            .with("from", from)
            .with("to", to)
            .with("sharesValue", shares)
    }

    /// `ETHDistributed` arguments
    pub fn eth_distributed(event: &EthDistributed) -> EventArgs {
        EventArgs::new()
            .with("reportTimestamp", event.report_timestamp)
            .with("preCLBalance", event.pre_cl_balance)
            .with("postCLBalance", event.post_cl_balance)
            .with("withdrawalsWithdrawn", event.withdrawals_withdrawn)
            .with(
                "executionLayerRewardsWithdrawn",
                event.execution_layer_rewards_withdrawn,
            )
            .with("postBufferedEther", event.post_buffered_ether)
    }

    /// `TokenRebased` arguments
    pub fn token_rebased(event: &TokenRebased) -> EventArgs {
        EventArgs::new()
            .with("reportTimestamp", event.report_timestamp)
            .with("timeElapsed", event.time_elapsed)
            .with("preTotalShares", event.pre_total_shares)
            .with("preTotalEther", event.pre_total_ether)
            .with("postTotalShares", event.post_total_shares)
            .with("postTotalEther", event.post_total_ether)
            .with("sharesMintedAsFees", event.shares_minted_as_fees)
    }

    /// `SharesBurnt` arguments
    pub fn shares_burnt(event: &SharesBurnt) -> EventArgs {
        EventArgs::new()
            .with("account", event.account)
            .with("preRebaseTokenAmount", event.pre_rebase_token_amount)
            .with("postRebaseTokenAmount", event.post_rebase_token_amount)
            .with("sharesAmount", event.shares_amount)
    }

    /// `ExternalSharesMinted` arguments
    pub fn external_shares_minted(receiver: Address, shares: U256, token_amount: U256) -> EventArgs {
        EventArgs::new()
            .with("receiver", receiver)
            .with("amountOfShares", shares)
            .with("amountOfStETH", token_amount)
    }

    /// `ExternalSharesBurnt` arguments
    pub fn external_shares_burnt(shares: U256) -> EventArgs {
        EventArgs::new().with("amountOfShares", shares)
    }
}
