//! Look-ahead over one transaction's events
//!
//! The whole transaction is decoded up front, so "peeking forward" is a plain
//! search over a slice. Positions claimed by a look-ahead are recorded as
//! consumed and skipped by the processor and by later searches.

use crate::{
    events::{ProtocolEvent, SharesTransfer},
    types::{LogRecord, TxContext},
    Error, Result,
};
use alloy_primitives::{Address, U256};
use std::collections::BTreeSet;

/// A decoded, modeled event and its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLog {
    /// Position in the block
    pub log_index: u64,
    /// Emitting contract
    pub address: Address,
    /// Typed event
    pub event: ProtocolEvent,
}

/// Decoded events of one transaction plus the consumed-position set
#[derive(Debug, Clone, Default)]
pub struct TxEvents {
    logs: Vec<DecodedLog>,
    consumed: BTreeSet<u64>,
    ignored: usize,
}

impl TxEvents {
    /// Decode a transaction's records
    ///
    /// Records must be in strictly ascending log order. Records from other
    /// contracts (when `token` is set) and unmodeled event names are dropped
    /// and counted as ignored.
    pub fn decode(tx: &TxContext, records: &[LogRecord], token: Option<Address>) -> Result<Self> {
        let mut logs = Vec::with_capacity(records.len());
        let mut ignored = 0;
        let mut previous: Option<u64> = None;

        for record in records {
            if let Some(previous) = previous {
                if record.log_index <= previous {
                    return Err(Error::UnorderedEvents {
                        tx_hash: tx.tx_hash,
                        previous,
                        current: record.log_index,
                    });
                }
            }
            previous = Some(record.log_index);

            if token.is_some_and(|token| token != record.address) {
                ignored += 1;
                continue;
            }

            match ProtocolEvent::decode(record)? {
                Some(event) => logs.push(DecodedLog {
                    log_index: record.log_index,
                    address: record.address,
                    event,
                }),
                None => {
                    tracing::trace!(name = %record.name, log_index = record.log_index, "Unmodeled event");
                    ignored += 1;
                }
            }
        }

        Ok(Self {
            logs,
            consumed: BTreeSet::new(),
            ignored,
        })
    }

    /// Decoded events in log order
    pub fn logs(&self) -> &[DecodedLog] {
        &self.logs
    }

    /// Number of records dropped during decoding
    pub fn ignored(&self) -> usize {
        self.ignored
    }

    /// Position already claimed by a look-ahead
    pub fn is_consumed(&self, log_index: u64) -> bool {
        self.consumed.contains(&log_index)
    }

    /// Claim a position
    pub fn consume(&mut self, log_index: u64) {
        self.consumed.insert(log_index);
    }

    /// First unconsumed event strictly after `after` matching `pick`
    pub fn find_after<T>(
        &self,
        after: u64,
        pick: impl Fn(&ProtocolEvent) -> Option<T>,
    ) -> Option<(u64, T)> {
        self.logs
            .iter()
            .filter(|log| log.log_index > after && !self.is_consumed(log.log_index))
            .find_map(|log| pick(&log.event).map(|value| (log.log_index, value)))
    }

    /// Events strictly between two positions, consumed or not
    pub fn between(&self, start: u64, end: u64) -> impl Iterator<Item = &DecodedLog> + '_ {
        self.logs
            .iter()
            .filter(move |log| log.log_index > start && log.log_index < end)
    }

    /// Share transfer paired with a token transfer at `after`
    ///
    /// The pair is the first unconsumed `TransferShares` ahead with the same
    /// endpoints, not in `skip`, and before `limit` when given.
    pub fn paired_shares(
        &self,
        after: u64,
        from: Address,
        to: Address,
        limit: Option<u64>,
        skip: &BTreeSet<u64>,
    ) -> Option<(u64, U256)> {
        self.logs
            .iter()
            .filter(|log| log.log_index > after && !self.is_consumed(log.log_index))
            .filter(|log| !skip.contains(&log.log_index))
            .take_while(|log| limit.map_or(true, |limit| log.log_index < limit))
            .find_map(|log| match &log.event {
                ProtocolEvent::TransferShares(SharesTransfer {
                    from: shares_from,
                    to: shares_to,
                    shares,
                }) if *shares_from == from && *shares_to == to => Some((log.log_index, *shares)),
                _ => None,
            })
    }
}
