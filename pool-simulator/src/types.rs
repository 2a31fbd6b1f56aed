//! Input types handed over by the log decoder
//!
//! The simulator never sees raw log bytes. Each transaction arrives as an
//! ordered list of [`LogRecord`]s with already-typed argument maps.

use alloy_primitives::{Address, B256, I256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Zero address: source of mints, destination of burns
pub const NULL_ADDRESS: Address = Address::ZERO;

/// Whether the address is the null identity
pub fn is_null(address: &Address) -> bool {
    *address == NULL_ADDRESS
}

/// A decoded event argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ArgValue {
    /// Unsigned integer (uint8..uint256)
    Uint(U256),
    /// Signed integer (int8..int256)
    Int(I256),
    /// Address
    Address(Address),
    /// Boolean
    Bool(bool),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl ArgValue {
    fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Uint(_) => "uint",
            ArgValue::Int(_) => "int",
            ArgValue::Address(_) => "address",
            ArgValue::Bool(_) => "bool",
            ArgValue::Bytes(_) => "bytes",
        }
    }
}

impl From<U256> for ArgValue {
    fn from(value: U256) -> Self {
        ArgValue::Uint(value)
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        ArgValue::Uint(U256::from(value))
    }
}

impl From<Address> for ArgValue {
    fn from(value: Address) -> Self {
        ArgValue::Address(value)
    }
}

/// Named arguments of one event, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventArgs(BTreeMap<String, ArgValue>);

impl EventArgs {
    /// Empty argument map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Insert or replace an argument
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ArgValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Raw lookup
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name)
    }

    /// Unsigned integer argument
    pub fn uint(&self, name: &str) -> std::result::Result<U256, String> {
        match self.0.get(name) {
            Some(ArgValue::Uint(v)) => Ok(*v),
            Some(other) => Err(format!("argument `{}` is {}, expected uint", name, other.type_name())),
            None => Err(format!("missing argument `{}`", name)),
        }
    }

    /// Address argument
    pub fn address(&self, name: &str) -> std::result::Result<Address, String> {
        match self.0.get(name) {
            Some(ArgValue::Address(v)) => Ok(*v),
            Some(other) => Err(format!(
                "argument `{}` is {}, expected address",
                name,
                other.type_name()
            )),
            None => Err(format!("missing argument `{}`", name)),
        }
    }

    /// Optional address argument (absent is fine, wrong type is not)
    pub fn optional_address(&self, name: &str) -> std::result::Result<Option<Address>, String> {
        match self.0.get(name) {
            None => Ok(None),
            Some(_) => self.address(name).map(Some),
        }
    }
}

/// One decoded log of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Event name (e.g. `Transfer`)
    pub name: String,

    /// Position of the log within the block
    pub log_index: u64,

    /// Emitting contract
    pub address: Address,

    /// Typed arguments
    #[serde(default)]
    pub args: EventArgs,
}

impl LogRecord {
    /// Create a record
    pub fn new(name: impl Into<String>, log_index: u64, address: Address, args: EventArgs) -> Self {
        Self {
            name: name.into(),
            log_index,
            address,
            args,
        }
    }
}

/// Per-transaction metadata supplied alongside the events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    /// Transaction hash
    pub tx_hash: B256,

    /// Block number
    pub block_number: u64,

    /// Block timestamp (seconds since Unix epoch)
    pub block_timestamp: u64,

    /// Index of the transaction within its block
    pub transaction_index: u64,
}

impl TxContext {
    /// Key for an event of this transaction
    pub fn key(&self, log_index: u64) -> EventKey {
        EventKey {
            tx_hash: self.tx_hash,
            log_index,
        }
    }
}

/// Identifier of an entity derived from a single event: `<tx>-<log index>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    /// Transaction hash
    pub tx_hash: B256,
    /// Log position
    pub log_index: u64,
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.tx_hash, self.log_index)
    }
}
