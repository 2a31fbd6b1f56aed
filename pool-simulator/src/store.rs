//! In-memory entity store
//!
//! # Tables
//!
//! - `totals` - Pool totals singleton, created lazily
//! - `shares` - Holder share positions (key: holder)
//! - `rewards` - Rebase reward breakdowns (key: tx hash)
//! - `submissions` - Deposits (key: tx-log)
//! - `transfers` - Value transfers (key: tx-log)
//! - `share_burns` - Explicit burns (key: tx-log)
//! - `module_fees` - Per-module fees (key: tx, module)
//! - `module_shares` - Per-module shares (key: tx, module)
//!
//! Tables iterate in insertion order. Nothing is ever deleted except by
//! [`EntityStore::reset`]. One store belongs to exactly one simulation run.

use crate::{
    entities::{PerModuleFee, PerModuleShares, Reward, ShareBurn, Shares, Submission, Totals, Transfer},
    math,
    types::EventKey,
    Error, Result,
};
use alloy_primitives::{Address, B256, I256, U256};
use indexmap::IndexMap;
use std::fmt::Debug;
use std::hash::Hash;

/// An entity kind with its own table
pub trait StoredEntity: Clone + Sized {
    /// Table key
    type Key: Clone + Eq + Hash + Debug;

    /// Kind name used in errors and logs
    const KIND: &'static str;

    /// Whether `put` may overwrite an existing entry
    const MUTABLE: bool;

    /// Key of this entity
    fn key(&self) -> Self::Key;

    /// Read access to the table
    fn table(store: &EntityStore) -> &IndexMap<Self::Key, Self>;

    /// Write access to the table
    fn table_mut(store: &mut EntityStore) -> &mut IndexMap<Self::Key, Self>;
}

/// Cumulative kinds that can be created on first touch
pub trait Cumulative: StoredEntity {
    /// Fresh entity for a key
    fn create(key: &Self::Key) -> Self;
}

/// Entity store for one simulation run
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    totals: Option<Totals>,
    shares: IndexMap<Address, Shares>,
    rewards: IndexMap<B256, Reward>,
    submissions: IndexMap<EventKey, Submission>,
    transfers: IndexMap<EventKey, Transfer>,
    share_burns: IndexMap<EventKey, ShareBurn>,
    module_fees: IndexMap<(B256, Address), PerModuleFee>,
    module_shares: IndexMap<(B256, Address), PerModuleShares>,
}

impl EntityStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entity
    pub fn reset(&mut self) {
        *self = Self::default();
        tracing::debug!("Entity store reset");
    }

    // Totals

    /// Current totals, zero if never touched
    pub fn totals(&self) -> Totals {
        self.totals.unwrap_or_default()
    }

    /// Totals if they were ever created
    pub fn recorded_totals(&self) -> Option<Totals> {
        self.totals
    }

    /// Totals, created lazily
    pub fn totals_mut(&mut self) -> &mut Totals {
        self.totals.get_or_insert_with(Totals::default)
    }

    /// Start the run from known totals
    pub fn seed_totals(&mut self, pooled_value: U256, share_units: U256) {
        self.totals = Some(Totals::new(pooled_value, share_units));
        tracing::debug!(%pooled_value, %share_units, "Totals seeded");
    }

    // Holders

    /// Start a holder from an externally observed balance
    pub fn seed_holder(&mut self, holder: Address, shares: U256) {
        let position = self.get_or_create::<Shares>(&holder);
        let delta = position.delta();
        position.starting = math::signed(shares);
        position.shares = position.starting.saturating_add(delta);
        tracing::debug!(%holder, %shares, "Holder seeded");
    }

    /// Current position of a holder, zero if unknown
    pub fn shares_of(&self, holder: &Address) -> I256 {
        self.shares.get(holder).map(|s| s.shares).unwrap_or(I256::ZERO)
    }

    // Generic table access

    /// Lookup by key
    pub fn get<E: StoredEntity>(&self, key: &E::Key) -> Option<&E> {
        E::table(self).get(key)
    }

    /// Lookup, creating a fresh entity on first touch
    pub fn get_or_create<E: Cumulative>(&mut self, key: &E::Key) -> &mut E {
        E::table_mut(self)
            .entry(key.clone())
            .or_insert_with(|| E::create(key))
    }

    /// Write an entity. Immutable kinds can be written only once per key.
    pub fn put<E: StoredEntity>(&mut self, entity: E) -> Result<()> {
        let key = entity.key();
        let table = E::table_mut(self);
        if !E::MUTABLE && table.contains_key(&key) {
            return Err(Error::DuplicateEntity {
                kind: E::KIND,
                id: format!("{:?}", key),
            });
        }
        table.insert(key, entity);
        Ok(())
    }

    /// All entities of a kind in insertion order
    pub fn iter<'a, E: StoredEntity + 'a>(&'a self) -> impl Iterator<Item = &'a E> + 'a {
        E::table(self).values()
    }

    /// Number of entities of a kind
    pub fn count<E: StoredEntity>(&self) -> usize {
        E::table(self).len()
    }

    // Identifier-based relations

    /// Module fee entries belonging to a reward
    pub fn module_fees_for(&self, reward: &B256) -> Vec<&PerModuleFee> {
        self.module_fees
            .values()
            .filter(|fee| fee.reward == *reward)
            .collect()
    }

    /// Module share entries belonging to a reward
    pub fn module_shares_for(&self, reward: &B256) -> Vec<&PerModuleShares> {
        self.module_shares
            .values()
            .filter(|shares| shares.reward == *reward)
            .collect()
    }
}

impl StoredEntity for Shares {
    type Key = Address;
    const KIND: &'static str = "shares";
    const MUTABLE: bool = true;

    fn key(&self) -> Address {
        self.holder
    }

    fn table(store: &EntityStore) -> &IndexMap<Address, Self> {
        &store.shares
    }

    fn table_mut(store: &mut EntityStore) -> &mut IndexMap<Address, Self> {
        &mut store.shares
    }
}

impl Cumulative for Shares {
    fn create(key: &Address) -> Self {
        Shares::new(*key)
    }
}

impl StoredEntity for Reward {
    type Key = B256;
    const KIND: &'static str = "reward";
    const MUTABLE: bool = false;

    fn key(&self) -> B256 {
        self.id
    }

    fn table(store: &EntityStore) -> &IndexMap<B256, Self> {
        &store.rewards
    }

    fn table_mut(store: &mut EntityStore) -> &mut IndexMap<B256, Self> {
        &mut store.rewards
    }
}

impl StoredEntity for Submission {
    type Key = EventKey;
    const KIND: &'static str = "submission";
    const MUTABLE: bool = false;

    fn key(&self) -> EventKey {
        self.id
    }

    fn table(store: &EntityStore) -> &IndexMap<EventKey, Self> {
        &store.submissions
    }

    fn table_mut(store: &mut EntityStore) -> &mut IndexMap<EventKey, Self> {
        &mut store.submissions
    }
}

impl StoredEntity for Transfer {
    type Key = EventKey;
    const KIND: &'static str = "transfer";
    const MUTABLE: bool = false;

    fn key(&self) -> EventKey {
        self.id
    }

    fn table(store: &EntityStore) -> &IndexMap<EventKey, Self> {
        &store.transfers
    }

    fn table_mut(store: &mut EntityStore) -> &mut IndexMap<EventKey, Self> {
        &mut store.transfers
    }
}

impl StoredEntity for ShareBurn {
    type Key = EventKey;
    const KIND: &'static str = "share_burn";
    const MUTABLE: bool = false;

    fn key(&self) -> EventKey {
        self.id
    }

    fn table(store: &EntityStore) -> &IndexMap<EventKey, Self> {
        &store.share_burns
    }

    fn table_mut(store: &mut EntityStore) -> &mut IndexMap<EventKey, Self> {
        &mut store.share_burns
    }
}

impl StoredEntity for PerModuleFee {
    type Key = (B256, Address);
    const KIND: &'static str = "module_fee";
    const MUTABLE: bool = false;

    fn key(&self) -> (B256, Address) {
        (self.reward, self.module)
    }

    fn table(store: &EntityStore) -> &IndexMap<(B256, Address), Self> {
        &store.module_fees
    }

    fn table_mut(store: &mut EntityStore) -> &mut IndexMap<(B256, Address), Self> {
        &mut store.module_fees
    }
}

impl StoredEntity for PerModuleShares {
    type Key = (B256, Address);
    const KIND: &'static str = "module_shares";
    const MUTABLE: bool = false;

    fn key(&self) -> (B256, Address) {
        (self.reward, self.module)
    }

    fn table(store: &EntityStore) -> &IndexMap<(B256, Address), Self> {
        &store.module_shares
    }

    fn table_mut(store: &mut EntityStore) -> &mut IndexMap<(B256, Address), Self> {
        &mut store.module_shares
    }
}
