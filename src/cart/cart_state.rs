use std::sync::Arc;

use nft_core::core::bits::NftId;

use crate::{model::nft::ItemDetail, net::http_client::NetworkError};

use super::{
    slot::{CartAggregate, CartSlot},
    sort::{sort_slots, SortCriterion},
};

/// Load cycle identifier. Every detail fetch carries the generation it was
/// issued for, and is applied only while that generation is current.
pub type Generation = u64;

/// Where a detail completion landed.
#[derive(Debug, PartialEq, Eq)]
pub enum DetailOutcome {
    Applied { index: usize },
    /// Issued for an earlier cycle.
    Stale,
    /// Current cycle, but no pending slot carries the id any more.
    Unmatched,
}

/// Synchronous cart truth: the slots of the current cycle and whether they
/// have all settled. Owned by the state machine task, never shared.
#[derive(Debug, Default)]
pub struct CartState {
    slots: Vec<CartSlot>,
    all_settled: bool,
    generation: Generation,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_settled(&self) -> bool {
        self.all_settled
    }

    pub fn slots(&self) -> &[CartSlot] {
        &self.slots
    }

    pub fn aggregate(&self) -> CartAggregate {
        CartAggregate::derive(self.slots.clone(), self.all_settled)
    }

    /// Replace slots with one pending slot per id, opening a new cycle.
    pub fn begin_cycle(&mut self, item_ids: Vec<NftId>) -> Generation {
        self.generation += 1;
        self.slots = item_ids.into_iter().map(CartSlot::Pending).collect();
        self.all_settled = false;
        self.generation
    }

    /// Resolve a pending slot with the fetch result.
    ///
    /// The index is where the slot was when the fetch was issued; sorting and
    /// removal may have moved it since, in which case the first pending slot
    /// with the same id is resolved instead.
    pub fn apply_detail(
        &mut self,
        generation: Generation,
        index_hint: usize,
        id: &NftId,
        result: Result<ItemDetail, NetworkError>,
    ) -> DetailOutcome {
        if generation != self.generation {
            return DetailOutcome::Stale;
        }

        let matches = |slot: &CartSlot| slot.is_pending() && slot.id() == id;
        let index = match self.slots.get(index_hint) {
            Some(slot) if matches(slot) => Some(index_hint),
            _ => self.slots.iter().position(matches),
        };

        let Some(index) = index else {
            return DetailOutcome::Unmatched;
        };

        self.slots[index] = match result {
            Ok(detail) => CartSlot::Ready(Arc::new(detail)),
            Err(err) => CartSlot::Failed(id.clone(), err),
        };

        DetailOutcome::Applied { index }
    }

    /// Mark the cycle settled once no slot is pending. Returns true only on
    /// the transition, so the footer is announced once per cycle.
    pub fn settle_if_complete(&mut self) -> bool {
        if self.all_settled || self.slots.iter().any(CartSlot::is_pending) {
            return false;
        }
        self.all_settled = true;
        true
    }

    pub fn sort(&mut self, criterion: SortCriterion) {
        sort_slots(&mut self.slots, criterion);
    }

    pub fn find(&self, id: &NftId) -> Option<&CartSlot> {
        self.slots.iter().find(|slot| slot.id() == id)
    }

    pub fn item_ids(&self) -> Vec<NftId> {
        self.slots.iter().map(|slot| slot.id().clone()).collect()
    }

    /// Item list the order should have once `id` is removed.
    pub fn item_ids_without(&self, id: &NftId) -> Vec<NftId> {
        self.slots
            .iter()
            .map(CartSlot::id)
            .filter(|x| *x != id)
            .cloned()
            .collect()
    }

    /// Drop every slot with `id`, returning how many were dropped.
    pub fn remove(&mut self, id: &NftId) -> usize {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id() != id);
        before - self.slots.len()
    }
}
