// In: src/bridge/handle_table.rs

//! A generation-checked slot map that owns every live bridged instance.
//!
//! A handle is a `(index, generation)` pair packed into one pointer-sized
//! integer: the low half holds `index + 1` (so a live handle is never zero) and
//! the high half holds the slot's generation. Removing an entry bumps the slot's
//! generation, so any copy of the old handle the caller kept becomes detectably
//! stale instead of aliasing whatever later reuses the slot.

use crate::error::BridgeError;

const INDEX_BITS: u32 = usize::BITS / 2;
const INDEX_MASK: usize = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u32 = (usize::MAX >> INDEX_BITS) as u32;

/// Largest number of slots the index half can address (`index + 1 <= INDEX_MASK`).
pub const MAX_SLOTS: usize = INDEX_MASK;

/// The table's key for one live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleKey {
    index: u32,
    generation: u32,
}

impl HandleKey {
    /// Packs the key into the raw value handed across the boundary. Never zero.
    pub fn to_raw(self) -> usize {
        ((self.generation as usize) << INDEX_BITS) | (self.index as usize + 1)
    }

    /// Unpacks a raw boundary value. Returns `None` when the index half is zero,
    /// which no issued handle ever has (this includes the null handle).
    pub fn from_raw(raw: usize) -> Option<Self> {
        let low = raw & INDEX_MASK;
        if low == 0 {
            return None;
        }
        Some(Self {
            index: (low - 1) as u32,
            generation: (raw >> INDEX_BITS) as u32 & GENERATION_MASK,
        })
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Owns values of type `T` and hands out generation-checked keys for them.
#[derive(Debug)]
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    limit: usize,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::with_limit(None)
    }
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table that refuses inserts once `limit` entries are live.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            limit: limit.unwrap_or(MAX_SLOTS).min(MAX_SLOTS),
        }
    }

    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit.unwrap_or(MAX_SLOTS).min(MAX_SLOTS);
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Moves `value` into the table and returns its key.
    pub fn insert(&mut self, value: T) -> Result<HandleKey, BridgeError> {
        if self.live >= self.limit {
            return Err(BridgeError::CapacityExhausted(self.live));
        }

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                // `slots.len() == live < limit <= MAX_SLOTS` here, so the index fits.
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        self.live += 1;

        Ok(HandleKey {
            index,
            generation: slot.generation,
        })
    }

    pub fn get(&self, key: HandleKey) -> Result<&T, BridgeError> {
        let slot = self
            .slots
            .get(key.index as usize)
            .ok_or(BridgeError::UnknownHandle(key.to_raw()))?;
        if slot.generation != key.generation {
            return Err(BridgeError::StaleHandle(key.to_raw()));
        }
        slot.value
            .as_ref()
            .ok_or(BridgeError::StaleHandle(key.to_raw()))
    }

    /// Takes the value out of the table and invalidates `key` and all its copies.
    pub fn remove(&mut self, key: HandleKey) -> Result<T, BridgeError> {
        // Validate first so a stale key never bumps a live slot's generation.
        self.get(key)?;

        let slot = &mut self.slots[key.index as usize];
        let value = slot
            .value
            .take()
            .ok_or(BridgeError::StaleHandle(key.to_raw()))?;
        slot.generation = slot.generation.wrapping_add(1) & GENERATION_MASK;
        self.free.push(key.index);
        self.live -= 1;
        Ok(value)
    }

    /// Removes every live value, invalidating all outstanding keys.
    pub fn drain(&mut self) -> Vec<T> {
        let mut drained = Vec::with_capacity(self.live);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1) & GENERATION_MASK;
                self.free.push(index as u32);
                drained.push(value);
            }
        }
        self.live = 0;
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::collections::HashMap;

    #[test]
    fn test_raw_round_trip_is_never_zero() {
        let mut table = HandleTable::new();
        let key = table.insert("a").unwrap();
        assert_ne!(key.to_raw(), 0);
        assert_eq!(HandleKey::from_raw(key.to_raw()), Some(key));
        assert_eq!(HandleKey::from_raw(0), None);
    }

    #[test]
    fn test_remove_twice_is_stale() {
        let mut table = HandleTable::new();
        let key = table.insert(7u32).unwrap();
        assert_eq!(table.remove(key).unwrap(), 7);
        assert!(matches!(table.remove(key), Err(BridgeError::StaleHandle(_))));
        assert!(matches!(table.get(key), Err(BridgeError::StaleHandle(_))));
        assert!(table.is_empty());
    }

    #[test]
    fn test_reused_slot_gets_new_generation() {
        let mut table = HandleTable::new();
        let old = table.insert("old").unwrap();
        table.remove(old).unwrap();

        // Arrange: the next insert reuses the freed slot.
        let new = table.insert("new").unwrap();
        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert_ne!(old.to_raw(), new.to_raw());

        // Assert: the old key cannot reach the new occupant.
        assert!(matches!(table.get(old), Err(BridgeError::StaleHandle(_))));
        assert_eq!(*table.get(new).unwrap(), "new");
    }

    #[test]
    fn test_stale_remove_does_not_disturb_live_slot() {
        let mut table = HandleTable::new();
        let old = table.insert(1).unwrap();
        table.remove(old).unwrap();
        let new = table.insert(2).unwrap();

        assert!(table.remove(old).is_err());
        assert_eq!(*table.get(new).unwrap(), 2);
    }

    #[test]
    fn test_unknown_index() {
        let table: HandleTable<u8> = HandleTable::new();
        let forged = HandleKey::from_raw(5).unwrap();
        assert!(matches!(table.get(forged), Err(BridgeError::UnknownHandle(5))));
    }

    #[test]
    fn test_limit_is_enforced() {
        let mut table = HandleTable::with_limit(Some(2));
        let a = table.insert('a').unwrap();
        table.insert('b').unwrap();
        assert!(matches!(
            table.insert('c'),
            Err(BridgeError::CapacityExhausted(2))
        ));

        table.remove(a).unwrap();
        assert!(table.insert('c').is_ok());
    }

    #[test]
    fn test_drain_invalidates_everything() {
        let mut table = HandleTable::new();
        let keys: Vec<_> = (0..4).map(|i| table.insert(i).unwrap()).collect();
        let mut drained = table.drain();
        drained.sort();
        assert_eq!(drained, vec![0, 1, 2, 3]);
        assert!(table.is_empty());
        for key in keys {
            assert!(table.get(key).is_err());
        }
    }

    /// Random create/destroy churn against a shadow map: every live key must
    /// resolve to its own value and every removed key must stay stale.
    #[test]
    fn test_random_churn_matches_shadow_model() {
        let mut rng = rand::rng();
        let mut table = HandleTable::new();
        let mut live: HashMap<HandleKey, u64> = HashMap::new();
        let mut dead: Vec<HandleKey> = Vec::new();

        for step in 0..2_000u64 {
            if live.is_empty() || rng.random_bool(0.55) {
                let key = table.insert(step).unwrap();
                assert!(live.insert(key, step).is_none(), "key issued twice");
            } else {
                let victim = *live.keys().next().unwrap();
                let expected = live.remove(&victim).unwrap();
                assert_eq!(table.remove(victim).unwrap(), expected);
                dead.push(victim);
            }
        }

        assert_eq!(table.len(), live.len());
        for (key, value) in &live {
            assert_eq!(table.get(*key).unwrap(), value);
        }
        for key in dead {
            assert!(table.get(key).is_err());
        }
    }
}
