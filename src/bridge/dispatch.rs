// In: src/bridge/dispatch.rs

use std::sync::Arc;

use crate::bridge::handle_table::{HandleKey, HandleTable};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::species::{Cat, Species};
use crate::traits::Creature;

/// The stateful facade behind every exported symbol.
///
/// A `Bridge` owns each live instance in a generation-checked table and is the
/// only place instances are created or dropped. Every operation names the type
/// whose symbol was used to reach it (`via`), which is checked against the
/// instance's dynamic species before anything is dispatched.
#[derive(Debug)]
pub struct Bridge {
    table: HandleTable<Box<dyn Creature>>,
    config: Arc<BridgeConfig>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            table: HandleTable::with_limit(config.max_live_handles),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> Arc<BridgeConfig> {
        Arc::clone(&self.config)
    }

    /// Swaps in a new config. Refused while any handle is live, since a lower
    /// capacity or a different output target would change behavior under them.
    pub fn reconfigure(&mut self, config: BridgeConfig) -> Result<(), BridgeError> {
        if !self.table.is_empty() {
            return Err(BridgeError::Busy(self.table.len()));
        }
        self.table.set_limit(config.max_live_handles);
        self.config = Arc::new(config);
        Ok(())
    }

    pub fn live_handles(&self) -> usize {
        self.table.len()
    }

    /// Decodes a raw boundary value into a table key.
    pub fn key_from_raw(raw: usize, symbol: &'static str) -> Result<HandleKey, BridgeError> {
        if raw == 0 {
            return Err(BridgeError::NullHandle(symbol));
        }
        HandleKey::from_raw(raw).ok_or(BridgeError::UnknownHandle(raw))
    }

    //==================================================================================
    // Lifecycle
    //==================================================================================

    /// `T_new`: constructs a fresh instance of `species` and takes ownership of it.
    pub fn create(&mut self, species: Species) -> Result<HandleKey, BridgeError> {
        self.adopt(species.instantiate())
    }

    /// Takes ownership of an already constructed instance.
    pub fn adopt(&mut self, creature: Box<dyn Creature>) -> Result<HandleKey, BridgeError> {
        let species = creature.species();
        let key = self.table.insert(creature)?;
        log::debug!(
            "created {} handle {:#x} ({} live)",
            species,
            key.to_raw(),
            self.table.len()
        );
        Ok(key)
    }

    /// `T_delete`: drops the instance (derived-to-base) and invalidates `key`.
    ///
    /// A base type's destructor accepts any subtype; a subtype's destructor
    /// rejects instances that are not of that subtype and leaves them alive.
    pub fn destroy(&mut self, key: HandleKey, via: Species) -> Result<(), BridgeError> {
        self.resolve(key, via, destructor_symbol(via))?;
        let creature = self.table.remove(key)?;
        log::debug!(
            "destroying {} handle {:#x} ({} live)",
            creature.species(),
            key.to_raw(),
            self.table.len()
        );
        drop(creature);
        Ok(())
    }

    /// Destroys every live instance and returns how many there were.
    pub fn drain(&mut self) -> usize {
        let drained = self.table.drain();
        let count = drained.len();
        if count > 0 {
            log::warn!("draining {} handle(s) the caller never destroyed", count);
        }
        count
    }

    //==================================================================================
    // Dispatch
    //==================================================================================

    /// `T_eat`: virtual, so the line comes from the instance's dynamic type no
    /// matter which type's symbol was used.
    pub fn eat(&self, key: HandleKey, via: Species) -> Result<&'static str, BridgeError> {
        Ok(self.resolve(key, via, eat_symbol(via))?.eat())
    }

    /// `Cat_scratch`: an own method, reachable only on cats.
    pub fn scratch(&self, key: HandleKey) -> Result<&'static str, BridgeError> {
        Ok(self.cat(key, "Cat_scratch")?.scratch())
    }

    /// `Cat___mul_number`.
    pub fn mul_number(&self, key: HandleKey, factor: i64) -> Result<i64, BridgeError> {
        self.cat(key, "Cat___mul_number")?.mul_number(factor)
    }

    fn resolve(
        &self,
        key: HandleKey,
        via: Species,
        symbol: &'static str,
    ) -> Result<&dyn Creature, BridgeError> {
        let creature = self.table.get(key)?;
        let actual = creature.species();
        if !actual.is_a(via) {
            return Err(BridgeError::TypeMismatch {
                symbol,
                expected: via.name(),
                actual: actual.name(),
            });
        }
        Ok(&**creature)
    }

    fn cat(&self, key: HandleKey, symbol: &'static str) -> Result<&Cat, BridgeError> {
        let creature = self.resolve(key, Species::Cat, symbol)?;
        creature
            .as_any()
            .downcast_ref::<Cat>()
            .ok_or(BridgeError::TypeMismatch {
                symbol,
                expected: Species::Cat.name(),
                actual: creature.species().name(),
            })
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if !self.table.is_empty() {
            log::warn!(
                "bridge dropped with {} live handle(s); destroying them",
                self.table.len()
            );
        }
    }
}

fn eat_symbol(via: Species) -> &'static str {
    match via {
        Species::Animal => "Animal_eat",
        Species::Cat => "Cat_eat",
    }
}

fn destructor_symbol(via: Species) -> &'static str {
    match via {
        Species::Animal => "Animal_delete",
        Species::Cat => "Cat_delete",
    }
}
