//! Fixed inventory of host-declared stub identities.
//!
//! Exclusive launch modes get `slots_per_mode` slots each; a slot is bound to
//! at most one real component. The reusable mode has two physical stubs
//! (opaque and translucent) that are never bound.

use crate::error::StubPoolError;
use bundlehost_api::{ComponentName, LaunchMode};
use std::sync::{Mutex, PoisonError};

/// One table of slots for a single exclusive launch mode.
struct SlotTable {
    mode: LaunchMode,
    slots: Mutex<Vec<Option<ComponentName>>>,
}

impl SlotTable {
    fn new(mode: LaunchMode, capacity: usize) -> Self {
        Self {
            mode,
            slots: Mutex::new(vec![None; capacity]),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Option<ComponentName>>> {
        // Slot state is a plain vector; a panicking holder cannot leave it torn.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pool of stub identities, grouped by launch mode.
pub struct StubPool {
    prefix: String,
    capacity: usize,
    tables: [SlotTable; 3],
}

impl StubPool {
    pub fn new(prefix: impl Into<String>, slots_per_mode: usize) -> Self {
        Self {
            prefix: prefix.into(),
            capacity: slots_per_mode,
            tables: LaunchMode::EXCLUSIVE.map(|mode| SlotTable::new(mode, slots_per_mode)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get a stub for `real`.
    ///
    /// Re-entry for an already bound component returns its existing stub.
    pub fn acquire(
        &self,
        real: &ComponentName,
        mode: LaunchMode,
        translucent: bool,
    ) -> Result<ComponentName, StubPoolError> {
        let Some(table) = self.table(mode) else {
            return Ok(self.reusable_stub(translucent));
        };

        let mut slots = table.lock();
        let mut free = None;
        for (index, slot) in slots.iter().enumerate() {
            match slot {
                Some(bound) if bound == real => return Ok(self.slot_identity(mode, index)),
                None if free.is_none() => free = Some(index),
                _ => {}
            }
        }

        match free {
            Some(index) => {
                slots[index] = Some(real.clone());
                tracing::debug!("Bound {} to stub slot {}:{}", real, mode, index);
                Ok(self.slot_identity(mode, index))
            }
            None => Err(StubPoolError::Exhausted {
                mode,
                capacity: self.capacity,
            }),
        }
    }

    /// Unbind `real`. Returns whether a binding existed.
    pub fn release(&self, real: &ComponentName, mode: LaunchMode) -> bool {
        let Some(table) = self.table(mode) else {
            return false;
        };

        let mut slots = table.lock();
        match slots.iter().position(|slot| slot.as_ref() == Some(real)) {
            Some(index) => {
                slots[index] = None;
                tracing::debug!("Released stub slot {}:{} from {}", mode, index, real);
                true
            }
            None => false,
        }
    }

    /// Snapshot of `(stub, real)` bindings for one mode.
    pub fn bound(&self, mode: LaunchMode) -> Vec<(ComponentName, ComponentName)> {
        let Some(table) = self.table(mode) else {
            return Vec::new();
        };
        table
            .lock()
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref()
                    .map(|real| (self.slot_identity(mode, index), real.clone()))
            })
            .collect()
    }

    /// Stub bound to `real`, if any.
    pub fn stub_for(&self, real: &ComponentName, mode: LaunchMode) -> Option<ComponentName> {
        let table = self.table(mode)?;
        let slots = table.lock();
        slots
            .iter()
            .position(|slot| slot.as_ref() == Some(real))
            .map(|index| self.slot_identity(mode, index))
    }

    /// Every stub identity the host must declare, with its launch mode.
    pub fn declared_stubs(&self) -> Vec<(ComponentName, LaunchMode)> {
        let mut stubs = vec![
            (self.reusable_stub(false), LaunchMode::Standard),
            (self.reusable_stub(true), LaunchMode::Standard),
        ];
        for mode in LaunchMode::EXCLUSIVE {
            for index in 0..self.capacity {
                stubs.push((self.slot_identity(mode, index), mode));
            }
        }
        stubs
    }

    fn table(&self, mode: LaunchMode) -> Option<&SlotTable> {
        self.tables.iter().find(|t| t.mode == mode)
    }

    fn reusable_stub(&self, translucent: bool) -> ComponentName {
        if translucent {
            ComponentName::new(format!("{}1", self.prefix))
        } else {
            ComponentName::new(&self.prefix)
        }
    }

    fn slot_identity(&self, mode: LaunchMode, index: usize) -> ComponentName {
        ComponentName::new(format!("{}{}{}", self.prefix, mode.code(), index))
    }
}
