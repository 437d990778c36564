//! Process-unique bus identifiers.

use std::fmt;
use std::sync::LazyLock;

use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifiers of every bus that is currently alive.
static LIVE_BUS_IDS: LazyLock<DashSet<BusId>> = LazyLock::new(DashSet::new);

/// Identifier of one bus, unique among the live buses of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusId(Uuid);

impl BusId {
    /// Draw identifiers until one is not held by a live bus, and claim it.
    pub(crate) fn allocate() -> Self {
        loop {
            let candidate = Self(Uuid::new_v4());
            if LIVE_BUS_IDS.insert(candidate) {
                return candidate;
            }
        }
    }

    /// Return the identifier to the pool once its bus is gone.
    pub(crate) fn release(self) {
        LIVE_BUS_IDS.remove(&self);
    }

    /// Whether a live bus currently holds this identifier.
    #[must_use]
    pub fn is_live(self) -> bool {
        LIVE_BUS_IDS.contains(&self)
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_registers_id() {
        let id = BusId::allocate();
        assert!(id.is_live());
        id.release();
        assert!(!id.is_live());
    }

    #[test]
    fn test_allocated_ids_are_distinct() {
        let ids: Vec<_> = (0..64).map(|_| BusId::allocate()).collect();
        let unique: std::collections::HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        for id in ids {
            id.release();
        }
    }
}
