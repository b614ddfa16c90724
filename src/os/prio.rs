//! Priority bitmap for O(1) highest-ready lookup
//!
//! With 32 levels the whole table is one word: bit 31 is priority 0, so the
//! highest ready priority is a single CLZ.

use crate::os::config::CFG_PRIO_MAX;
use crate::os::types::OsPrio;

const _: () = assert!(CFG_PRIO_MAX <= 32, "priority bitmap is a single word");

/// Priority bitmap table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrioTable {
    bitmap: u32,
}

impl PrioTable {
    pub const fn new() -> Self {
        PrioTable { bitmap: 0 }
    }

    #[inline(always)]
    const fn mask(prio: OsPrio) -> u32 {
        1 << (31 - prio as u32)
    }

    /// Mark `prio` as having at least one ready task
    #[inline]
    pub fn insert(&mut self, prio: OsPrio) {
        debug_assert!((prio as usize) < CFG_PRIO_MAX);
        self.bitmap |= Self::mask(prio);
    }

    /// Clear `prio`
    #[inline]
    pub fn remove(&mut self, prio: OsPrio) {
        debug_assert!((prio as usize) < CFG_PRIO_MAX);
        self.bitmap &= !Self::mask(prio);
    }

    /// Highest (numerically lowest) priority with a ready task, or the idle
    /// priority when the table is empty.
    #[inline]
    pub fn get_highest(&self) -> OsPrio {
        if self.bitmap == 0 {
            (CFG_PRIO_MAX - 1) as OsPrio
        } else {
            self.bitmap.leading_zeros() as OsPrio
        }
    }

    #[inline]
    pub fn is_set(&self, prio: OsPrio) -> bool {
        self.bitmap & Self::mask(prio) != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bitmap == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table() {
        let table = PrioTable::new();
        assert!(table.is_empty());
        assert_eq!(table.get_highest(), (CFG_PRIO_MAX - 1) as OsPrio);
    }

    #[test]
    fn test_insert_remove() {
        let mut table = PrioTable::new();

        table.insert(5);
        assert!(table.is_set(5));
        assert!(!table.is_set(4));
        assert_eq!(table.get_highest(), 5);

        table.insert(3);
        assert_eq!(table.get_highest(), 3);

        table.remove(3);
        assert_eq!(table.get_highest(), 5);

        table.remove(5);
        assert!(table.is_empty());
    }

    #[test]
    fn test_extremes() {
        let mut table = PrioTable::new();

        table.insert(31);
        assert_eq!(table.get_highest(), 31);

        table.insert(0);
        assert_eq!(table.get_highest(), 0);

        table.remove(0);
        assert_eq!(table.get_highest(), 31);
    }
}
