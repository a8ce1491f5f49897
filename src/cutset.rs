//! Define [`CutSet`], the ordered container of distinct cuts of one node.
//!
//! A cut set is a vector minus the mutators that could break its invariant:
//! cuts are pairwise distinct (on leaves). Insertion goes through
//! [`CutSet::emplace`], which dedups; reordering goes through
//! [`CutSet::sort_by`] and pruning through [`CutSet::truncate`], both of
//! which preserve distinctness. After a sort, iteration order is
//! best-first.

use std::cmp::Ordering;

use crate::cut::Cut;

/// An ordered set of pairwise-distinct cuts. Empty means "not computed
/// yet" for the engine.
#[derive(Debug, Clone, Default)]
pub struct CutSet {
    cuts: Vec<Cut>,
}

impl CutSet {
    pub fn new() -> Self {
        CutSet::default()
    }

    /// Try to add a cut. If an equal cut (same leaves) is already in the
    /// set, it is left as-is and `false` is returned alongside it;
    /// otherwise the new cut is appended and `true` is returned.
    pub fn emplace(&mut self, cut: Cut) -> (&mut Cut, bool) {
        match self.cuts.iter().position(|c| *c == cut) {
            Some(pos) => (&mut self.cuts[pos], false),
            None => {
                self.cuts.push(cut);
                let last = self.cuts.len() - 1;
                (&mut self.cuts[last], true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cut> {
        self.cuts.get(index)
    }

    /// The best cut once the set is sorted, element 0.
    pub fn first(&self) -> Option<&Cut> {
        self.cuts.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cut> {
        self.cuts.iter()
    }

    /// Sort the set best-first under the given comparator. Sorting is a
    /// permutation, so distinctness is preserved.
    pub fn sort_by(&mut self, compare: impl FnMut(&Cut, &Cut) -> Ordering) {
        self.cuts.sort_by(compare);
    }

    /// Keep only the first `len` cuts.
    pub fn truncate(&mut self, len: usize) {
        self.cuts.truncate(len);
    }
}

impl<'a> IntoIterator for &'a CutSet {
    type Item = &'a Cut;
    type IntoIter = std::slice::Iter<'a, Cut>;

    fn into_iter(self) -> Self::IntoIter {
        self.cuts.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn emplace_dedup_test() {
        let mut set = CutSet::new();

        let (_, inserted) = set.emplace(Cut::with_costs([1, 2], 0, 1, 0));
        assert!(inserted);
        assert_eq!(set.len(), 1);

        // Same leaves, different costs: not inserted, existing cut kept.
        let (existing, inserted) = set.emplace(Cut::with_costs([1, 2], 5, 5, 0));
        assert!(!inserted);
        assert_eq!(existing.area_cost(), Some(0));
        assert_eq!(set.len(), 1);

        let (_, inserted) = set.emplace(Cut::new([1, 3]));
        assert!(inserted);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn emplace_returns_slot_test() {
        let mut set = CutSet::new();
        let (slot, inserted) = set.emplace(Cut::new([1]));
        assert!(inserted);
        slot.set_area_cost(3).unwrap();
        assert_eq!(set.first().unwrap().area_cost(), Some(3));
    }

    #[test]
    fn sort_and_truncate_test() {
        let mut set = CutSet::new();
        set.emplace(Cut::with_costs([1, 2, 3], 2, 1, 0));
        set.emplace(Cut::with_costs([1, 2], 1, 3, 0));
        set.emplace(Cut::with_costs([4], 0, 2, 0));

        set.sort_by(|a, b| a.area_cost().cmp(&b.area_cost()));
        let areas: Vec<_> = set.iter().map(|c| c.area_cost().unwrap()).collect();
        assert_eq!(areas, vec![0, 1, 2]);

        set.truncate(2);
        assert_eq!(set.len(), 2);
        assert_eq!(set.first().unwrap().area_cost(), Some(0));

        // Truncating past the end is a no-op.
        set.truncate(10);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn iteration_test() {
        let mut set = CutSet::new();
        set.emplace(Cut::new([1]));
        set.emplace(Cut::new([2]));
        let leaves: Vec<u32> = (&set).into_iter().flat_map(|c| c.leaves().iter().copied()).collect();
        assert_eq!(leaves, vec![1, 2]);
    }
}
