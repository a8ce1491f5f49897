//! Define [`Cut`], the value type at the heart of the mapper.
//!
//! A cut is a set of leaf variables (polarity is erased) plus three cost
//! scores. Two cuts are equal iff their leaf sets are equal: the costs are
//! derived scores, not identity.
//!
//! Costs are optional. A freshly-unioned cut has no costs until the engine
//! scores it, and asking cost arithmetic to run on an unset operand is the
//! [`CostNotSet`] error.
//!
//! [`CostNotSet`]: crate::error::TmapError::CostNotSet

use std::collections::BTreeSet;
use std::fmt;

use crate::aig::{Aig, Var};
use crate::error::{Result, TmapError};

/// A cut: a set of leaf variables and its (area, delay, power) scores.
///
/// ```rust
/// use tmap::Cut;
/// let a = Cut::with_costs([1, 2], 0, 1, 0);
/// let b = Cut::with_costs([2, 3], 0, 1, 0);
/// let u = a.union(&b).unwrap();
/// assert_eq!(u.leaves().iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
/// assert!(!u.all_costs_set()); // scoring a union is the engine's job
/// ```
#[derive(Debug, Clone, Default, Eq)]
pub struct Cut {
    leaves: BTreeSet<Var>,
    area: Option<u32>,
    depth: Option<u32>,
    power: Option<u32>,
}

impl PartialEq for Cut {
    /// Leaf sets only - costs do not take part in cut identity.
    fn eq(&self, other: &Self) -> bool {
        self.leaves == other.leaves
    }
}

impl Cut {
    /// A cut with the given leaves and no costs.
    pub fn new(leaves: impl IntoIterator<Item = Var>) -> Self {
        Cut {
            leaves: leaves.into_iter().collect(),
            area: None,
            depth: None,
            power: None,
        }
    }

    /// A cut with the given leaves and all three costs set.
    pub fn with_costs(
        leaves: impl IntoIterator<Item = Var>,
        area: u32,
        depth: u32,
        power: u32,
    ) -> Self {
        Cut {
            leaves: leaves.into_iter().collect(),
            area: Some(area),
            depth: Some(depth),
            power: Some(power),
        }
    }

    /// Read-only view of the leaf variable set.
    pub fn leaves(&self) -> &BTreeSet<Var> {
        &self.leaves
    }

    pub fn num_leaves(&self) -> u32 {
        self.leaves.len() as u32
    }

    /// True for the defaulted sentinel cut with no leaves.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn area_cost(&self) -> Option<u32> {
        self.area
    }

    pub fn depth_cost(&self) -> Option<u32> {
        self.depth
    }

    pub fn power_cost(&self) -> Option<u32> {
        self.power
    }

    /// Set the area cost. `u32::MAX` is refused: it is reserved to mean
    /// "unset" and [`Cut::unset_area_cost`] is the way to get back there.
    pub fn set_area_cost(&mut self, area: u32) -> Result<()> {
        if area == u32::MAX {
            return Err(TmapError::BadParameter(format!(
                "area cost must be in the range [0, {}]",
                u32::MAX - 1
            )));
        }
        self.area = Some(area);
        Ok(())
    }

    pub fn set_depth_cost(&mut self, depth: u32) -> Result<()> {
        if depth == u32::MAX {
            return Err(TmapError::BadParameter(format!(
                "delay cost must be in the range [0, {}]",
                u32::MAX - 1
            )));
        }
        self.depth = Some(depth);
        Ok(())
    }

    pub fn set_power_cost(&mut self, power: u32) -> Result<()> {
        if power == u32::MAX {
            return Err(TmapError::BadParameter(format!(
                "power cost must be in the range [0, {}]",
                u32::MAX - 1
            )));
        }
        self.power = Some(power);
        Ok(())
    }

    pub fn unset_area_cost(&mut self) {
        self.area = None;
    }

    pub fn unset_depth_cost(&mut self) {
        self.depth = None;
    }

    pub fn unset_power_cost(&mut self) {
        self.power = None;
    }

    pub fn all_costs_set(&self) -> bool {
        self.area.is_some() && self.depth.is_some() && self.power.is_some()
    }

    /// Union of two cuts: the merged leaf set, costs unset. The union of an
    /// empty cut is undefined.
    pub fn union(&self, other: &Cut) -> Result<Cut> {
        if self.leaves.is_empty() || other.leaves.is_empty() {
            return Err(TmapError::BadParameter(
                "the union of two cuts cannot be evaluated if either leaf set is empty"
                    .to_string(),
            ));
        }
        Ok(Cut::new(self.leaves.union(&other.leaves).copied()))
    }
}

fn fmt_cost(cost: Option<u32>) -> String {
    match cost {
        Some(c) => c.to_string(),
        None => "unset".to_string(),
    }
}

impl fmt::Display for Cut {
    /// Leaves are printed as even literals, the way the implementation maps
    /// key them.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( ")?;
        for &leaf in &self.leaves {
            write!(f, "{} ", Aig::literal_from_index(leaf))?;
        }
        write!(
            f,
            ") : area = {} : delay = {} : power = {}",
            fmt_cost(self.area),
            fmt_cost(self.depth),
            fmt_cost(self.power)
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn eq_ignores_costs_test() {
        let a = Cut::with_costs([1, 2], 0, 1, 0);
        let b = Cut::new([2, 1]);
        let c = Cut::new([1, 3]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn union_test() {
        let a = Cut::with_costs([1, 2], 0, 1, 0);
        let b = Cut::with_costs([2, 3], 1, 2, 0);

        let u = a.union(&b).unwrap();
        assert_eq!(u.leaves().iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(!u.all_costs_set());

        // Union is commutative on leaves.
        assert_eq!(u, b.union(&a).unwrap());

        // Union with oneself is just the leaf set.
        assert_eq!(a.union(&a).unwrap(), a);
    }

    #[test]
    fn union_empty_test() {
        let a = Cut::with_costs([1, 2], 0, 1, 0);
        let empty = Cut::default();
        assert!(a.union(&empty).is_err());
        assert!(empty.union(&a).is_err());
        assert!(empty.union(&empty).is_err());
    }

    #[test]
    fn cost_presence_test() {
        let mut cut = Cut::new([1]);
        assert!(!cut.all_costs_set());

        cut.set_area_cost(0).unwrap();
        cut.set_depth_cost(1).unwrap();
        assert!(!cut.all_costs_set());
        cut.set_power_cost(0).unwrap();
        assert!(cut.all_costs_set());

        cut.unset_depth_cost();
        assert!(!cut.all_costs_set());
        assert_eq!(cut.depth_cost(), None);
        assert_eq!(cut.area_cost(), Some(0));
    }

    #[test]
    fn set_cost_rejects_sentinel_test() {
        let mut cut = Cut::new([1]);
        assert!(cut.set_area_cost(u32::MAX).is_err());
        assert!(cut.set_depth_cost(u32::MAX).is_err());
        assert!(cut.set_power_cost(u32::MAX).is_err());
        // Anything below the sentinel is fine.
        assert!(cut.set_area_cost(u32::MAX - 1).is_ok());
    }

    #[test]
    fn display_test() {
        let cut = Cut::with_costs([1, 2], 0, 1, 0);
        assert_eq!(cut.to_string(), "( 2 4 ) : area = 0 : delay = 1 : power = 0");

        let unset = Cut::new([3]);
        assert_eq!(
            unset.to_string(),
            "( 6 ) : area = unset : delay = unset : power = unset"
        );
    }
}
