//! The cost model: pure scoring functions for auto-cuts and union cuts,
//! and the two best-first comparators.
//!
//! Everything here is stateless - the dynamic part (which and-gates are
//! already implemented) is passed in by the engine.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::aig::{Aig, Literal, Var};
use crate::cut::Cut;
use crate::error::{Result, TmapError};

/// Unset costs sort last.
fn cost_key(cost: Option<u32>) -> u32 {
    cost.unwrap_or(u32::MAX)
}

/// Area-better ordering: area, then delay, then leaf count.
pub fn area_order(a: &Cut, b: &Cut) -> Ordering {
    cost_key(a.area_cost())
        .cmp(&cost_key(b.area_cost()))
        .then(cost_key(a.depth_cost()).cmp(&cost_key(b.depth_cost())))
        .then(a.num_leaves().cmp(&b.num_leaves()))
}

/// Delay-better ordering: delay, then area, then leaf count.
pub fn depth_order(a: &Cut, b: &Cut) -> Ordering {
    cost_key(a.depth_cost())
        .cmp(&cost_key(b.depth_cost()))
        .then(cost_key(a.area_cost()).cmp(&cost_key(b.area_cost())))
        .then(a.num_leaves().cmp(&b.num_leaves()))
}

/// Auto-cut of a leaf node (primary input, or latch treated as one): the
/// node alone, free in area, one level deep.
pub fn leaf_auto_cut(var: Var) -> Cut {
    Cut::with_costs([var], 0, 1, 0)
}

/// Auto-cut of an and-gate: the node alone, scored from its best cut -
/// same area (re-using the LUT that already realizes it), one level deeper.
pub fn and_auto_cut(var: Var, best: &Cut) -> Result<Cut> {
    let area = best.area_cost().ok_or(TmapError::CostNotSet)?;
    let depth = best.depth_cost().ok_or(TmapError::CostNotSet)?;
    Ok(Cut::with_costs([var], area, depth + 1, 0))
}

/// Delay of a union cut: the slower of the two cuts it merges.
pub fn union_depth(a: &Cut, b: &Cut) -> Result<u32> {
    let da = a.depth_cost().ok_or(TmapError::CostNotSet)?;
    let db = b.depth_cost().ok_or(TmapError::CostNotSet)?;
    Ok(da.max(db))
}

/// Area of a union cut: the number of and-gate leaves that are not covered
/// by a LUT yet. Primary inputs and latches contribute nothing, and an
/// and-gate already implemented downstream is free to re-use.
pub fn union_area(aig: &Aig, implemented: &HashMap<Literal, bool>, cut: &Cut) -> u32 {
    cut.leaves()
        .iter()
        .map(|&leaf| Aig::literal_from_index(leaf))
        .filter(|&lit| aig.is_and(lit) && !implemented.get(&lit).copied().unwrap_or(false))
        .count() as u32
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::BufReader;

    #[test]
    fn area_order_test() {
        let cheap = Cut::with_costs([1, 2], 0, 5, 0);
        let costly = Cut::with_costs([3], 2, 1, 0);
        assert_eq!(area_order(&cheap, &costly), Ordering::Less);
        assert_eq!(area_order(&costly, &cheap), Ordering::Greater);

        // Area tie: delay decides.
        let shallow = Cut::with_costs([1], 1, 1, 0);
        let deep = Cut::with_costs([2], 1, 4, 0);
        assert_eq!(area_order(&shallow, &deep), Ordering::Less);

        // Area and delay tie: fewer leaves win.
        let small = Cut::with_costs([1], 1, 1, 0);
        let big = Cut::with_costs([2, 3], 1, 1, 0);
        assert_eq!(area_order(&small, &big), Ordering::Less);
        assert_eq!(area_order(&small, &small), Ordering::Equal);
    }

    #[test]
    fn depth_order_test() {
        let shallow = Cut::with_costs([1, 2], 5, 1, 0);
        let deep = Cut::with_costs([3], 0, 3, 0);
        assert_eq!(depth_order(&shallow, &deep), Ordering::Less);

        // Delay tie: area decides.
        let cheap = Cut::with_costs([1], 0, 2, 0);
        let costly = Cut::with_costs([2], 3, 2, 0);
        assert_eq!(depth_order(&cheap, &costly), Ordering::Less);

        // Unset costs sort last.
        let unset = Cut::new([4]);
        assert_eq!(depth_order(&cheap, &unset), Ordering::Less);
    }

    #[test]
    fn auto_cut_identity_test() {
        // auto_cut(n).leaves == {index(n)}, always.
        let leaf = leaf_auto_cut(3);
        assert_eq!(leaf.leaves().iter().copied().collect::<Vec<_>>(), vec![3]);
        assert_eq!(leaf.area_cost(), Some(0));
        assert_eq!(leaf.depth_cost(), Some(1));
        assert_eq!(leaf.power_cost(), Some(0));

        let best = Cut::with_costs([1, 2], 2, 3, 0);
        let auto = and_auto_cut(4, &best).unwrap();
        assert_eq!(auto.leaves().iter().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(auto.area_cost(), Some(2));
        assert_eq!(auto.depth_cost(), Some(4));
    }

    #[test]
    fn auto_cut_requires_costs_test() {
        let unset = Cut::new([1, 2]);
        assert!(matches!(and_auto_cut(4, &unset), Err(TmapError::CostNotSet)));
    }

    #[test]
    fn union_depth_test() {
        let a = Cut::with_costs([1], 0, 2, 0);
        let b = Cut::with_costs([2], 0, 5, 0);
        assert_eq!(union_depth(&a, &b).unwrap(), 5);
        assert_eq!(union_depth(&b, &a).unwrap(), 5);

        let unset = Cut::new([3]);
        assert!(matches!(union_depth(&a, &unset), Err(TmapError::CostNotSet)));
    }

    #[test]
    fn union_area_test() {
        // 8 = 2 & 4, 10 = 8 & 6; leaves of {2, 4(=and 8)} mix kinds.
        let aig = Aig::from_reader(
            BufReader::new("aag 5 3 0 1 2\n2\n4\n6\n10\n8 4 2\n10 8 6\n".as_bytes()),
            "<test>",
        )
        .unwrap();

        let mut implemented: HashMap<Literal, bool> = HashMap::from([(8, false), (10, false)]);
        let cut = Cut::new([1, 4]); // input 2 and and-gate 8

        assert_eq!(union_area(&aig, &implemented, &cut), 1);
        implemented.insert(8, true);
        assert_eq!(union_area(&aig, &implemented, &cut), 0);

        // Inputs only: free.
        assert_eq!(union_area(&aig, &implemented, &Cut::new([1, 2, 3])), 0);
    }
}
