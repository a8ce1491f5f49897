//! The priority-cut enumeration engine.
//!
//! For every and-node reachable from a primary output, [`CutEngine`]
//! computes the set of K-feasible cuts by combining the child cut sets
//! (the Phi operation), scoring every union cut (the Diamond operation),
//! and keeping the best cuts under the active [`MappingGoal`].
//!
//! The traversal is strictly iterative with an explicit work stack: AIG
//! depth can reach tens of thousands of gates and must not be limited by
//! the native call stack.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;

use log::debug;

use crate::aig::{Aig, Literal};
use crate::cost;
use crate::cut::Cut;
use crate::cutset::CutSet;
use crate::error::{Result, TmapError};

/// What the mapping optimizes for. Anything that is not an explicit delay
/// request minimizes area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingGoal {
    #[default]
    MinimizeArea,
    MinimizeDelay,
}

/// Cut enumeration engine over a borrowed [`Aig`].
///
/// `cutsets` holds one best-first [`CutSet`] per and-node (empty means not
/// computed yet). `implemented` is the running greedy approximation of the
/// cover used by the area estimator: an and-gate gets marked as soon as a
/// zero-area best cut proves it comes for free, and may be un-marked again
/// when a later cut absorbs it (see [`CutEngine::find_cuts`]).
pub struct CutEngine<'a> {
    aig: &'a Aig,
    goal: MappingGoal,
    k: u32,
    c: u32,
    cutsets: Vec<CutSet>,
    implemented: HashMap<Literal, bool>,
}

impl<'a> CutEngine<'a> {
    /// `k` is the LUT input count (at least 2), `c` the number of priority
    /// cuts kept per node (0 keeps everything).
    pub fn new(aig: &'a Aig, goal: MappingGoal, k: u32, c: u32) -> Result<Self> {
        if k < 2 {
            return Err(TmapError::BadParameter(
                "value of parameter k (number of lut inputs) must be greater than 1".to_string(),
            ));
        }

        let first = aig.num_inputs() + aig.num_latches() + 1;
        let mut implemented = HashMap::with_capacity(aig.num_ands() as usize);
        for index in first..first + aig.num_ands() {
            implemented.insert(Aig::literal_from_index(index), false);
        }

        Ok(CutEngine {
            aig,
            goal,
            k,
            c,
            cutsets: vec![CutSet::new(); aig.num_ands() as usize],
            implemented,
        })
    }

    /// The borrowed AIG. The returned reference lives as long as the AIG
    /// itself, not as long as this borrow of the engine, so callers holding
    /// the engine mutably can still read the graph.
    pub fn aig(&self) -> &'a Aig {
        self.aig
    }

    pub fn goal(&self) -> MappingGoal {
        self.goal
    }

    /// Slot of an and-literal in the per-and vectors (polarity erased).
    fn slot(&self, and_literal: Literal) -> Result<usize> {
        if !self.aig.is_and(and_literal) {
            return Err(TmapError::NotAnAnd(and_literal));
        }
        let index = (Aig::index_from_literal(and_literal)
            - self.aig.num_inputs()
            - self.aig.num_latches()
            - 1) as usize;
        if index >= self.cutsets.len() {
            return Err(TmapError::OutOfRange(index));
        }
        Ok(index)
    }

    fn literal_from_slot(&self, slot: usize) -> Literal {
        Aig::literal_from_index(self.aig.num_inputs() + self.aig.num_latches() + 1 + slot as u32)
    }

    /// The (sorted, possibly pruned) cut set of an and-node. Empty iff the
    /// node has not been processed yet.
    pub fn cut_set(&self, and_literal: Literal) -> Result<&CutSet> {
        let slot = self.slot(and_literal)?;
        Ok(&self.cutsets[slot])
    }

    pub fn has_best_cut(&self, and_literal: Literal) -> Result<bool> {
        Ok(!self.cut_set(and_literal)?.is_empty())
    }

    /// Element 0 of the sorted cut set.
    pub fn best_cut(&self, and_literal: Literal) -> Result<&Cut> {
        self.cut_set(and_literal)?
            .first()
            .ok_or(TmapError::NotComputed(and_literal))
    }

    /// Whether the engine's running cover already accounts for the node.
    pub fn is_implemented(&self, and_literal: Literal) -> Result<bool> {
        if !self.aig.is_and(and_literal) {
            return Err(TmapError::NotAnAnd(and_literal));
        }
        Ok(self
            .implemented
            .get(&Aig::even(and_literal))
            .copied()
            .unwrap_or(false))
    }

    /// Auto-cut of a node: the node alone as its own leaf. Inputs and
    /// latches are free leaves; an and-gate is scored from its best cut,
    /// which must exist already.
    fn auto_cut(&self, literal: Literal) -> Result<Cut> {
        if self.aig.is_and(literal) {
            let best = self.best_cut(literal)?;
            cost::and_auto_cut(Aig::index_from_literal(literal), best)
        } else if self.aig.is_input(literal) || self.aig.is_latch(literal) {
            Ok(cost::leaf_auto_cut(Aig::index_from_literal(literal)))
        } else {
            Err(TmapError::Internal(format!(
                "literal {} is neither an input, a latch nor an and-gate",
                literal
            )))
        }
    }

    /// The Phi operation: build both child cut sets (empty for leaves, the
    /// already-computed set for and-gates), append each child's auto-cut,
    /// and hand them to Diamond.
    fn phi(&self, and_literal: Literal) -> Result<CutSet> {
        let aig = self.aig;
        let slot = self.slot(and_literal)?;
        if !self.cutsets[slot].is_empty() {
            return Ok(self.cutsets[slot].clone());
        }

        let (c0, c1) = aig.and_children(and_literal)?;
        if (aig.is_and(c0) && self.cut_set(c0)?.is_empty())
            || (aig.is_and(c1) && self.cut_set(c1)?.is_empty())
        {
            return Err(TmapError::Internal(format!(
                "a child of and-node {} is an and-gate with no cut set defined",
                and_literal
            )));
        }

        let mut first = if aig.is_and(c0) {
            self.cut_set(c0)?.clone()
        } else {
            CutSet::new()
        };
        let mut second = if aig.is_and(c1) {
            self.cut_set(c1)?.clone()
        } else {
            CutSet::new()
        };
        first.emplace(self.auto_cut(c0)?);
        second.emplace(self.auto_cut(c1)?);

        self.diamond(&first, &second)
    }

    /// The Diamond operation: all pairwise unions of the two cut sets,
    /// discarding those with more than K leaves. Equivalent cuts found
    /// along different pairs collapse in `emplace` and the first insertion
    /// keeps its costs: the sort that follows is the single source of
    /// truth for ordering.
    fn diamond(&self, first: &CutSet, second: &CutSet) -> Result<CutSet> {
        let mut diamond = CutSet::new();

        for cut_a in first {
            for cut_b in second {
                let union = cut_a.union(cut_b)?;
                if union.num_leaves() > self.k {
                    continue;
                }
                if !cut_a.all_costs_set() || !cut_b.all_costs_set() {
                    return Err(TmapError::CostNotSet);
                }

                let area = cost::union_area(self.aig, &self.implemented, &union);
                let depth = cost::union_depth(cut_a, cut_b)?;

                let (slot, inserted) = diamond.emplace(union);
                if inserted {
                    slot.set_area_cost(area)?;
                    slot.set_depth_cost(depth)?;
                    slot.set_power_cost(0)?;
                }
            }
        }

        Ok(diamond)
    }

    /// Proactive implementation marking. A freshly-stored best cut of area
    /// zero means every and-leaf of the cut is already covered, so the node
    /// itself comes for free: mark it. A child whose own best-cut leaves
    /// are a subset of the chosen leaves had been marked preliminarily, but
    /// its LUT is absorbed upward, so the mark is revoked.
    fn mark_if_fully_covered(
        &mut self,
        and_literal: Literal,
        c0: Literal,
        c1: Literal,
    ) -> Result<()> {
        let best = self.best_cut(and_literal)?;
        if best.area_cost() != Some(0) {
            return Ok(());
        }
        let chosen = best.leaves().clone();

        self.implemented.insert(Aig::even(and_literal), true);
        for child in [c0, c1] {
            if self.aig.is_and(child) {
                let absorbed = self.best_cut(child)?.leaves().is_subset(&chosen);
                if absorbed {
                    self.implemented.insert(Aig::even(child), false);
                }
            }
        }
        Ok(())
    }

    /// Finds the K-feasible cuts of an and-node, computing every dependency
    /// on demand. Idempotent: an already-computed node returns its cut set
    /// as-is.
    pub fn find_cuts(&mut self, and_literal: Literal) -> Result<&CutSet> {
        let aig = self.aig;
        let root = self.slot(and_literal)?;
        if !self.cutsets[root].is_empty() {
            return Ok(&self.cutsets[root]);
        }

        // Explicit work stack: children get processed before their parent,
        // and call depth stays O(1) no matter how deep the AIG is.
        let mut stack = vec![and_literal];
        while let Some(&current) = stack.last() {
            let (c0, c1) = aig.and_children(current)?;

            if aig.is_and(c0) && self.cutsets[self.slot(c0)?].is_empty() {
                stack.push(c0);
                continue;
            }
            if aig.is_and(c1) && self.cutsets[self.slot(c1)?].is_empty() {
                stack.push(c1);
                continue;
            }

            // Both children are leaves or have their cut sets defined:
            // Phi applies.
            let raw = self.phi(current)?;
            let sorted = if self.c > 0 {
                Self::sort_and_choose_best_cuts(&raw, self.c, self.goal)
            } else {
                Self::sort_cut_set(&raw, self.goal)
            };
            let slot = self.slot(current)?;
            self.cutsets[slot] = sorted;

            self.mark_if_fully_covered(current, c0, c1)?;
            stack.pop();
        }

        if self.cutsets[root].is_empty() {
            return Err(TmapError::Internal(format!(
                "cut set of and-node {} remains undefined after processing",
                and_literal
            )));
        }
        Ok(&self.cutsets[root])
    }

    /// Find cuts for every primary-output-reachable and-node. Outputs that
    /// are constants, inputs or latches bypass cut enumeration.
    pub fn run(&mut self) -> Result<()> {
        let aig = self.aig;
        for &output in aig.outputs() {
            if aig.is_and(output) {
                self.find_cuts(output)?;
            }
        }
        debug!(
            "cut enumeration done for {} ({} and-nodes)",
            aig.source(),
            aig.num_ands()
        );
        Ok(())
    }

    /// Sort a cut set best-first under the goal's comparator, returning a
    /// new cut set.
    pub fn sort_cut_set(cut_set: &CutSet, goal: MappingGoal) -> CutSet {
        let mut sorted = cut_set.clone();
        match goal {
            MappingGoal::MinimizeDelay => sorted.sort_by(cost::depth_order),
            MappingGoal::MinimizeArea => sorted.sort_by(cost::area_order),
        }
        sorted
    }

    /// Sort a cut set best-first and keep only the `c` best cuts.
    pub fn sort_and_choose_best_cuts(cut_set: &CutSet, c: u32, goal: MappingGoal) -> CutSet {
        let mut best = Self::sort_cut_set(cut_set, goal);
        best.truncate(c as usize);
        best
    }

    /// Best cuts of every and-driven output, one block per output.
    pub fn write_outputs_best_cuts<W: Write>(&self, w: &mut W) -> Result<()> {
        for &output in self.aig.outputs() {
            if self.aig.is_and(output) {
                writeln!(w)?;
                writeln!(w, "Output {}:", output)?;
                writeln!(w, "------------------------")?;
                let cut_set = self.cut_set(output)?;
                if cut_set.is_empty() {
                    writeln!(w, "No cut set defined.")?;
                } else {
                    for cut in cut_set {
                        writeln!(w, "{}", cut)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// The engine's running implementation table, one line per and-node in
    /// ascending literal order.
    pub fn write_implementation<W: Write>(&self, w: &mut W) -> Result<()> {
        writeln!(w, ">> Implementation details:")?;
        for slot in 0..self.cutsets.len() {
            let literal = self.literal_from_slot(slot);
            if self.implemented.get(&literal).copied().unwrap_or(false) {
                writeln!(w, "({}) => {}", literal, self.best_cut(literal)?)?;
            } else {
                writeln!(w, "({}) => not implemented", literal)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for CutEngine<'_> {
    /// Full dump of every cut set the engine holds.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            ">> Current state of the CutEngine for {}",
            self.aig.source()
        )?;
        for (slot, cut_set) in self.cutsets.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "Node {}:", self.literal_from_slot(slot))?;
            writeln!(f, "------------------------")?;
            if cut_set.is_empty() {
                writeln!(f, "No cut set defined.")?;
            } else {
                for cut in cut_set {
                    writeln!(f, "{}", cut)?;
                }
            }
        }
        Ok(())
    }
}
