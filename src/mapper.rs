//! Cover selection: walk back from the primary outputs over best cuts and
//! count the LUTs.
//!
//! The mapper owns its own implementation table, independent from the
//! engine's running one: the engine's marks are a greedy estimate made
//! during enumeration, the mapper's marks are the final cover.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;

use log::debug;

use crate::aig::{Aig, Literal};
use crate::engine::CutEngine;
use crate::error::{Result, TmapError};

/// FPGA technology mapper over a [`CutEngine`].
///
/// Holds the engine mutably: selecting the cover may require cut sets the
/// engine has not computed yet, in which case the mapper calls back into
/// it. Engine and mapper therefore cannot run from separate tasks.
pub struct TechMapper<'e, 'a> {
    engine: &'e mut CutEngine<'a>,
    implementation: HashMap<Literal, bool>,
    area: u32,
    depth: u32,
    power: u32,
}

impl<'e, 'a> TechMapper<'e, 'a> {
    pub fn new(engine: &'e mut CutEngine<'a>) -> Self {
        let aig = engine.aig();
        let first = aig.num_inputs() + aig.num_latches() + 1;
        let mut implementation = HashMap::with_capacity(aig.num_ands() as usize);
        for index in first..first + aig.num_ands() {
            implementation.insert(Aig::literal_from_index(index), false);
        }
        TechMapper {
            engine,
            implementation,
            area: 0,
            depth: 0,
            power: 0,
        }
    }

    /// LUT count of the cover (plus one per input- or constant-driven
    /// output).
    pub fn area(&self) -> u32 {
        self.area
    }

    /// Levels of the cover, counting the primary inputs as level 1.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Always 0: the slot is reserved in the data model but no power cost
    /// is defined.
    pub fn power(&self) -> u32 {
        self.power
    }

    /// The final cover: one entry per and-node, `true` if a LUT realizes
    /// its best cut.
    pub fn implementation(&self) -> &HashMap<Literal, bool> {
        &self.implementation
    }

    pub fn is_implemented(&self, and_literal: Literal) -> Result<bool> {
        if !self.engine.aig().is_and(and_literal) {
            return Err(TmapError::NotAnAnd(and_literal));
        }
        Ok(self
            .implementation
            .get(&Aig::even(and_literal))
            .copied()
            .unwrap_or(false))
    }

    /// Runs FPGA technology mapping: for each output, mark the LUT of its
    /// best cut and expand over the and-leaves of chosen cuts until the
    /// frontier bottoms out on inputs and latches.
    ///
    /// Terminates because every and-node is marked at most once and the
    /// frontier only ever contains unmarked and-nodes.
    pub fn run(&mut self) -> Result<()> {
        let aig = self.engine.aig();

        for &output in aig.outputs() {
            if aig.is_and(output) {
                // The output literal may be inverted; the cover is keyed by
                // the even form.
                let even = Aig::even(output);
                if self.implementation.get(&even).copied().unwrap_or(false) {
                    continue;
                }

                self.engine.find_cuts(output)?;
                self.implementation.insert(even, true);
                self.area += 1;

                let best = self.engine.best_cut(even)?;
                let depth = best.depth_cost().ok_or(TmapError::CostNotSet)? + 1;
                self.depth = self.depth.max(depth);

                let mut frontier: BTreeSet<Literal> = best
                    .leaves()
                    .iter()
                    .map(|&leaf| Aig::literal_from_index(leaf))
                    .filter(|&lit| aig.is_and(lit))
                    .collect();

                while !frontier.is_empty() {
                    let mut next = BTreeSet::new();
                    for &m in &frontier {
                        if self.implementation.get(&m).copied().unwrap_or(false) {
                            continue;
                        }
                        self.implementation.insert(m, true);
                        self.area += 1;
                        for &leaf in self.engine.best_cut(m)?.leaves() {
                            let lit = Aig::literal_from_index(leaf);
                            if aig.is_and(lit) {
                                next.insert(lit);
                            }
                        }
                    }
                    frontier = next;
                }
            } else if aig.is_input(output) || output < 2 {
                // An output wired straight to an input, GND or VDD still
                // occupies a LUT.
                self.area += 1;
                self.depth = self.depth.max(1);
            }
        }

        debug!(
            "mapping done for {}: {} luts, {} levels",
            aig.source(),
            self.area,
            self.depth
        );
        Ok(())
    }

    /// Mapping summary: LUT count and levels.
    pub fn write_results<W: Write>(&self, w: &mut W) -> Result<()> {
        writeln!(w, ">> Technology Mapping results")?;
        writeln!(w, "# LUT count: {}", self.area)?;
        writeln!(w, "# Levels: {}", self.depth)?;
        Ok(())
    }

    /// The cover, one line per and-node in ascending literal order.
    pub fn write_implementation<W: Write>(&self, w: &mut W) -> Result<()> {
        let aig = self.engine.aig();
        writeln!(w, ">> Implementation details:")?;
        for slot in 0..aig.num_ands() {
            let literal = aig.first_and_literal() + 2 * slot;
            if self.implementation.get(&literal).copied().unwrap_or(false) {
                writeln!(w, "({}) => {}", literal, self.engine.best_cut(literal)?)?;
            } else {
                writeln!(w, "({}) => not implemented", literal)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::MappingGoal;
    use std::collections::HashSet;
    use std::io::BufReader;

    fn parse(text: &str) -> Aig {
        Aig::from_reader(BufReader::new(text.as_bytes()), "<test>").unwrap()
    }

    fn map(aig: &Aig, goal: MappingGoal, k: u32, c: u32) -> (u32, u32, Vec<Literal>) {
        let mut engine = CutEngine::new(aig, goal, k, c).unwrap();
        let mut mapper = TechMapper::new(&mut engine);
        mapper.run().unwrap();
        let mut cover: Vec<Literal> = mapper
            .implementation()
            .iter()
            .filter(|(_, &implemented)| implemented)
            .map(|(&lit, _)| lit)
            .collect();
        cover.sort_unstable();
        (mapper.area(), mapper.depth(), cover)
    }

    #[test]
    fn single_and_test() {
        // One gate, one LUT, levels count the input level.
        let aig = parse("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        let (area, depth, cover) = map(&aig, MappingGoal::MinimizeArea, 2, 0);
        assert_eq!(area, 1);
        assert_eq!(depth, 2);
        assert_eq!(cover, vec![6]);
    }

    #[test]
    fn chain_k2_test() {
        // 8 = 2 & 4, 10 = 8 & 6: two LUTs chained with K = 2.
        let aig = parse("aag 5 3 0 1 2\n2\n4\n6\n10\n8 2 4\n10 8 6\n");
        let (area, depth, cover) = map(&aig, MappingGoal::MinimizeArea, 2, 0);
        assert_eq!(area, 2);
        assert_eq!(depth, 3);
        assert_eq!(cover, vec![8, 10]);
    }

    #[test]
    fn chain_k3_test() {
        // Same chain fused into a single 3-input LUT.
        let aig = parse("aag 5 3 0 1 2\n2\n4\n6\n10\n8 2 4\n10 8 6\n");
        let (area, depth, cover) = map(&aig, MappingGoal::MinimizeArea, 3, 0);
        assert_eq!(area, 1);
        assert_eq!(depth, 2);
        assert_eq!(cover, vec![10]);

        let mut engine = CutEngine::new(&aig, MappingGoal::MinimizeArea, 3, 0).unwrap();
        let mut mapper = TechMapper::new(&mut engine);
        mapper.run().unwrap();
        let leaves: Vec<u32> = engine.best_cut(10).unwrap().leaves().iter().copied().collect();
        assert_eq!(leaves, vec![1, 2, 3]);
    }

    #[test]
    fn fanout_reuse_test() {
        // 8 feeds both outputs; the mapping must stay within 3 LUTs and the
        // covers of both outputs must agree with the implementation table.
        let aig = parse("aag 6 3 0 2 3\n2\n4\n6\n10\n12\n8 4 2\n10 8 6\n12 8 2\n");
        let (area, _, cover) = map(&aig, MappingGoal::MinimizeArea, 3, 0);
        assert!(area <= 3);
        assert!(cover.contains(&10) && cover.contains(&12));
    }

    #[test]
    fn coverage_is_closed_test() {
        // Every marked LUT's and-leaves are themselves marked, and every
        // and-driven output is marked.
        let aig = parse("aag 6 3 0 2 3\n2\n4\n6\n10\n12\n8 4 2\n10 8 6\n12 8 2\n");
        for k in [2, 3] {
            let mut engine = CutEngine::new(&aig, MappingGoal::MinimizeArea, k, 0).unwrap();
            let mut mapper = TechMapper::new(&mut engine);
            mapper.run().unwrap();
            let marked: HashSet<Literal> = mapper
                .implementation()
                .iter()
                .filter(|(_, &implemented)| implemented)
                .map(|(&lit, _)| lit)
                .collect();

            for &output in aig.outputs() {
                if aig.is_and(output) {
                    assert!(marked.contains(&Aig::even(output)));
                }
            }
            for &lit in &marked {
                for &leaf in engine.best_cut(lit).unwrap().leaves() {
                    let leaf_lit = Aig::literal_from_index(leaf);
                    if aig.is_and(leaf_lit) {
                        assert!(marked.contains(&leaf_lit));
                    }
                }
            }
        }
    }

    #[test]
    fn area_law_test() {
        // Reported area is the number of marked and-nodes plus one per
        // input- or constant-driven output.
        let aig = parse("aag 3 2 0 3 1\n2\n4\n6\n2\n0\n6 4 2\n");
        let mut engine = CutEngine::new(&aig, MappingGoal::MinimizeArea, 2, 0).unwrap();
        let mut mapper = TechMapper::new(&mut engine);
        mapper.run().unwrap();

        let marked = mapper
            .implementation()
            .values()
            .filter(|&&implemented| implemented)
            .count() as u32;
        assert_eq!(mapper.area(), marked + 2); // output 2 (input) + output 0
        assert_eq!(mapper.area(), 3);
        assert_eq!(mapper.depth(), 2);
        assert_eq!(mapper.power(), 0);
    }

    #[test]
    fn latch_output_is_skipped_test() {
        // A latch-driven output contributes neither a LUT nor a level.
        let aig = parse("aag 4 1 1 2 2\n2\n4 8\n4\n8\n6 2 2\n8 6 4\n");
        let mut engine = CutEngine::new(&aig, MappingGoal::MinimizeArea, 2, 0).unwrap();
        let mut mapper = TechMapper::new(&mut engine);
        mapper.run().unwrap();

        // Output 4 is the latch, output 8 the gate above it. The latch is a
        // free leaf, so the best cut of 8 is {input, latch} and the whole
        // cover is one LUT.
        assert!(mapper.is_implemented(8).unwrap());
        assert!(!mapper.is_implemented(6).unwrap());
        assert_eq!(mapper.area(), 1);
        assert_eq!(mapper.depth(), 2);
    }

    #[test]
    fn repeated_output_counts_once_test() {
        let aig = parse("aag 3 2 0 2 1\n2\n4\n6\n7\n6 4 2\n");
        let (area, _, cover) = map(&aig, MappingGoal::MinimizeArea, 2, 0);
        assert_eq!(area, 1);
        assert_eq!(cover, vec![6]);
    }

    #[test]
    fn goal_sensitivity_test() {
        // With one priority cut per node, gate 28 keeps either its re-use
        // cut (free but deep, through the implemented gate 22) or its
        // shallow cut (one fresh LUT for gate 24): the area goal keeps the
        // former, the delay goal the latter, and the root inherits the
        // difference.
        let aig = parse(
            "aag 15 8 0 2 7\n2\n4\n6\n8\n10\n12\n14\n16\n26\n30\n\
             18 2 4\n20 6 8\n22 18 20\n24 10 12\n26 24 14\n28 22 24\n30 28 16\n",
        );

        let (area_area, area_depth, _) = map(&aig, MappingGoal::MinimizeArea, 3, 1);
        let (delay_area, delay_depth, _) = map(&aig, MappingGoal::MinimizeDelay, 3, 1);

        assert!(delay_depth <= area_depth);
        assert!(area_area <= delay_area);
        // And the tradeoff is real on this network.
        assert_eq!((area_area, area_depth), (6, 5));
        assert_eq!((delay_area, delay_depth), (6, 4));
    }

    #[test]
    fn reports_test() {
        let aig = parse("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n");
        let mut engine = CutEngine::new(&aig, MappingGoal::MinimizeArea, 2, 0).unwrap();
        let mut mapper = TechMapper::new(&mut engine);
        mapper.run().unwrap();

        let mut buf = Vec::new();
        mapper.write_results(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(">> Technology Mapping results"));
        assert!(text.contains("# LUT count: 1"));
        assert!(text.contains("# Levels: 2"));

        let mut buf = Vec::new();
        mapper.write_implementation(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("(6) => ( 2 4 ) : area = 0 : delay = 1 : power = 0"));
    }
}
