//! FPGA technology mapping of and-inverter graphs onto K-input lookup
//! tables.
//!
//! The input is an AIG in the AIGER format (ASCII `aag` or binary `aig`).
//! The [`CutEngine`] enumerates K-feasible priority cuts for every and-node
//! reachable from a primary output, and the [`TechMapper`] walks back from
//! the outputs selecting best cuts to form the mapped cover, reporting area
//! (LUT count) and depth (levels).
//!
//! ```no_run
//! use tmap::{Aig, CutEngine, MappingGoal, TechMapper};
//!
//! fn main() -> tmap::Result<()> {
//!     let aig = Aig::from_file("design.aag")?;
//!     let mut engine = CutEngine::new(&aig, MappingGoal::MinimizeArea, 6, 8)?;
//!     let mut mapper = TechMapper::new(&mut engine);
//!     mapper.run()?;
//!     println!("{} luts, {} levels", mapper.area(), mapper.depth());
//!     Ok(())
//! }
//! ```

pub mod aig;
pub mod cost;
pub mod cut;
pub mod cutset;
pub mod engine;
pub mod error;
pub mod mapper;

pub use aig::{Aig, AigNode, Literal, Var};
pub use cut::Cut;
pub use cutset::CutSet;
pub use engine::{CutEngine, MappingGoal};
pub use error::{ParserError, Result, TmapError};
pub use mapper::TechMapper;
