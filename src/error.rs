//! Error types for the whole crate.
//!
//! [`TmapError`] covers the mapping core, [`ParserError`] covers reading
//! AIGER files. The latter is forwarded into the former so everything can
//! be propagated with `?` up to the CLI boundary.

use thiserror::Error;

use crate::aig::Literal;

/// The result of a mapping operation.
pub type Result<T> = std::result::Result<T, TmapError>;

/// Error returned when a mapping operation failed.
#[derive(Debug, Error)]
pub enum TmapError {
    /// A constructor or setter was given a value it cannot accept.
    #[error("bad parameter: {0}")]
    BadParameter(String),

    /// A literal was passed where an and-node literal was required.
    #[error("literal {0} is not an and-node of the AIG")]
    NotAnAnd(Literal),

    /// The best cut of a node was requested before its cut set was computed.
    #[error("no cut set has been computed for and-node {0}")]
    NotComputed(Literal),

    /// Cost arithmetic was attempted on a cut whose costs are not all set.
    #[error("cut cost is not set - costs must be defined for area, delay and power")]
    CostNotSet,

    /// An index fell outside an internal vector. This is a programmer error.
    #[error("index {0} is out of range")]
    OutOfRange(usize),

    /// The engine has reached an invalid state. This should never happen:
    /// if this error is raised, the traversal logic is garbage.
    #[error("internal invariant violated - this should not happen - {0}")]
    Internal(String),

    /// Just forwarding a [`ParserError`].
    #[error("{0}")]
    Parser(#[from] ParserError),

    /// Just forwarding an IO error from the report writers.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned when reading an AIGER file failed.
#[derive(Debug, Error)]
pub enum ParserError {
    /// The file could not be opened or read at all.
    #[error("unable to open '{path}': {detail}")]
    Io { path: String, detail: String },

    /// The file content is invalid at a known line.
    #[error("in '{file}' at line {line}: {detail}")]
    Invalid { file: String, line: u32, detail: String },

    /// The file content is invalid somewhere we cannot attach a line number
    /// to (the binary and-section, or a whole-file consistency check).
    #[error("in '{file}': {detail}")]
    Corrupt { file: String, detail: String },
}
