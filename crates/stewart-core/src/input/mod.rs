//! Operator input contract
//!
//! Device polling lives outside the core. The control loop only sees one
//! [`InputSnapshot`] per tick, pulled from an [`InputSource`].

mod snapshot;
mod source;

pub use snapshot::InputSnapshot;
pub use source::{InputSource, ScriptedInput};
