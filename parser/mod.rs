//! The LL parser driver: table-driven step-loop, reversible chunk
//! buffers, error recovery (LEC + panic resync), and the semantic-action
//! VM (spec.md §3.2, §4.2–§4.8).

mod callbacks;
mod core;
mod correction;
mod input;
mod lec;
mod panic;
mod recovery;
mod run;
mod state;

pub use callbacks::{ParserCallbacks, VmData};
pub use correction::Correction;
pub use state::{Parser, VmActionCodes};
