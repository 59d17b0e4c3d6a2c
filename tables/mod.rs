//! Generator-emitted table types shared by the lexer and parser drivers.
//!
//! Every table here borrows the caller's data (`&'t [..]`): tables are
//! produced once by a generator and outlive any single run of the
//! runtime, so there is no reason for this crate to own a copy of them.

mod lexer_tables;
mod parser_tables;
mod sync_tables;

pub use lexer_tables::LexerTables;
pub use parser_tables::{ParserTables, TableEntry};
pub use sync_tables::{SyncEntry, SyncTables};

/// Token id, as assigned by the generator's grammar.
pub type Token = u16;

/// Parser/lexer state id, as assigned by the generator.
pub type StateId = u16;

/// Sentinel dispatch byte meaning "no table entry for this (state, token) pair".
pub(crate) const NO_DISPATCH: u8 = 0xff;
