//! Runtime core for a generated lexer + LL parser: a DFA lexer driver,
//! a table-driven predictive parser with a reversible chunk-based
//! output buffer, and an error-recovery pipeline combining Local Error
//! Correction with panic-mode resynchronization.
//!
//! The generator that produces the tables consumed here, and any
//! particular grammar's semantic actions, are out of scope — see
//! `DESIGN.md` for how each piece is grounded.

pub mod allocator;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod result;
pub mod tables;
