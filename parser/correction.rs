use crate::tables::Token;

/// A single-token edit considered by local error correction (spec.md §4.6).
///
/// `offset` is measured in tokens from the recovery window's start
/// (`input_rewind`). Represented as a sum type with per-variant payload
/// rather than the source's `{kind, offset, token}` struct, since `token`
/// is meaningless for `Remove`/`None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    None,
    Remove { offset: u8 },
    Insert { offset: u8, token: Token },
    Replace { offset: u8, token: Token },
}

impl Default for Correction {
    fn default() -> Self {
        Correction::None
    }
}

impl Correction {
    /// Weight contributed to a candidate's tie-break score (spec.md
    /// §4.6). Lower is better. Grounded on the generator's
    /// `data_lec_kind_score` table (`{none: 0, remove: 2, insert: 2,
    /// replace: 3}`); note this differs from the weights named in
    /// spec.md's prose (`remove=2, replace=2, insert=3`) — see
    /// DESIGN.md for why the table is followed here.
    pub(crate) fn kind_score(&self) -> i32 {
        match self {
            Correction::None => 0,
            Correction::Remove { .. } => 2,
            Correction::Insert { .. } => 2,
            Correction::Replace { .. } => 3,
        }
    }

    pub(crate) fn offset(&self) -> u8 {
        match self {
            Correction::None => 0,
            Correction::Remove { offset }
            | Correction::Insert { offset, .. }
            | Correction::Replace { offset, .. } => *offset,
        }
    }
}
