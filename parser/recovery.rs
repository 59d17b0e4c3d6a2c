use crate::allocator::Allocator;
use crate::result::ParseResult;

use super::callbacks::ParserCallbacks;
use super::core::REWIND_ALL;
use super::lec::LEC_BACKTRACK;
use super::input::InputCursor;
use super::state::Parser;

/// Whether the core step-loop's failure was fully recovered from, or
/// escalated to a fatal error the caller must surface.
pub(crate) enum RecoveryOutcome {
    Recovered,
    Fatal(crate::result::ParseError),
}

impl<'t, A: Allocator> Parser<'t, A> {
    /// The recovery dispatcher (spec.md §4.5): rewind a bounded window,
    /// try Local Error Correction, and fall back to panic-mode
    /// resynchronization if LEC can't find an acceptable edit.
    pub(crate) fn recover(&mut self, input: &mut InputCursor, cb: &mut dyn ParserCallbacks) -> RecoveryOutcome {
        let error_pos = input.pos;

        let leftover = self.rewind(input, LEC_BACKTRACK);
        if leftover >= 0 {
            // The active chunk ran out of journal before the backtrack
            // budget did — uncommit the previous chunk and keep
            // rewinding the remainder there (spec.md §4.5 step 2).
            self.backtrack_chunk();
            self.rewind(input, leftover);
        }
        let rewind_pos = input.pos;

        match self.drain(cb) {
            Ok(()) => {}
            Err(e) => return RecoveryOutcome::Fatal(e),
        }

        match self.local_error_correction(input, error_pos, rewind_pos, cb) {
            Ok(true) => return RecoveryOutcome::Recovered,
            Ok(false) => {}
            Err(e) => return RecoveryOutcome::Fatal(e),
        }

        self.rewind(input, REWIND_ALL);
        self.backtrack_chunk();
        self.rewind(input, REWIND_ALL);
        input.pos = rewind_pos;

        if let Err(e) = self.greedy_consume_to(input, error_pos) {
            return RecoveryOutcome::Fatal(e);
        }

        match self.panic_resync(input, cb) {
            Ok(()) => RecoveryOutcome::Recovered,
            Err(e) => RecoveryOutcome::Fatal(e),
        }
    }

    /// Re-parses forward from the cursor's current position up to
    /// `target` (spec.md §4.5 step 5's `greedy_consume`), bounding the
    /// replay to the original error point rather than the whole input.
    fn greedy_consume_to(&mut self, input: &mut InputCursor, target: usize) -> ParseResult<()> {
        let saved_end = input.end;
        input.end = target;
        let result = self.greedy_consume(input);
        input.end = saved_end;
        result
    }
}
