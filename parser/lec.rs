use crate::allocator::Allocator;
use crate::result::ParseResult;
use crate::tables::Token;

use super::callbacks::ParserCallbacks;
use super::core::{RunToEndExit, REWIND_ALL};
use super::correction::Correction;
use super::input::InputCursor;
use super::state::{InsertSource, Parser};

/// Bound on how far LEC rewinds past the error before giving up the
/// search window (spec.md §4.6).
pub(crate) const LEC_BACKTRACK: i64 = 8;
const LEC_LOOKAHEAD: usize = 6;
const LEC_ACCEPT_THRESHOLD: i32 = 2;
const MAX_DEPTH: u8 = 2;

/// Outcome of a bounded single-step trial parse.
enum SingleExit {
    /// Made at least one shift-consuming step.
    Shifted,
    /// The table had no entry for the current `(state, token)` pair.
    DispatchFail,
}

/// Candidate edit sequence found while searching the LEC window.
#[derive(Clone, Copy, Default)]
struct Candidate {
    advance: i64,
    cost: i32,
    first: Correction,
    second: Correction,
}

impl Candidate {
    fn is_better_than(&self, other: &Candidate) -> bool {
        self.advance > other.advance || (self.advance == other.advance && self.cost < other.cost)
    }
}

/// Search/recursion state threaded through [`lec_recursive`] (spec.md
/// §4.6). `level` is the generator's shared recursion-depth field:
/// each call captures it on entry (for indexing `edits`) before
/// incrementing it across the recursive step.
struct LecState {
    level: u8,
    edits: [Correction; MAX_DEPTH as usize],
    best: Candidate,
}

impl<'t, A: Allocator> Parser<'t, A> {
    /// Runs the step-loop for exactly one shift-consuming step (spec.md
    /// §4.6's `parse_lec_parse_single`), used both by the trial-parse
    /// probe and by single-edit admissibility checks.
    fn parse_single(&mut self, input: &mut InputCursor) -> SingleExit {
        loop {
            if self.chunks[self.active].rp >= self.config.chunk_size || self.sp >= self.stack_limit() {
                // Callers only invoke this within the bounded LEC window,
                // which is always well under a chunk; treat a full
                // buffer here the same as dispatch failure.
                return SingleExit::DispatchFail;
            }
            let state = self.stack[self.sp];
            let tok = input.peek();
            let (entry_id, entry) = match self.tables.entry_for(state, tok) {
                Some(e) => e,
                None => return SingleExit::DispatchFail,
            };

            let chunk = &mut self.chunks[self.active];
            chunk.rewind[chunk.rp] = (state, entry_id);
            chunk.rp += 1;

            input.advance(entry.shift as usize);
            self.stack[self.sp..self.sp + 4].copy_from_slice(&entry.data);
            self.sp = (self.sp as isize + entry.state_change as isize) as usize;

            if entry.megaaction != 0 {
                let chunk = &mut self.chunks[self.active];
                chunk.output[chunk.op] = entry.megaaction;
                chunk.op += 1;
            }

            if entry.shift != 0 {
                return SingleExit::Shifted;
            }
        }
    }

    /// Runs [`Self::parse_single`] until it either shifts or fails
    /// (spec.md §4.6's harness around `parse_single`, used to drive the
    /// trial parse forward one real step at a time while recording
    /// maximal advance).
    fn parse_single_loop(&mut self, input: &mut InputCursor) -> i64 {
        let mut advanced = 0i64;
        loop {
            match self.parse_single(input) {
                SingleExit::Shifted => advanced += 1,
                SingleExit::DispatchFail => return advanced,
            }
            if input.at_end() {
                return advanced;
            }
        }
    }

    /// Greedily parses as far as possible from the current position,
    /// reporting how far (in shift-consuming steps) it got before
    /// either failing or reaching `input.end`.
    fn try_parse(&mut self, input: &mut InputCursor) -> i64 {
        self.parse_single_loop(input)
    }

    /// Cost of treating the remaining window as entirely discarded —
    /// the fallback candidate recorded before any edit is found to beat
    /// it (a `remove` at every remaining offset).
    fn compute_skip_all_cost(&self, window_len: usize) -> i32 {
        (window_len as i32) * Correction::Remove { offset: 0 }.kind_score()
    }

    /// Recursive edit-window search (spec.md §4.6). `input_start` is
    /// fixed for the whole search (the window's `rewind` position);
    /// `cursor_pos`/`cursor_end` describe where the *current* recursion
    /// level should begin its trial parse from, already reflecting
    /// whatever edit was applied at the parent level.
    #[allow(clippy::too_many_arguments)]
    fn lec_recursive(
        &mut self,
        state: &mut LecState,
        input: &mut InputCursor,
        window_start: usize,
        window_end: usize,
        token_at: &dyn Fn(usize) -> Token,
    ) {
        let level = state.level;

        let checkpoint_rp = self.chunks[self.active].rp;
        let checkpoint_pos = input.pos;

        let advance = self.try_parse(input);
        let cost: i32 = state.edits[..level as usize].iter().map(|c| c.kind_score()).sum();
        let candidate = Candidate {
            advance,
            cost,
            first: if level >= 1 { state.edits[0] } else { Correction::None },
            second: if level >= 2 { state.edits[1] } else { Correction::None },
        };
        if candidate.is_better_than(&state.best) {
            state.best = candidate;
        }

        self.rewind(input, REWIND_ALL);
        self.chunks[self.active].rp = checkpoint_rp;
        input.pos = checkpoint_pos;

        if level >= MAX_DEPTH {
            return;
        }

        for offset in window_start..window_end {
            let cur_tok = token_at(offset);

            // remove(offset)
            {
                let edit = Correction::Remove { offset: offset as u8 };
                self.try_edit(state, input, window_end, token_at, edit, offset, true, 0);
            }
            // replace(offset, t) for t != cur_tok, shiftable
            for t in 0..self.tables.token_count as Token {
                if t == cur_tok {
                    continue;
                }
                if !self.can_shift(t) {
                    continue;
                }
                let edit = Correction::Replace { offset: offset as u8, token: t };
                self.try_edit(state, input, window_end, token_at, edit, offset, false, t);
            }
            // insert(offset, t) for t shiftable
            for t in 0..self.tables.token_count as Token {
                if !self.can_shift(t) {
                    continue;
                }
                let edit = Correction::Insert { offset: offset as u8, token: t };
                self.try_edit(state, input, window_end, token_at, edit, offset, false, t);
            }
        }
    }

    fn can_shift(&self, tok: Token) -> bool {
        let state = self.stack[self.sp];
        self.tables.entry_for(state, tok).is_some()
    }

    /// Parses real, journaled steps from the cursor's current position
    /// up to (not including) `target`, so an edit can be tested at an
    /// offset other than the cursor's current position. Returns `false`
    /// (and leaves the cursor wherever it got stuck) if the parser
    /// can't reach `target` without first failing.
    fn advance_to(&mut self, input: &mut InputCursor, target: usize) -> bool {
        let saved_end = input.end;
        input.end = target;
        let reached = matches!(self.run_to_end(input), RunToEndExit::Success) && input.pos == target;
        input.end = saved_end;
        reached
    }

    /// Applies one candidate edit at `offset`, checks single-step
    /// admissibility, and if admissible recurses one level deeper. Always
    /// restores the journal/position to the pre-edit checkpoint before
    /// returning, whether or not the edit was admissible.
    #[allow(clippy::too_many_arguments)]
    fn try_edit(
        &mut self,
        state: &mut LecState,
        input: &mut InputCursor,
        window_end: usize,
        token_at: &dyn Fn(usize) -> Token,
        edit: Correction,
        offset: usize,
        is_remove: bool,
        synth_token: Token,
    ) {
        let checkpoint_rp = self.chunks[self.active].rp;
        let checkpoint_pos = input.pos;

        if !self.advance_to(input, offset) {
            self.rewind(input, REWIND_ALL);
            self.chunks[self.active].rp = checkpoint_rp;
            input.pos = checkpoint_pos;
            return;
        }

        let admissible = if is_remove {
            // Skip one real token, then continue from the following one.
            input.advance(1);
            !input.at_end() || offset + 1 >= window_end
        } else {
            let saved_pos = input.pos;
            let saved_end = input.end;
            input.enter_synth(synth_token);
            let exit = self.parse_single(input);
            input.exit_synth();
            input.pos = saved_pos;
            input.end = saved_end;
            if matches!(edit, Correction::Replace { .. }) {
                input.pos = saved_pos + 1;
            }
            matches!(exit, SingleExit::Shifted)
        };

        if admissible {
            state.edits[state.level as usize] = edit;
            state.level += 1;
            self.lec_recursive(state, input, offset + 1, window_end, token_at);
            state.level -= 1;
            state.edits[state.level as usize] = Correction::None;
        }

        self.rewind(input, REWIND_ALL);
        self.chunks[self.active].rp = checkpoint_rp;
        input.pos = checkpoint_pos;
    }

    /// Applies the winning edit sequence for real: replays up to each
    /// edit's offset with [`Self::greedy_consume`], reports the edit via
    /// the matching observer callback, and for insert/replace redirects
    /// the cursor at the synthesized token for exactly one step.
    fn lec_apply_one(
        &mut self,
        input: &mut InputCursor,
        window_start: usize,
        edit: Correction,
        cb: &mut dyn ParserCallbacks,
    ) -> ParseResult<()> {
        let target = window_start + edit.offset() as usize;
        let saved_end = input.end;
        input.end = target;
        self.greedy_consume(input)?;
        input.end = saved_end;

        match edit {
            Correction::None => {}
            Correction::Remove { .. } => {
                cb.lec_remove();
                input.advance(1);
            }
            Correction::Insert { token, .. } => {
                cb.lec_insert(token);
                self.insert_terminals = InsertSource::Owned(token);
                self.insert_pos = 0;
                let old_pos = input.pos;
                input.enter_synth(token);
                let _ = self.parse_single(input);
                input.exit_synth();
                input.pos = old_pos;
            }
            Correction::Replace { token, .. } => {
                cb.lec_replace(token);
                self.insert_terminals = InsertSource::Owned(token);
                self.insert_pos = 0;
                let old_pos = input.pos;
                input.enter_synth(token);
                let _ = self.parse_single(input);
                input.exit_synth();
                input.pos = old_pos + 1;
            }
        }

        self.drain(cb)
    }

    fn lec_apply(
        &mut self,
        input: &mut InputCursor,
        window_start: usize,
        best: &Candidate,
        cb: &mut dyn ParserCallbacks,
    ) -> ParseResult<()> {
        if !matches!(best.first, Correction::None) {
            self.lec_apply_one(input, window_start, best.first, cb)?;
        }
        if !matches!(best.second, Correction::None) {
            self.lec_apply_one(input, window_start, best.second, cb)?;
        }
        Ok(())
    }

    /// Entry point for Local Error Correction (spec.md §4.6). `input` is
    /// the live cursor, already sitting wherever the dispatcher's
    /// backtrack left it; `error_pos` is where the core step-loop
    /// failed; `rewind_pos` is `input.pos` at entry. On success `input`
    /// is left past the applied edits; on failure it is restored to
    /// `rewind_pos` for the dispatcher to hand to panic mode. Returns
    /// `true` if an edit was applied.
    pub(crate) fn local_error_correction(
        &mut self,
        input: &mut InputCursor,
        error_pos: usize,
        rewind_pos: usize,
        cb: &mut dyn ParserCallbacks,
    ) -> ParseResult<bool> {
        let input_end = input.end;
        let backtrack = (error_pos - rewind_pos).min(LEC_BACKTRACK as usize);
        let lookahead = (input_end - error_pos).min(LEC_LOOKAHEAD);
        let window_start = rewind_pos.max(error_pos.saturating_sub(backtrack));
        let window_end = (error_pos + lookahead).min(input_end);

        let mut state = LecState {
            level: 0,
            edits: [Correction::None; MAX_DEPTH as usize],
            best: Candidate {
                advance: -1,
                cost: self.compute_skip_all_cost(window_end - window_start),
                first: Correction::None,
                second: Correction::None,
            },
        };

        let saved_pos = input.pos;
        let saved_end = input.end;
        input.pos = window_start;
        input.end = window_end;
        let tokens = input.tokens();
        let token_at = |pos: usize| tokens[pos];
        self.lec_recursive(&mut state, input, window_start, window_end, &token_at);
        input.pos = saved_pos;
        input.end = saved_end;

        if state.best.advance < LEC_ACCEPT_THRESHOLD as i64 {
            return Ok(false);
        }

        input.pos = window_start;
        let best = state.best;
        self.lec_apply(input, window_start, &best, cb)?;
        self.drain(cb)?;
        Ok(true)
    }
}
