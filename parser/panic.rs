use crate::allocator::Allocator;
use crate::result::ParseResult;
use crate::tables::SyncEntry;

use super::callbacks::ParserCallbacks;
use super::input::InputCursor;
use super::state::{InsertSource, Parser};

/// `(input_pos, stack_pos, total_cost)` found by [`Parser::resync`].
struct Best {
    input_pos: usize,
    stack_pos: usize,
    cost: u32,
}

impl<'t, A: Allocator> Parser<'t, A> {
    /// Cost-minimizing search over `(input_pos, stack_pos)` pairs
    /// (spec.md §4.7). Returns `None` if no pair syncs (fatal).
    fn resync(&self, input: &InputCursor) -> Option<Best> {
        let mut best: Option<Best> = None;
        let mut token_discard_cost: u32 = 0;
        let mut input_pos = input.pos;

        loop {
            if let Some(b) = &best {
                if token_discard_cost >= b.cost {
                    // Every later input_pos only adds more discard cost;
                    // nothing reachable from here can beat the best found
                    // so far, so there's no point scanning further.
                    break;
                }
            }

            if input_pos == input.end {
                // The only terminal candidate is "pop everything down to
                // the sentinel" — recording one at every depth would
                // always pick stack_pos == self.sp (pop nothing), which
                // leaves a non-sentinel state on the stack at
                // end-of-input and sends the parser right back into
                // recovery on the next step.
                let mut stack_pos = self.sp;
                let mut state_pop_cost: u32 = 0;
                while stack_pos > 0 {
                    let st = self.stack[stack_pos];
                    state_pop_cost += self.sync.state_skip_cost[st as usize] as u32;
                    stack_pos -= 1;
                }
                let total = token_discard_cost + state_pop_cost;
                if best.as_ref().map_or(true, |b| total < b.cost) {
                    best = Some(Best { input_pos, stack_pos: 0, cost: total });
                }
                break;
            }

            let tok = input.token_at(input_pos);
            let sync_cost = self.sync.token_sync_cost[tok as usize] as u32;

            let mut stack_pos = self.sp;
            let mut state_pop_cost: u32 = 0;
            loop {
                if let Some(entry) = self.sync.entry_for(tok, self.stack[stack_pos]) {
                    let transition_cost = self.sync.action_list_cost(entry) as u32;
                    let total = token_discard_cost + sync_cost + state_pop_cost + transition_cost;
                    if best.as_ref().map_or(true, |b| total < b.cost) {
                        best = Some(Best { input_pos, stack_pos, cost: total });
                    }
                }
                if stack_pos == 0 {
                    break;
                }
                let st = self.stack[stack_pos];
                state_pop_cost += self.sync.state_skip_cost[st as usize] as u32;
                stack_pos -= 1;
            }

            token_discard_cost += self.sync.token_skip_cost[tok as usize] as u32;
            input_pos += 1;
        }

        best
    }

    /// Entry point for panic-mode resynchronization (spec.md §4.7).
    /// `input` must already sit at the error point with the failed
    /// chunk unwound. On success, leaves `input` and the parser stack at
    /// the chosen sync point and drains the emitted recovery actions.
    pub(crate) fn panic_resync(&mut self, input: &mut InputCursor, cb: &mut dyn ParserCallbacks) -> ParseResult<()> {
        let best = match self.resync(input) {
            Some(b) => b,
            None => return Err(crate::result::ParseError::FatalError),
        };

        let skipped = best.input_pos - input.pos;
        if skipped > 0 {
            self.tokens_to_skip = skipped;
            self.push_action(self.vm_actions.panic_skip, cb)?;
        }
        input.pos = best.input_pos;

        let mut stack_pos = self.sp;
        while stack_pos > best.stack_pos {
            let st = self.stack[stack_pos];
            let ref_idx = self.sync.state_skip_ref[st as usize];
            self.emit_action_list(ref_idx, cb)?;
            stack_pos -= 1;
        }
        if !input.at_end() {
            let tok = input.peek();
            if let Some(entry) = self.sync.entry_for(tok, self.stack[best.stack_pos]) {
                // Pop the sync state itself before pushing its
                // replacements — the first pushed state overwrites it
                // rather than landing above it.
                self.sp = best.stack_pos.saturating_sub(1);
                self.emit_action_list(entry.actions, cb)?;
                for &new_state in self.sync_state_list(entry) {
                    self.push_state(new_state)?;
                }
            } else {
                self.sp = best.stack_pos;
            }
        } else {
            self.sp = best.stack_pos;
        }

        self.drain(cb)
    }

    fn sync_state_list(&self, entry: SyncEntry) -> &[u16] {
        let base = entry.states as usize;
        let count = self.sync.states[base] as usize;
        &self.sync.states[base + 1..base + 1 + count]
    }

    /// Runs the action list at `actions[index]` (spec.md §4.7). Layout
    /// is `[cost, count, action..., insert_terminal...]`: `actions[index]`
    /// is the list's cost (already folded into the search by
    /// [`SyncTables::action_list_cost`]), `actions[index + 1]` the
    /// action count, the next `count` entries the action codes appended
    /// to the active chunk one at a time (same as any other
    /// megaaction), and — immediately following the action codes, in
    /// this same `actions` array — the terminals a `panic_insert` among
    /// them synthesizes. Shared by both the per-state discard lists
    /// (`state_skip_ref`) and the final sync entry's list.
    fn emit_action_list(&mut self, index: u16, cb: &mut dyn ParserCallbacks) -> ParseResult<()> {
        let base = index as usize;
        let count = self.sync.actions[base + 1] as usize;
        let mut has_insert = false;
        for i in 0..count {
            let action = self.sync.actions[base + 2 + i];
            if action == self.vm_actions.panic_insert {
                has_insert = true;
            }
            self.push_action(action, cb)?;
        }
        if has_insert {
            self.insert_terminals = InsertSource::Table(&self.sync.actions[base + 2 + count..]);
            self.insert_pos = 0;
        }
        Ok(())
    }
}
