use crate::allocator::Allocator;
use crate::result::ParseResult;
use crate::tables::Token;

use super::callbacks::ParserCallbacks;
use super::core::CoreExit;
use super::input::InputCursor;
use super::recovery::RecoveryOutcome;
use super::state::Parser;

impl<'t, A: Allocator> Parser<'t, A> {
    /// Top-level entry point (spec.md §2's `parser_run`): drives the
    /// step-loop over `tokens` to acceptance, invoking recovery whenever
    /// the core fails, and returns once the sentinel state is reached
    /// with the input fully consumed.
    pub fn run(&mut self, tokens: &[Token], cb: &mut dyn ParserCallbacks) -> ParseResult<()> {
        if self.stack.is_empty() {
            self.initialize()?;
        }
        self.sp = 0;
        self.stack[0] = 0;
        for chunk in &mut self.chunks {
            chunk.op = 0;
            chunk.rp = 0;
        }
        self.active = 0;

        let mut input = InputCursor::new(tokens, tokens.len(), self.tables.eof_token);

        loop {
            match self.step_loop(&mut input) {
                CoreExit::DispatchFail => {
                    if self.at_accept(&input) {
                        break;
                    }
                    match self.recover(&mut input, cb) {
                        RecoveryOutcome::Recovered => continue,
                        RecoveryOutcome::Fatal(e) => return Err(e),
                    }
                }
                CoreExit::BufferFull => {
                    if self.sp >= self.stack_limit() {
                        self.grow_stack()?;
                    } else {
                        self.cycle_chunks(cb)?;
                    }
                }
            }
        }

        self.drain(cb)
    }

    fn at_accept(&self, input: &InputCursor) -> bool {
        input.at_end() && self.stack[self.sp] == self.tables.sentinel_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::SystemAllocator;
    use crate::config::ParserConfig;
    use crate::result::ParseResult;
    use crate::tables::{ParserTables, SyncTables, TableEntry};
    use crate::parser::{VmActionCodes, VmData};

    struct NoopCallbacks;

    impl ParserCallbacks for NoopCallbacks {
        fn panic_skip(&mut self, _count: usize) {}
        fn panic_insert(&mut self, _terminal: Token) {}
        fn lec_insert(&mut self, _terminal: Token) {}
        fn lec_remove(&mut self) {}
        fn lec_replace(&mut self, _terminal: Token) {}
        fn dispatch(&mut self, _action: u16, _data: &mut VmData) -> ParseResult<()> {
            Ok(())
        }
    }

    // A two-state grammar that shifts a single real token (id 0), then
    // accepts at end-of-input (eof token id 1, sentinel state id 1).
    fn single_token_tables() -> (Vec<u8>, Vec<u32>, Vec<u16>, Vec<TableEntry>) {
        let dispatch = vec![0u8, 0xff, 0xff, 0xff];
        let base = vec![0u32, 0u32];
        let table = vec![0u16];
        let entries = vec![TableEntry { shift: 1, state_change: 0, megaaction: 0, data: [1, 0, 0, 0] }];
        (dispatch, base, table, entries)
    }

    fn empty_sync_tables<'t>() -> SyncTables<'t> {
        SyncTables {
            token_count: 2,
            state_count: 2,
            dispatch: &[],
            base: &[0, 0],
            entries: &[],
            actions: &[],
            states: &[],
            token_skip_cost: &[0, 0],
            token_insert_cost: &[0, 0],
            token_sync_cost: &[0, 0],
            state_skip_ref: &[0, 0],
            state_skip_cost: &[0, 0],
        }
    }

    #[test]
    fn accepts_a_single_shifted_token() {
        let (dispatch, base, table, entries) = single_token_tables();
        let tables = ParserTables {
            token_count: 2,
            state_count: 2,
            sentinel_state: 1,
            eof_token: 1,
            dispatch: &dispatch,
            base: &base,
            table: &table,
            entries: &entries,
        };
        let vm_actions = VmActionCodes {
            panic_skip: 0xfff0,
            panic_insert: 0xfff1,
            lec_insert: 0xfff2,
            lec_replace: 0xfff3,
            lec_remove: 0xfff4,
        };
        let mut parser =
            Parser::new(tables, empty_sync_tables(), vm_actions, ParserConfig::default(), SystemAllocator);
        let mut cb = NoopCallbacks;

        let result = parser.run(&[0], &mut cb);
        assert!(result.is_ok());
    }

    struct RecordingCallbacks {
        lec_removes: u32,
        panic_skips: Vec<usize>,
    }

    impl RecordingCallbacks {
        fn new() -> Self {
            Self { lec_removes: 0, panic_skips: Vec::new() }
        }
    }

    impl ParserCallbacks for RecordingCallbacks {
        fn panic_skip(&mut self, count: usize) {
            self.panic_skips.push(count);
        }
        fn panic_insert(&mut self, _terminal: Token) {}
        fn lec_insert(&mut self, _terminal: Token) {}
        fn lec_remove(&mut self) {
            self.lec_removes += 1;
        }
        fn lec_replace(&mut self, _terminal: Token) {}
        fn dispatch(&mut self, _action: u16, _data: &mut VmData) -> ParseResult<()> {
            Ok(())
        }
    }

    // Grammar accepting exactly "A B": state 0 -> A -> state 1 -> B ->
    // state 2 (sentinel). Feeding it "A A B" trips local error correction
    // into dropping the spurious extra A.
    fn two_token_tables() -> (Vec<u8>, Vec<u32>, Vec<u16>, Vec<TableEntry>) {
        let dispatch = vec![0u8, 0xff, 0xff, 0xff, 0, 0xff, 0xff, 0xff, 0xff];
        let base = vec![0u32, 1u32, 0u32];
        let table = vec![0u16, 1u16];
        let entries = vec![
            TableEntry { shift: 1, state_change: 0, megaaction: 0, data: [1, 0, 0, 0] },
            TableEntry { shift: 1, state_change: 0, megaaction: 0, data: [2, 0, 0, 0] },
        ];
        (dispatch, base, table, entries)
    }

    #[test]
    fn local_error_correction_drops_a_spurious_token_and_accepts() {
        let (dispatch, base, table, entries) = two_token_tables();
        let tables = ParserTables {
            token_count: 3,
            state_count: 3,
            sentinel_state: 2,
            eof_token: 2,
            dispatch: &dispatch,
            base: &base,
            table: &table,
            entries: &entries,
        };
        let vm_actions = VmActionCodes {
            panic_skip: 0xfff0,
            panic_insert: 0xfff1,
            lec_insert: 0xfff2,
            lec_replace: 0xfff3,
            lec_remove: 0xfff4,
        };
        let mut parser =
            Parser::new(tables, empty_sync_tables(), vm_actions, ParserConfig::default(), SystemAllocator);
        let mut cb = RecordingCallbacks::new();

        let result = parser.run(&[0, 0, 1], &mut cb);

        assert!(result.is_ok());
        assert_eq!(cb.lec_removes, 1);
        assert!(cb.panic_skips.is_empty());
    }

    // A single state with no sync entries anywhere: when the bad token
    // can't be fixed by LEC either (the window is too short to reach the
    // acceptance threshold), panic-mode resync must still skip past it
    // and land the parser back in a state that can finish the parse —
    // not loop forever re-entering recovery on the same failure.
    fn skip_and_resume_tables() -> (Vec<u8>, Vec<u32>, Vec<u16>, Vec<TableEntry>) {
        let dispatch = vec![0u8, 0xff, 0xff, 0xff, 0xff, 0xff];
        let base = vec![0u32, 0u32];
        let table = vec![0u16];
        let entries = vec![TableEntry { shift: 1, state_change: 0, megaaction: 0, data: [1, 0, 0, 0] }];
        (dispatch, base, table, entries)
    }

    #[test]
    fn panic_mode_resync_recovers_when_lec_cannot() {
        let (dispatch, base, table, entries) = skip_and_resume_tables();
        let tables = ParserTables {
            token_count: 3,
            state_count: 2,
            sentinel_state: 1,
            eof_token: 2,
            dispatch: &dispatch,
            base: &base,
            table: &table,
            entries: &entries,
        };
        let vm_actions = VmActionCodes {
            panic_skip: 0xfff0,
            panic_insert: 0xfff1,
            lec_insert: 0xfff2,
            lec_replace: 0xfff3,
            lec_remove: 0xfff4,
        };
        let sync_dispatch = vec![0u8, 0xff, 0xff, 0xff, 0xff, 0xff];
        let sync = SyncTables {
            token_count: 3,
            state_count: 2,
            dispatch: &sync_dispatch,
            base: &[0, 0],
            entries: &[crate::tables::SyncEntry { actions: 0, states: 0 }],
            actions: &[0, 0],
            states: &[1, 0],
            token_skip_cost: &[5, 1, 0],
            token_insert_cost: &[0, 0, 0],
            token_sync_cost: &[0, 0, 0],
            state_skip_ref: &[0, 0],
            state_skip_cost: &[0, 0],
        };
        let mut parser = Parser::new(tables, sync, vm_actions, ParserConfig::default(), SystemAllocator);
        let mut cb = RecordingCallbacks::new();

        // token 1 (garbage) then token 0 (A): the garbage token fails
        // immediately with nothing shifted yet, LEC's window can only
        // ever re-shift the remaining A (advance 1, short of its
        // threshold of 2), forcing panic mode to skip the garbage token
        // and resync into a fresh copy of state 0.
        let result = parser.run(&[1, 0], &mut cb);

        assert!(result.is_ok());
        assert_eq!(cb.lec_removes, 0);
        assert_eq!(cb.panic_skips, vec![1]);
    }
}
