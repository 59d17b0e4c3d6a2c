use crate::allocator::Allocator;
use crate::config::ParserConfig;
use crate::result::{ParseError, ParseResult};
use crate::tables::{ParserTables, SyncTables, Token};

use super::callbacks::{ParserCallbacks, VmData};

/// Generator-assigned codes for the five built-in recovery actions
/// (spec.md §4.8).
///
/// The source also reserves a sentinel action code to mark the end of a
/// dispatched chunk; this runtime tracks each chunk's length explicitly
/// instead (spec.md §9's "may dispense with the sentinel" alternative),
/// so there is no sentinel code to carry here.
#[derive(Debug, Clone, Copy)]
pub struct VmActionCodes {
    pub panic_skip: u16,
    pub panic_insert: u16,
    pub lec_insert: u16,
    pub lec_replace: u16,
    pub lec_remove: u16,
}

/// Source for the terminal(s) a recovery action synthesizes (spec.md
/// §6.3's `insert_terminals`).
///
/// Panic-mode sync action lists can emit several `panic_insert` actions
/// in a row, each consuming the next terminal from a table-resident
/// list; LEC's `lec_insert`/`lec_replace` only ever need one terminal at
/// a time. Modeling these as an owned value plus a borrowed table slice
/// (instead of a raw pointer, as the source does) avoids a dangling
/// reference once the correction that produced it goes out of scope —
/// see DESIGN.md.
pub(crate) enum InsertSource<'t> {
    Owned(Token),
    Table(&'t [Token]),
}

pub(crate) struct Chunk {
    pub output: Vec<u16>,
    pub op: usize,
    pub rewind: Vec<(u16, u16)>,
    pub rp: usize,
}

impl Chunk {
    fn new(chunk_size: usize) -> Self {
        Self {
            output: vec![0u16; chunk_size],
            op: 0,
            rewind: vec![(0u16, 0u16); chunk_size],
            rp: 0,
        }
    }
}

pub(crate) struct Arena {
    pub buf: Vec<u8>,
    pub pos: usize,
}

/// The LL parser's runtime state (spec.md §3.2, §4).
///
/// A `Parser` is constructed once and reused across successive `run`
/// calls (the stack/data arena/output chunks are kept between runs, not
/// reallocated each time).
pub struct Parser<'t, A: Allocator> {
    pub(crate) tables: ParserTables<'t>,
    pub(crate) sync: SyncTables<'t>,
    pub(crate) vm_actions: VmActionCodes,
    pub(crate) config: ParserConfig,
    pub(crate) allocator: A,

    pub(crate) stack: Vec<u16>,
    pub(crate) sp: usize,

    pub(crate) chunks: [Chunk; 2],
    pub(crate) active: usize,

    pub(crate) data: Arena,

    pub(crate) tokens_to_skip: usize,
    pub(crate) insert_terminals: InsertSource<'t>,
    pub(crate) insert_pos: usize,
}

impl<'t, A: Allocator> Parser<'t, A> {
    pub fn new(
        tables: ParserTables<'t>,
        sync: SyncTables<'t>,
        vm_actions: VmActionCodes,
        config: ParserConfig,
        allocator: A,
    ) -> Self {
        Self {
            tables,
            sync,
            vm_actions,
            config,
            allocator,
            stack: Vec::new(),
            sp: 0,
            chunks: [Chunk::new(config.chunk_size), Chunk::new(config.chunk_size)],
            active: 0,
            data: Arena { buf: Vec::new(), pos: 0 },
            tokens_to_skip: 0,
            insert_terminals: InsertSource::Owned(0),
            insert_pos: 0,
        }
    }

    pub(crate) fn stack_limit(&self) -> usize {
        self.stack.len() - 4
    }

    pub(crate) fn initialize(&mut self) -> ParseResult<()> {
        self.allocator.grow_stack(&mut self.stack, self.config.stack_initial)?;
        self.allocator.grow_data(&mut self.data.buf, self.config.data_initial)?;
        Ok(())
    }

    pub(crate) fn grow_stack(&mut self) -> ParseResult<()> {
        let old = self.stack.len();
        let new_size = (old.saturating_mul(2)).min(self.config.stack_max);
        if new_size <= old {
            return Err(ParseError::StackOverflow);
        }
        #[cfg(debug_assertions)]
        eprintln!("parser: growing stack {old} -> {new_size}");
        self.allocator.grow_stack(&mut self.stack, new_size)
    }

    pub(crate) fn grow_data(&mut self) -> ParseResult<()> {
        let old = self.data.buf.len();
        let new_size = (old.saturating_mul(2)).min(self.config.data_max);
        if new_size <= old {
            return Err(ParseError::StackOverflow);
        }
        #[cfg(debug_assertions)]
        eprintln!("parser: growing data arena {old} -> {new_size}");
        self.allocator.grow_data(&mut self.data.buf, new_size)
    }

    /// Undoes the chunk displaced by [`Self::cycle_chunks`] through the
    /// VM if it had anything pending, then swaps which chunk is active.
    pub(crate) fn cycle_chunks(&mut self, cb: &mut dyn ParserCallbacks) -> ParseResult<()> {
        let old_active = self.active;
        let old_other = 1 - old_active;
        if self.chunks[old_other].op > 0 {
            self.run_vm(old_other, cb)?;
        }
        self.chunks[old_other].op = 0;
        self.chunks[old_other].rp = 0;
        self.active = old_other;
        Ok(())
    }

    /// Forces both chunks through the VM (spec.md §4.4).
    pub(crate) fn drain(&mut self, cb: &mut dyn ParserCallbacks) -> ParseResult<()> {
        self.cycle_chunks(cb)?;
        self.cycle_chunks(cb)
    }

    /// Abandons the active chunk's speculative content and resumes the
    /// other (previously displaced, still-pending) chunk as active.
    /// Used by recovery to "uncommit" a failed chunk without running it
    /// through the VM (spec.md §4.5).
    pub(crate) fn backtrack_chunk(&mut self) {
        let old_active = self.active;
        let other = 1 - old_active;
        self.active = other;
        self.chunks[old_active].op = 0;
        self.chunks[old_active].rp = 0;
    }

    pub(crate) fn push_action(&mut self, action: u16, cb: &mut dyn ParserCallbacks) -> ParseResult<()> {
        if self.chunks[self.active].op == self.config.chunk_size {
            self.cycle_chunks(cb)?;
        }
        let op = self.chunks[self.active].op;
        self.chunks[self.active].output[op] = action;
        self.chunks[self.active].op += 1;
        Ok(())
    }

    pub(crate) fn push_state(&mut self, state: u16) -> ParseResult<()> {
        if self.sp == self.stack_limit() {
            self.grow_stack()?;
        }
        self.sp += 1;
        self.stack[self.sp] = state;
        Ok(())
    }

    fn read_insert_terminal(&mut self, advance: bool) -> Token {
        let t = match &self.insert_terminals {
            InsertSource::Owned(t) => *t,
            InsertSource::Table(s) => s[self.insert_pos],
        };
        if advance {
            self.insert_pos += 1;
        }
        t
    }

    /// Dispatches the actions committed to `chunks[chunk_idx]` (spec.md
    /// §4.8). Checked for 256 bytes of data-arena headroom at the top of
    /// every iteration, matching the source's check placement exactly
    /// (not per byte written).
    pub(crate) fn run_vm(&mut self, chunk_idx: usize, cb: &mut dyn ParserCallbacks) -> ParseResult<()> {
        let count = self.chunks[chunk_idx].op;
        let mut i = 0;
        while i < count {
            if self.data.buf.len() - self.data.pos < 256 {
                self.grow_data()?;
            }
            let action = self.chunks[chunk_idx].output[i];
            let actions = &self.vm_actions;
            if action == actions.panic_skip {
                let n = self.tokens_to_skip;
                cb.panic_skip(n);
            } else if action == actions.panic_insert {
                let t = self.read_insert_terminal(true);
                cb.panic_insert(t);
            } else if action == actions.lec_insert {
                let t = self.read_insert_terminal(false);
                cb.lec_insert(t);
            } else if action == actions.lec_replace {
                let t = self.read_insert_terminal(false);
                cb.lec_replace(t);
            } else if action == actions.lec_remove {
                cb.lec_remove();
            } else {
                let mut data = VmData { buf: &mut self.data.buf, pos: &mut self.data.pos };
                cb.dispatch(action, &mut data)?;
            }
            i += 1;
        }
        Ok(())
    }
}
