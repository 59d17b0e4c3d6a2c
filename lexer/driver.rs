use super::sink::LexerSink;
use crate::tables::LexerTables;
use crate::tables::lexer_tables::{cell_emits, cell_next_state};

/// Bytes processed per unrolled iteration of the inner loop (spec.md §4.1:
/// "reimplementations may pick any unroll width >= 1").
const UNROLL: usize = 4;

/// Runs the DFA lexer over `input`, vending/filling/flushing buffers
/// through `sink` (spec.md §4.1).
///
/// The outer loop's structure guarantees that `finalize`'s single write
/// always lands in a non-full buffer: the capacity check happens before
/// the `pos >= len` exit check on every iteration, so by the time the
/// loop breaks there is always at least one free slot.
pub fn run<S: LexerSink>(tables: &LexerTables, input: &[u8], sink: &mut S) {
    let mut state: u16 = 0;
    let mut pos: usize = 0;
    let len = input.len();

    let (mut tokens, mut offsets) = sink.get_buffer();
    let mut cap = tokens.len().min(offsets.len());
    let mut idx: usize = 0;

    loop {
        if idx >= cap {
            sink.on_output(tokens, offsets, idx);
            let (t, o) = sink.get_buffer();
            tokens = t;
            offsets = o;
            cap = tokens.len().min(offsets.len());
            idx = 0;
        }
        if pos >= len {
            break;
        }
        scan_block(
            tables, input, &mut pos, len, &mut state, &mut tokens, &mut offsets, &mut idx, cap,
        );
    }

    let fin = tables.final_transition(state);
    tokens[idx] = tables.accept_of(state);
    offsets[idx] = len as u32;
    idx += cell_emits(fin) as usize;

    sink.on_output(tokens, offsets, idx);
}

#[inline]
fn step(
    tables: &LexerTables,
    byte: u8,
    state: &mut u16,
    pos: usize,
    tokens: &mut [u16],
    offsets: &mut [u32],
    idx: &mut usize,
) {
    let class = tables.class_of(byte);
    let cell = tables.transition(*state, class);

    tokens[*idx] = tables.accept_of(*state);
    offsets[*idx] = pos as u32;

    *state = cell_next_state(cell);
    *idx += cell_emits(cell) as usize;
}

#[allow(clippy::too_many_arguments)]
fn scan_block(
    tables: &LexerTables,
    input: &[u8],
    pos: &mut usize,
    len: usize,
    state: &mut u16,
    tokens: &mut [u16],
    offsets: &mut [u32],
    idx: &mut usize,
    cap: usize,
) {
    while len - *pos >= UNROLL && cap - *idx >= UNROLL {
        for i in 0..UNROLL {
            step(tables, input[*pos + i], state, *pos + i, tokens, offsets, idx);
        }
        *pos += UNROLL;
    }
    while *pos < len && *idx < cap {
        step(tables, input[*pos], state, *pos, tokens, offsets, idx);
        *pos += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecSink {
        tokens: Vec<u16>,
        offsets: Vec<u32>,
    }

    impl LexerSink for VecSink {
        fn get_buffer(&mut self) -> (Vec<u16>, Vec<u32>) {
            (vec![0u16; 8], vec![0u32; 8])
        }

        fn on_output(&mut self, tokens: Vec<u16>, offsets: Vec<u32>, count: usize) {
            self.tokens.extend_from_slice(&tokens[..count]);
            self.offsets.extend_from_slice(&offsets[..count]);
        }
    }

    // Recognizes runs of 'a' (token 1) separated by anything else (token 2),
    // one byte at a time. equiv class 0 = 'a', class 1 = everything else.
    fn digit_tables() -> LexerTables<'static> {
        static EQUIV: [u16; 256] = {
            let mut t = [2u16; 256];
            t[b'a' as usize] = 0;
            t
        };
        // states: 0 = start/other, 1 = inside run of 'a'
        // class 0 ('a'): state0 -> state1 no-emit, state1 -> state1 no-emit
        // class 2 (other): state0 -> state0 emit(token2), state1 -> state0 emit(token1)
        static TRANS: [u16; 6] = [
            /*state0,class0*/ 1 << 1,
            /*state0,class1*/ 0,
            /*state0,class2*/ (0 << 1) | 1,
            /*state1,class0*/ 1 << 1,
            /*state1,class1*/ 0,
            /*state1,class2*/ (0 << 1) | 1,
        ];
        static ACCEPT: [u16; 2] = [2, 1];
        static FINAL: [u16; 2] = [0, 1];
        LexerTables {
            equiv: &EQUIV,
            num_classes: 3,
            trans: &TRANS,
            accept: &ACCEPT,
            final_trans: &FINAL,
        }
    }

    #[test]
    fn emits_tokens_for_runs() {
        let tables = digit_tables();
        let mut sink = VecSink { tokens: vec![], offsets: vec![] };
        run(&tables, b"aab", &mut sink);
        // "aa" runs to position 2 then 'b' at position 2 closes it (token 1),
        // finalize flushes the trailing 'b' run (token 2).
        assert_eq!(sink.tokens, vec![1, 2]);
        assert_eq!(sink.offsets, vec![2, 3]);
    }

    #[test]
    fn empty_input_emits_final_token_only() {
        let tables = digit_tables();
        let mut sink = VecSink { tokens: vec![], offsets: vec![] };
        run(&tables, b"", &mut sink);
        assert_eq!(sink.tokens, vec![2]);
        assert_eq!(sink.offsets, vec![0]);
    }

    #[test]
    fn buffer_boundary_forces_multiple_flushes() {
        let tables = digit_tables();
        let mut sink = VecSink { tokens: vec![], offsets: vec![] };
        // 20 alternating single-'a' runs, will overflow an 8-slot buffer twice.
        let input = "a".repeat(20);
        run(&tables, input.as_bytes(), &mut sink);
        assert_eq!(sink.tokens, vec![1; 20]);
    }
}
