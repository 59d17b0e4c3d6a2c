/// Tunable resource limits for a [`crate::parser::Parser`] (spec.md §6.4).
///
/// Mirrors `radlr_core::ParserConfig`'s chained-setter style: a
/// `Default` gives usable out-of-the-box sizes, and the `with_*`
/// methods return `Self` so callers can chain them at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub chunk_size: usize,
    pub stack_initial: usize,
    pub stack_max: usize,
    pub data_initial: usize,
    pub data_max: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            stack_initial: 64,
            stack_max: 1 << 16,
            data_initial: 1024,
            data_max: 1 << 20,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_stack_limits(mut self, initial: usize, max: usize) -> Self {
        self.stack_initial = initial;
        self.stack_max = max;
        self
    }

    pub fn with_data_limits(mut self, initial: usize, max: usize) -> Self {
        self.data_initial = initial;
        self.data_max = max;
        self
    }
}
