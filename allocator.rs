use crate::result::{ParseError, ParseResult};

/// The host allocator collaborator (spec.md §6.1).
///
/// The runtime never allocates on its own; every growth decision (when
/// to grow, how far) is the runtime's, but the actual memory comes from
/// whatever `Allocator` the host supplies. A [`SystemAllocator`] default
/// is provided for tests and for callers who don't need a custom
/// arena — analogous to `radlr-rust-rt` shipping its own allocator
/// collaborator as a usable default while keeping the trait pluggable.
pub trait Allocator {
    fn grow_stack(&mut self, buf: &mut Vec<u16>, new_len: usize) -> ParseResult<()>;
    fn grow_data(&mut self, buf: &mut Vec<u8>, new_len: usize) -> ParseResult<()>;
}

/// Backs growth with the process's global allocator via `Vec`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn grow_stack(&mut self, buf: &mut Vec<u16>, new_len: usize) -> ParseResult<()> {
        grow(buf, new_len)
    }

    fn grow_data(&mut self, buf: &mut Vec<u8>, new_len: usize) -> ParseResult<()> {
        grow(buf, new_len)
    }
}

fn grow<T: Default + Clone>(buf: &mut Vec<T>, new_len: usize) -> ParseResult<()> {
    if new_len <= buf.len() {
        return Ok(());
    }
    buf.try_reserve(new_len - buf.len())
        .map_err(|_| ParseError::OutOfMemory)?;
    buf.resize(new_len, T::default());
    Ok(())
}
