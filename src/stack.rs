//! Stack growth for the recursive descents.
//!
//! The parser, the usage walk and the interpreter all recurse once per
//! nesting level, and script functions recurse on the host stack too.
//! `stacker` grows it on demand so that only the interpreter's own
//! call-depth limit decides when a script has recursed too far.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
