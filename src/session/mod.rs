//! In-memory state for a single badminton session: roster, courts and the
//! waiting order. Lives in WASM memory (thread_local) for the lifetime of
//! the Web Worker; the persist route mirrors it into localStorage.

pub mod court;
pub mod queue;
pub mod roster;
pub mod state;
