//! Waiting-order projections and the next-match boundary.
//!
//! The boundary splits the waiting order into an "up next" prefix (at most
//! four members) and the substitutes behind them. It is a view-layer
//! convenience: bookkeeping only, no effect on who a court operation may
//! seat.
//!
//! Uses its own `thread_local!` so it doesn't pollute localStorage
//! persistence of session state — after a reload every waiting member is a
//! substitute again until the next refill or auto-arrange.

use crate::session::state::{Member, MemberStatus, SessionState, StoreError};
use std::cell::Cell;

/// Most members an upcoming match can hold.
pub const NEXT_MATCH_CAP: usize = 4;

impl SessionState {
    /// Waiting members in queue order.
    pub fn waiting_members(&self) -> Vec<&Member> {
        self.waiting_order
            .iter()
            .filter_map(|id| self.member(id))
            .collect()
    }

    /// Everyone currently seated on a court.
    pub fn playing_members(&self) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| m.status == MemberStatus::Playing)
            .collect()
    }

    /// Everyone sitting out.
    pub fn resting_members(&self) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| m.status == MemberStatus::Resting)
            .collect()
    }

    /// Waiting ids stable-sorted by play count: who deserves a court first.
    pub fn fill_candidates(&self) -> Vec<String> {
        let mut waiting = self.waiting_members();
        waiting.sort_by_key(|m| m.play_count);
        waiting.into_iter().map(|m| m.id.clone()).collect()
    }

    /// Position of an id in the waiting order.
    pub fn waiting_rank(&self, id: &str) -> Option<usize> {
        self.waiting_order.iter().position(|w| w == id)
    }

    /// Replace the waiting order wholesale. The new sequence must be an
    /// exact permutation of the current one; anything else is rejected and
    /// nothing changes.
    pub fn reorder_waiting(&mut self, ids: &[String]) -> Result<(), StoreError> {
        if ids.len() != self.waiting_order.len() {
            return Err(StoreError::InconsistentState(format!(
                "reorder lists {} ids but {} members are waiting",
                ids.len(),
                self.waiting_order.len()
            )));
        }
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(StoreError::InconsistentState(format!(
                    "'{}' appears twice in the reorder",
                    id
                )));
            }
            if !self.waiting_order.contains(id) {
                return Err(StoreError::InconsistentState(format!(
                    "'{}' is not in the waiting order",
                    id
                )));
            }
        }
        self.waiting_order = ids.to_vec();
        Ok(())
    }
}

thread_local! {
    static NEXT_MATCH_BOUNDARY: Cell<usize> = Cell::new(0);
}

/// The boundary clamped into the current waiting order: never past the end,
/// so queue shrinkage can't leave a phantom prefix.
pub fn effective_boundary(waiting_len: usize) -> usize {
    NEXT_MATCH_BOUNDARY.with(|b| b.get().min(waiting_len))
}

pub fn set_boundary(value: usize) {
    NEXT_MATCH_BOUNDARY.with(|b| b.set(value));
}

/// Forget the prefix entirely (session reset, restore, import).
pub fn clear_boundary() {
    set_boundary(0);
}

/// Shrink the prefix when one of its members leaves the queue (seated,
/// rested or removed). Call with the member's rank before the mutation;
/// `None` (not waiting) leaves the boundary alone.
pub fn note_prefix_departure(rank: Option<usize>, waiting_len: usize) {
    if let Some(rank) = rank {
        let eb = effective_boundary(waiting_len);
        if rank < eb {
            set_boundary(eb.saturating_sub(1));
        }
    }
}

/// After a court refill everyone at the front, up to the cap, is up next.
pub fn reset_for_refill(waiting_len: usize) {
    set_boundary(NEXT_MATCH_CAP.min(waiting_len));
}

/// Move a substitute to the end of the up-next prefix and grow the boundary
/// over them. No-op for members already inside the prefix. Callers normally
/// gate this on the prefix having room.
pub fn promote(state: &mut SessionState, id: &str) -> Result<(), StoreError> {
    let rank = state.waiting_rank(id).ok_or_else(|| {
        StoreError::InconsistentState(format!("'{}' is not in the waiting order", id))
    })?;
    let eb = effective_boundary(state.waiting_order.len());
    if rank < eb {
        return Ok(());
    }
    let mut ids: Vec<String> = state
        .waiting_order
        .iter()
        .filter(|w| w.as_str() != id)
        .cloned()
        .collect();
    ids.insert(eb, id.to_string());
    state.reorder_waiting(&ids)?;
    set_boundary(eb + 1);
    Ok(())
}

/// Drop a prefix member to the back of the substitutes and shrink the
/// boundary. No-op for members already behind it.
pub fn demote(state: &mut SessionState, id: &str) -> Result<(), StoreError> {
    let rank = state.waiting_rank(id).ok_or_else(|| {
        StoreError::InconsistentState(format!("'{}' is not in the waiting order", id))
    })?;
    let eb = effective_boundary(state.waiting_order.len());
    if rank >= eb {
        return Ok(());
    }
    let mut ids: Vec<String> = state
        .waiting_order
        .iter()
        .filter(|w| w.as_str() != id)
        .cloned()
        .collect();
    ids.push(id.to_string());
    state.reorder_waiting(&ids)?;
    set_boundary(eb.saturating_sub(1));
    Ok(())
}

/// Fairness pass over the whole queue: stable-sort by play count and mark
/// the first four as the upcoming match.
pub fn auto_arrange(state: &mut SessionState) -> Result<(), StoreError> {
    let ids = state.fill_candidates();
    state.reorder_waiting(&ids)?;
    reset_for_refill(state.waiting_order.len());
    Ok(())
}
