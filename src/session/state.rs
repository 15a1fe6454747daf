//! Session state container.
//!
//! Uses `thread_local!` + `RefCell` for safe mutable access in single-threaded
//! WASM. The Web Worker keeps the WASM module alive, so the roster, courts and
//! waiting order persist across `handle_request` calls for the entire browser
//! session.
//!
//! Three invariants hold after every operation and are enforced by
//! [`SessionState::validate`] on import:
//!
//! - a member's `status` always agrees with their location (playing ⇔ on a
//!   court slot, waiting ⇔ in the waiting order, resting ⇔ neither),
//! - the waiting order never contains duplicates or non-waiting members,
//! - no member occupies more than one slot.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

/// Number of courts in a session.
pub const COURT_COUNT: usize = 2;
/// Positions per court (doubles: two per side of the net).
pub const SLOTS_PER_COURT: usize = 4;
/// Per-person fee a new session starts with.
pub const DEFAULT_SESSION_FEE: u32 = 200;
/// localStorage namespace for the persisted payload. Bumping the suffix
/// discards prior state instead of migrating it.
pub const STORAGE_KEY: &str = "courtside_session_v1";

/// An operation was asked to do something the session layout or roster
/// cannot support. Converted to an error fragment at the route boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Court or slot index outside the fixed layout.
    InvalidIndex {
        axis: &'static str,
        index: usize,
        limit: usize,
    },
    /// No roster member has this id.
    UnknownMember(String),
    /// The request contradicts the session's bookkeeping (e.g. a reorder
    /// that is not a permutation of the current waiting set).
    InconsistentState(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidIndex { axis, index, limit } => {
                write!(f, "{} index {} out of range (max {})", axis, index, limit - 1)
            }
            StoreError::UnknownMember(id) => write!(f, "no member with id '{}'", id),
            StoreError::InconsistentState(msg) => write!(f, "session state conflict: {}", msg),
        }
    }
}

/// Where a member is in the session lifecycle. Serialized lowercase to match
/// the persisted payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// In the waiting order, available for a court.
    Waiting,
    /// Occupying exactly one court slot.
    Playing,
    /// Sitting out; not in the waiting order, not on a court.
    Resting,
}

/// One person in the session roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Opaque id ("m1", "m2", ...), stable for the member's lifetime.
    pub id: String,
    pub name: String,
    /// Avatar picked from the palette when the member was added.
    pub emoji: String,
    /// Matches completed this session. Drives fair auto-fill ordering.
    pub play_count: u32,
    pub status: MemberStatus,
    /// Whether the session fee has been settled.
    pub paid: bool,
}

/// The four positions of one court, by member id. Slots 0-1 are the side
/// above the net, slots 2-3 the side below; the pairing is presentational
/// only and carries no rules weight.
pub type CourtSlots = [Option<String>; SLOTS_PER_COURT];

pub(crate) const EMPTY_COURT: CourtSlots = [None, None, None, None];

/// Complete session state — everything the persisted payload carries.
/// The volatile next-match boundary deliberately lives elsewhere
/// (`session::queue`) so it never reaches localStorage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub members: Vec<Member>,
    /// Per-person fee collected via the payment dialog.
    pub session_fee: u32,
    pub courts: [CourtSlots; COURT_COUNT],
    /// Waiting members, front of the queue first.
    pub waiting_order: Vec<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            session_fee: DEFAULT_SESSION_FEE,
            courts: [EMPTY_COURT, EMPTY_COURT],
            waiting_order: Vec::new(),
        }
    }
}

impl SessionState {
    /// Look up a member by id.
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub(crate) fn member_mut(&mut self, id: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    /// The (court, slot) a member occupies, if any.
    pub fn slot_of(&self, id: &str) -> Option<(usize, usize)> {
        for (c, court) in self.courts.iter().enumerate() {
            for (s, slot) in court.iter().enumerate() {
                if slot.as_deref() == Some(id) {
                    return Some((c, s));
                }
            }
        }
        None
    }

    /// Drop an id from the waiting order, wherever it sits. No-op if absent.
    pub(crate) fn detach_from_waiting(&mut self, id: &str) {
        self.waiting_order.retain(|w| w != id);
    }

    /// Append an id to the back of the waiting order unless already queued.
    pub(crate) fn enqueue_waiting(&mut self, id: &str) {
        if !self.waiting_order.iter().any(|w| w == id) {
            self.waiting_order.push(id.to_string());
        }
    }

    /// Check every structural invariant. Used by import/restore so corrupt
    /// payloads are discarded rather than adopted.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (i, m) in self.members.iter().enumerate() {
            if self.members[..i].iter().any(|other| other.id == m.id) {
                return Err(StoreError::InconsistentState(format!(
                    "duplicate member id '{}'",
                    m.id
                )));
            }
        }

        let mut seated: Vec<&str> = Vec::new();
        for court in &self.courts {
            for slot in court.iter().flatten() {
                let occupant = self.member(slot).ok_or_else(|| {
                    StoreError::InconsistentState(format!("court references unknown id '{}'", slot))
                })?;
                if occupant.status != MemberStatus::Playing {
                    return Err(StoreError::InconsistentState(format!(
                        "'{}' is seated but not marked playing",
                        slot
                    )));
                }
                if seated.contains(&slot.as_str()) {
                    return Err(StoreError::InconsistentState(format!(
                        "'{}' occupies more than one slot",
                        slot
                    )));
                }
                seated.push(slot);
            }
        }

        for (i, id) in self.waiting_order.iter().enumerate() {
            if self.waiting_order[..i].contains(id) {
                return Err(StoreError::InconsistentState(format!(
                    "'{}' queued more than once",
                    id
                )));
            }
            let queued = self.member(id).ok_or_else(|| {
                StoreError::InconsistentState(format!("waiting order references unknown id '{}'", id))
            })?;
            if queued.status != MemberStatus::Waiting {
                return Err(StoreError::InconsistentState(format!(
                    "'{}' is queued but not marked waiting",
                    id
                )));
            }
        }

        for m in &self.members {
            let on_court = self.slot_of(&m.id).is_some();
            let queued = self.waiting_order.iter().any(|w| w == &m.id);
            let consistent = match m.status {
                MemberStatus::Playing => on_court,
                MemberStatus::Waiting => queued && !on_court,
                MemberStatus::Resting => !on_court && !queued,
            };
            if !consistent {
                return Err(StoreError::InconsistentState(format!(
                    "'{}' has status {:?} but sits elsewhere",
                    m.id, m.status
                )));
            }
        }

        Ok(())
    }
}

thread_local! {
    static SESSION: RefCell<SessionState> = RefCell::new(SessionState {
        members: Vec::new(),
        session_fee: DEFAULT_SESSION_FEE,
        courts: [EMPTY_COURT, EMPTY_COURT],
        waiting_order: Vec::new(),
    });
}

/// Execute a closure with read access to the session state.
pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(&SessionState) -> R,
{
    SESSION.with(|s| f(&s.borrow()))
}

/// Execute a closure with mutable access to the session state.
pub fn with_session_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut SessionState) -> R,
{
    SESSION.with(|s| f(&mut s.borrow_mut()))
}

/// Replace the entire session state (used by restore/import).
pub fn replace_session(new_state: SessionState) {
    SESSION.with(|s| {
        *s.borrow_mut() = new_state;
    });
}

/// Wipe everything back to an empty session: no members, empty courts,
/// default fee.
pub fn reset_session() {
    replace_session(SessionState::default());
}

/// Export the session as compact JSON in the persisted payload shape.
pub fn export_session_json() -> String {
    with_session(|state| serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string()))
}

/// Export the session as pretty-printed JSON for the inspection route.
pub fn export_session_json_pretty() -> String {
    with_session(|state| serde_json::to_string_pretty(state).unwrap_or_else(|_| "{}".to_string()))
}

/// Import session state from JSON. Payloads that parse but contradict the
/// structural invariants are rejected, leaving current state untouched.
pub fn import_session_json(json: &str) -> Result<(), String> {
    let new_state: SessionState =
        serde_json::from_str(json).map_err(|e| format!("Invalid session JSON: {}", e))?;
    new_state.validate().map_err(|e| e.to_string())?;
    replace_session(new_state);
    Ok(())
}
