//! Roster operations — adding, removing and re-statusing members.
//!
//! Everyone joins at the back of the waiting order. Removing or resting a
//! member who is mid-match cascades: their slot is cleared first, so no
//! court ever references a missing or resting player.

use crate::session::state::{Member, MemberStatus, SessionState, StoreError};

/// Avatar palette, cycled by roster size at the moment a member is added.
pub const EMOJI_PALETTE: [&str; 16] = [
    "😀", "😎", "🥷", "🤩", "😄", "🥸", "🤠", "😏", "🧐", "🤗", "🦸", "🧙", "😈", "👑", "🦊", "🐼",
];

impl SessionState {
    /// Add a member to the roster and the back of the waiting order.
    /// Returns the freshly minted id. Name uniqueness is a caller concern.
    pub fn add_member(&mut self, name: &str) -> String {
        let id = self.mint_member_id();
        let emoji = EMOJI_PALETTE[self.members.len() % EMOJI_PALETTE.len()];
        self.members.push(Member {
            id: id.clone(),
            name: name.trim().to_string(),
            emoji: emoji.to_string(),
            play_count: 0,
            status: MemberStatus::Waiting,
            paid: false,
        });
        self.waiting_order.push(id.clone());
        id
    }

    /// Next free id: one past the highest numeric suffix in the roster.
    fn mint_member_id(&self) -> String {
        let next = self
            .members
            .iter()
            .filter_map(|m| m.id.strip_prefix('m').and_then(|n| n.parse::<u64>().ok()))
            .max()
            .unwrap_or(0)
            + 1;
        format!("m{}", next)
    }

    /// Remove a member entirely. Cascades off the court and out of the
    /// waiting order first.
    pub fn remove_member(&mut self, id: &str) -> Result<(), StoreError> {
        self.member(id)
            .ok_or_else(|| StoreError::UnknownMember(id.to_string()))?;
        self.vacate_slot_of(id);
        self.detach_from_waiting(id);
        self.members.retain(|m| m.id != id);
        Ok(())
    }

    /// Move a member to the resting bench. Cascades off the court if they
    /// were mid-match.
    pub fn move_to_rest(&mut self, id: &str) -> Result<(), StoreError> {
        self.member(id)
            .ok_or_else(|| StoreError::UnknownMember(id.to_string()))?;
        self.vacate_slot_of(id);
        self.detach_from_waiting(id);
        if let Some(m) = self.member_mut(id) {
            m.status = MemberStatus::Resting;
        }
        Ok(())
    }

    /// Return a member to the back of the waiting order. Idempotent: calling
    /// it on someone already waiting never duplicates their queue entry.
    pub fn return_from_rest(&mut self, id: &str) -> Result<(), StoreError> {
        self.member(id)
            .ok_or_else(|| StoreError::UnknownMember(id.to_string()))?;
        self.vacate_slot_of(id);
        if let Some(m) = self.member_mut(id) {
            m.status = MemberStatus::Waiting;
        }
        self.enqueue_waiting(id);
        Ok(())
    }

    /// Flip a member's paid flag. Returns the new value.
    pub fn toggle_paid(&mut self, id: &str) -> Result<bool, StoreError> {
        let m = self
            .member_mut(id)
            .ok_or_else(|| StoreError::UnknownMember(id.to_string()))?;
        m.paid = !m.paid;
        Ok(m.paid)
    }

    /// Replace the per-person fee. Positivity is validated at the route.
    pub fn set_session_fee(&mut self, fee: u32) {
        self.session_fee = fee;
    }

    /// Manual play-count correction, saturating at zero.
    /// Returns the new count.
    pub fn adjust_play_count(&mut self, id: &str, delta: i32) -> Result<u32, StoreError> {
        let m = self
            .member_mut(id)
            .ok_or_else(|| StoreError::UnknownMember(id.to_string()))?;
        m.play_count = m.play_count.saturating_add_signed(delta);
        Ok(m.play_count)
    }
}
