//! Court operations — seating, eviction and match completion.
//!
//! Slots are addressed as (court, slot) with court in 0..2 and slot in 0..4.
//! Every operation validates indices up front and keeps the single-seat rule:
//! a member sits in at most one slot, and seating them somewhere new vacates
//! wherever they sat before.

use crate::session::state::{
    COURT_COUNT, EMPTY_COURT, MemberStatus, SLOTS_PER_COURT, SessionState, StoreError,
};

fn check_court(court: usize) -> Result<(), StoreError> {
    if court >= COURT_COUNT {
        return Err(StoreError::InvalidIndex {
            axis: "court",
            index: court,
            limit: COURT_COUNT,
        });
    }
    Ok(())
}

fn check_slot(slot: usize) -> Result<(), StoreError> {
    if slot >= SLOTS_PER_COURT {
        return Err(StoreError::InvalidIndex {
            axis: "slot",
            index: slot,
            limit: SLOTS_PER_COURT,
        });
    }
    Ok(())
}

impl SessionState {
    /// Clear whichever slot a member occupies. No-op for members off court.
    pub(crate) fn vacate_slot_of(&mut self, id: &str) {
        if let Some((c, s)) = self.slot_of(id) {
            self.courts[c][s] = None;
        }
    }

    /// Seat a member, from any prior status. A different occupant already in
    /// the slot is evicted to the back of the waiting order; re-seating the
    /// same member is a no-op; a member seated elsewhere is moved.
    pub fn assign_to_slot(&mut self, court: usize, slot: usize, id: &str) -> Result<(), StoreError> {
        check_court(court)?;
        check_slot(slot)?;
        self.member(id)
            .ok_or_else(|| StoreError::UnknownMember(id.to_string()))?;

        if self.courts[court][slot].as_deref() == Some(id) {
            return Ok(());
        }

        self.vacate_slot_of(id);
        let evicted = self.courts[court][slot].take();
        self.courts[court][slot] = Some(id.to_string());
        self.detach_from_waiting(id);
        if let Some(m) = self.member_mut(id) {
            m.status = MemberStatus::Playing;
        }

        if let Some(prev) = evicted {
            if let Some(m) = self.member_mut(&prev) {
                m.status = MemberStatus::Waiting;
            }
            self.enqueue_waiting(&prev);
        }
        Ok(())
    }

    /// Empty one slot, sending its occupant to the back of the waiting
    /// order. Returns the occupant's id, or `None` if the slot was empty.
    pub fn remove_from_slot(
        &mut self,
        court: usize,
        slot: usize,
    ) -> Result<Option<String>, StoreError> {
        check_court(court)?;
        check_slot(slot)?;
        let id = match self.courts[court][slot].take() {
            Some(id) => id,
            None => return Ok(None),
        };
        if let Some(m) = self.member_mut(&id) {
            m.status = MemberStatus::Waiting;
        }
        self.enqueue_waiting(&id);
        Ok(Some(id))
    }

    /// Fill the court's empty slots, lowest index first, from the waiting
    /// order stable-sorted by play count (fewest matches first). Returns how
    /// many slots were filled.
    pub fn auto_fill_slots(&mut self, court: usize) -> Result<usize, StoreError> {
        check_court(court)?;
        let mut candidates = self.fill_candidates().into_iter();
        let mut filled = 0;
        for slot in 0..SLOTS_PER_COURT {
            if self.courts[court][slot].is_some() {
                continue;
            }
            let id = match candidates.next() {
                Some(id) => id,
                None => break,
            };
            self.courts[court][slot] = Some(id.clone());
            self.detach_from_waiting(&id);
            if let Some(m) = self.member_mut(&id) {
                m.status = MemberStatus::Playing;
            }
            filled += 1;
        }
        Ok(filled)
    }

    /// Complete a match: every occupant's play count goes up by exactly one,
    /// then the court empties through [`Self::clear_court`]. An empty court
    /// is a no-op returning 0.
    pub fn finish_match(&mut self, court: usize) -> Result<usize, StoreError> {
        check_court(court)?;
        for slot in 0..SLOTS_PER_COURT {
            if let Some(id) = self.courts[court][slot].clone() {
                if let Some(m) = self.member_mut(&id) {
                    m.play_count += 1;
                }
            }
        }
        self.clear_court(court)
    }

    /// Abort a match: occupants return to the back of the waiting order in
    /// slot order, with no play-count credit. Returns how many left the
    /// court.
    pub fn clear_court(&mut self, court: usize) -> Result<usize, StoreError> {
        check_court(court)?;
        let departing: Vec<String> = self.courts[court].iter().flatten().cloned().collect();
        for id in &departing {
            if let Some(m) = self.member_mut(id) {
                m.status = MemberStatus::Waiting;
            }
            self.enqueue_waiting(id);
        }
        self.courts[court] = EMPTY_COURT;
        Ok(departing.len())
    }

    /// Whether a match is underway (any slot occupied).
    pub fn is_court_active(&self, court: usize) -> bool {
        self.courts
            .get(court)
            .map(|c| c.iter().any(|slot| slot.is_some()))
            .unwrap_or(false)
    }

    /// A court can auto-fill while it has an empty slot and anyone waits.
    pub fn can_auto_fill(&self, court: usize) -> bool {
        match self.courts.get(court) {
            Some(c) => c.iter().any(|slot| slot.is_none()) && !self.waiting_order.is_empty(),
            None => false,
        }
    }
}
