//! `/api/roster/*` routes — the add bar, the resting bench and member
//! lifecycle handlers.
//!
//! Adding accepts one name per line; a batch is rejected whole if any name
//! collides with the roster (or repeats within the batch), so the organizer
//! can fix the list instead of hunting for half-applied entries.

use crate::routes::board::{error_span, render_board, render_board_with_notice, respond};
use crate::routes::util::{html_escape, parse_delta, parse_form_body, require_param};
use crate::session::queue;
use crate::session::state::{SessionState, with_session, with_session_mut};

// ── POST /api/roster/add ───────────────────────────────────────────

/// Handle POST /api/roster/add
/// Body: name={one name per line}
/// Adds every listed name to the roster and the back of the queue.
pub fn handle_add_post(body: &str) -> String {
    let params = parse_form_body(body);
    let raw = match require_param(&params, "name") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    let names: Vec<&str> = raw
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();
    if names.is_empty() {
        return with_session(|s| render_board_with_notice(s, "Enter at least one name"));
    }

    let duplicates = with_session(|s| {
        let mut dups: Vec<&str> = Vec::new();
        for (i, &name) in names.iter().enumerate() {
            let taken = s.members.iter().any(|m| m.name == name) || names[..i].contains(&name);
            if taken && !dups.contains(&name) {
                dups.push(name);
            }
        }
        dups.iter().map(|d| d.to_string()).collect::<Vec<_>>()
    });
    if !duplicates.is_empty() {
        let notice = format!("Already in the roster: {}", duplicates.join(", "));
        return with_session(|s| render_board_with_notice(s, &notice));
    }

    with_session_mut(|s| {
        for name in &names {
            s.add_member(name);
        }
    });
    with_session(render_board)
}

// ── POST /api/roster/remove ────────────────────────────────────────

/// Handle POST /api/roster/remove
/// Body: id={member}
/// Drops the member entirely, shrinking the up-next prefix if they were in
/// it.
pub fn handle_remove_post(body: &str) -> String {
    let params = parse_form_body(body);
    let id = match require_param(&params, "id") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    let result = with_session_mut(|s| {
        let rank = s.waiting_rank(id);
        let len = s.waiting_order.len();
        s.remove_member(id)?;
        queue::note_prefix_departure(rank, len);
        Ok(())
    });
    respond(result)
}

// ── POST /api/roster/rest ──────────────────────────────────────────

/// Handle POST /api/roster/rest
/// Body: id={member}
/// Sends the member to the bench, with the same prefix bookkeeping as a
/// removal.
pub fn handle_rest_post(body: &str) -> String {
    let params = parse_form_body(body);
    let id = match require_param(&params, "id") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    let result = with_session_mut(|s| {
        let rank = s.waiting_rank(id);
        let len = s.waiting_order.len();
        s.move_to_rest(id)?;
        queue::note_prefix_departure(rank, len);
        Ok(())
    });
    respond(result)
}

// ── POST /api/roster/return ────────────────────────────────────────

/// Handle POST /api/roster/return
/// Body: id={member}
/// Back from the bench to the end of the waiting order.
pub fn handle_return_post(body: &str) -> String {
    let params = parse_form_body(body);
    let id = match require_param(&params, "id") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };
    respond(with_session_mut(|s| s.return_from_rest(id)))
}

// ── POST /api/roster/playcount ─────────────────────────────────────

/// Handle POST /api/roster/playcount
/// Body: id={member}&delta={signed}
/// Organizer correction of a member's play count, saturating at zero.
pub fn handle_playcount_post(body: &str) -> String {
    let params = parse_form_body(body);
    let id = match require_param(&params, "id") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };
    let delta = match parse_delta(&params, "delta") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };
    respond(with_session_mut(|s| s.adjust_play_count(id, delta).map(|_| ())))
}

// ── Resting panel rendering ────────────────────────────────────────

/// Render the resting bench. Empty bench renders nothing at all.
pub fn render_resting_panel(state: &SessionState) -> String {
    let resting = state.resting_members();
    if resting.is_empty() {
        return String::new();
    }

    let mut html = String::with_capacity(2048);
    html.push_str(r#"<div class="rounded-xl border border-slate-200 bg-white p-3 shadow-sm">"#);
    html.push_str(&format!(
        r#"<p class="text-sm font-bold text-slate-700 mb-2">😴 Resting <span class="ml-1 text-xs font-medium bg-slate-100 text-slate-500 rounded-full px-2 py-0.5">{}</span></p>"#,
        resting.len()
    ));
    html.push_str(r#"<div class="flex flex-col gap-1">"#);
    for m in &resting {
        html.push_str(&format!(
            concat!(
                r#"<div class="flex items-center gap-2 rounded-lg border border-slate-200 bg-slate-50 px-2 py-1.5">"#,
                r#"<span class="text-xl">{emoji}</span>"#,
                r#"<div class="flex-1 min-w-0"><p class="text-sm font-medium text-slate-600 truncate">{name}</p><p class="text-xs text-slate-400">🏸 {count}</p></div>"#,
                r#"<button class="text-xs font-bold text-emerald-600 hover:text-emerald-700 px-1.5 py-1 rounded hover:bg-emerald-50" onclick="htmx.ajax('POST', '/api/roster/return', {{values: {{id: '{id}'}}, target: '#board', swap: 'outerHTML'}})">Back to queue</button>"#,
                r#"<button class="text-xs text-red-400 hover:text-red-600 px-1.5 py-1 rounded hover:bg-red-50" onclick="htmx.ajax('POST', '/api/roster/remove', {{values: {{id: '{id}'}}, target: '#board', swap: 'outerHTML'}})">✕</button>"#,
                r#"</div>"#
            ),
            emoji = m.emoji,
            name = html_escape(&m.name),
            count = m.play_count,
            id = m.id
        ));
    }
    html.push_str(r#"</div></div>"#);
    html
}

// ── Add bar rendering ──────────────────────────────────────────────

/// Render the add-members bar. The board swap clears the textarea for free.
pub fn render_add_bar() -> String {
    let mut html = String::with_capacity(1024);
    html.push_str(r#"<div class="rounded-xl border border-slate-200 bg-white p-3 shadow-sm">"#);
    html.push_str(
        r#"<textarea id="new-member-names" rows="2" placeholder="Add players — one name per line" class="w-full border border-slate-200 rounded-lg px-3 py-2 text-sm text-slate-800 focus:border-emerald-500 focus:ring-emerald-500 resize-none"></textarea>"#,
    );
    html.push_str(
        r#"<button class="w-full mt-2 bg-emerald-600 hover:bg-emerald-700 active:bg-emerald-800 text-white font-bold py-2 px-4 rounded-lg text-sm" onclick="htmx.ajax('POST', '/api/roster/add', {values: {name: document.getElementById('new-member-names').value}, target: '#board', swap: 'outerHTML'})">➕ Add players</button>"#,
    );
    html.push_str(r#"</div>"#);
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{MemberStatus, replace_session, reset_session};

    fn reset() {
        reset_session();
        queue::clear_boundary();
    }

    fn seed(names: &[&str]) {
        let mut state = SessionState::default();
        for name in names {
            state.add_member(name);
        }
        replace_session(state);
    }

    #[test]
    fn add_post_batches_one_name_per_line() {
        reset();
        let html = handle_add_post("name=Alice%0ABob%0A%0A++Cara++");
        assert!(html.contains(r#"id="board""#));
        assert!(html.contains("Alice"));
        assert!(html.contains("Cara"));
        with_session(|s| {
            assert_eq!(s.members.len(), 3);
            assert_eq!(s.members[2].name, "Cara");
            assert_eq!(s.waiting_order.len(), 3);
        });
        reset();
    }

    #[test]
    fn add_post_rejects_batch_with_roster_duplicate() {
        reset();
        seed(&["Alice"]);
        let html = handle_add_post("name=Bob%0AAlice");
        assert!(html.contains("Already in the roster: Alice"));
        // Rejected whole: Bob was not added either.
        with_session(|s| assert_eq!(s.members.len(), 1));
        reset();
    }

    #[test]
    fn add_post_rejects_batch_internal_duplicate() {
        reset();
        let html = handle_add_post("name=Sam%0ASam");
        assert!(html.contains("Already in the roster: Sam"));
        with_session(|s| assert!(s.members.is_empty()));
        reset();
    }

    #[test]
    fn add_post_blank_input_notices() {
        reset();
        let html = handle_add_post("name=+%0A++");
        assert!(html.contains("Enter at least one name"));
        assert!(handle_add_post("").contains("missing &#39;name&#39;"));
        reset();
    }

    #[test]
    fn remove_post_drops_member_and_shrinks_prefix() {
        reset();
        seed(&["A", "B", "C"]);
        queue::set_boundary(2);
        let html = handle_remove_post("id=m1");
        assert!(html.contains(r#"id="board""#));
        with_session(|s| {
            assert!(s.member("m1").is_none());
            assert_eq!(queue::effective_boundary(s.waiting_order.len()), 1);
        });
        reset();
    }

    #[test]
    fn remove_post_unknown_member_notices_on_board() {
        reset();
        seed(&["A"]);
        let html = handle_remove_post("id=m9");
        assert!(html.contains("no member with id"));
        assert!(html.contains(r#"id="board""#)); // board survives the error
        reset();
    }

    #[test]
    fn rest_and_return_posts_roundtrip() {
        reset();
        seed(&["A", "B"]);
        handle_rest_post("id=m1");
        with_session(|s| {
            assert_eq!(s.member("m1").unwrap().status, MemberStatus::Resting);
        });
        handle_return_post("id=m1");
        with_session(|s| {
            assert_eq!(s.member("m1").unwrap().status, MemberStatus::Waiting);
            assert_eq!(s.waiting_order, vec!["m2".to_string(), "m1".to_string()]);
        });
        reset();
    }

    #[test]
    fn playcount_post_adjusts_and_clamps() {
        reset();
        seed(&["A"]);
        handle_playcount_post("id=m1&delta=2");
        handle_playcount_post("id=m1&delta=-5");
        with_session(|s| assert_eq!(s.member("m1").unwrap().play_count, 0));
        assert!(handle_playcount_post("id=m1&delta=x").contains("not a valid delta"));
        reset();
    }

    #[test]
    fn resting_panel_hidden_when_bench_empty() {
        reset();
        seed(&["A"]);
        let html = with_session(render_resting_panel);
        assert!(html.is_empty());
        reset();
    }

    #[test]
    fn resting_panel_lists_bench_with_return_hook() {
        reset();
        seed(&["Alice", "Bob"]);
        handle_rest_post("id=m2");
        let html = with_session(render_resting_panel);
        assert!(html.contains("Bob"));
        assert!(!html.contains("Alice"));
        assert!(html.contains("'/api/roster/return'"));
        assert!(html.contains("Back to queue"));
        reset();
    }

    #[test]
    fn add_bar_wires_textarea_to_add_route() {
        let html = render_add_bar();
        assert!(html.contains("new-member-names"));
        assert!(html.contains("'/api/roster/add'"));
        assert!(html.contains("one name per line"));
    }
}
