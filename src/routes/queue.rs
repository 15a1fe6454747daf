//! `/api/queue/*` routes — the waiting panel and queue-order moves.
//!
//! The panel splits at the next-match boundary: an "up next" block (amber,
//! at most four members) above the substitutes. Promote/demote shuffle a
//! single member across the boundary; arrange fairness-sorts the whole
//! queue.

use crate::routes::board::{error_span, respond};
use crate::routes::util::{html_escape, parse_form_body, parse_id_list, require_param};
use crate::session::queue::{self, NEXT_MATCH_CAP};
use crate::session::state::{Member, SessionState, with_session_mut};

// ── POST /api/queue/reorder ────────────────────────────────────────

/// Handle POST /api/queue/reorder
/// Body: ids={m3,m1,m2} — the full new waiting order, front first.
/// Must be an exact permutation of the current queue (drag-drop bridge).
pub fn handle_reorder_post(body: &str) -> String {
    let params = parse_form_body(body);
    let raw = match require_param(&params, "ids") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };
    let ids = parse_id_list(raw);

    respond(with_session_mut(|s| s.reorder_waiting(&ids)))
}

// ── POST /api/queue/promote ────────────────────────────────────────

/// Handle POST /api/queue/promote
/// Body: id={member}
/// Moves a substitute to the end of the up-next block.
pub fn handle_promote_post(body: &str) -> String {
    let params = parse_form_body(body);
    let id = match require_param(&params, "id") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    respond(with_session_mut(|s| queue::promote(s, id)))
}

// ── POST /api/queue/demote ─────────────────────────────────────────

/// Handle POST /api/queue/demote
/// Body: id={member}
/// Drops an up-next member to the back of the substitutes.
pub fn handle_demote_post(body: &str) -> String {
    let params = parse_form_body(body);
    let id = match require_param(&params, "id") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    respond(with_session_mut(|s| queue::demote(s, id)))
}

// ── POST /api/queue/arrange ────────────────────────────────────────

/// Handle POST /api/queue/arrange
/// Fairness-sorts the whole queue by play count and marks the first four
/// as the upcoming match.
pub fn handle_arrange_post(_body: &str) -> String {
    respond(with_session_mut(queue::auto_arrange))
}

// ── Waiting panel rendering ────────────────────────────────────────

/// Render the waiting panel: count badge, arrange button, up-next block,
/// substitutes.
pub fn render_waiting_panel(state: &SessionState) -> String {
    let waiting = state.waiting_members();
    let eb = queue::effective_boundary(waiting.len());
    let prefix_full = eb >= NEXT_MATCH_CAP;
    let mut html = String::with_capacity(4096);

    html.push_str(r#"<div class="rounded-xl border border-slate-200 bg-white p-3 shadow-sm">"#);
    html.push_str(&format!(
        r#"<div class="flex items-center justify-between mb-2"><p class="text-sm font-bold text-slate-700">⏳ Waiting <span class="ml-1 text-xs font-medium bg-slate-100 text-slate-500 rounded-full px-2 py-0.5">{}</span></p>"#,
        waiting.len()
    ));
    // Arranging only helps while the up-next block has room and someone
    // is left to pull in.
    if !prefix_full && waiting.len() > eb {
        html.push_str(
            r#"<button class="text-xs font-bold text-amber-600 hover:text-amber-700" onclick="htmx.ajax('POST', '/api/queue/arrange', {target: '#board', swap: 'outerHTML'})">✨ Auto-arrange</button>"#,
        );
    }
    html.push_str(r#"</div>"#);

    if waiting.is_empty() {
        html.push_str(
            r#"<p class="text-sm text-slate-400 text-center py-4">Nobody waiting — everyone is on court or resting</p>"#,
        );
        html.push_str(r#"</div>"#);
        return html;
    }

    html.push_str(r#"<div class="flex flex-col gap-1">"#);
    for (rank, m) in waiting.iter().enumerate() {
        if eb > 0 && rank == 0 {
            html.push_str(r#"<p class="text-xs font-bold text-amber-600">🎯 Next match</p>"#);
        }
        if eb > 0 && rank == eb {
            html.push_str(r#"<p class="text-xs font-bold text-slate-400 mt-2">🪑 Substitutes</p>"#);
        }
        html.push_str(&render_waiting_card(m, rank, rank < eb, prefix_full));
    }
    html.push_str(r#"</div></div>"#);
    html
}

fn render_waiting_card(m: &Member, rank: usize, up_next: bool, prefix_full: bool) -> String {
    let card_style = if up_next {
        "bg-amber-50 border-amber-300"
    } else {
        "bg-white border-slate-200"
    };
    let mut html = String::with_capacity(1024);

    html.push_str(&format!(
        r#"<div class="flex items-center gap-2 rounded-lg border px-2 py-1.5 {}">"#,
        card_style
    ));
    html.push_str(&format!(
        r#"<span class="text-xs font-bold text-slate-400 w-5 text-center">{}</span><span class="text-xl">{}</span>"#,
        rank + 1,
        m.emoji
    ));

    // Name + play-count adjusters.
    html.push_str(&format!(
        concat!(
            r#"<div class="flex-1 min-w-0"><p class="text-sm font-medium text-slate-800 truncate">{name}</p>"#,
            r#"<p class="text-xs text-slate-400 flex items-center gap-1">🏸"#,
            r#"<button class="px-1 hover:text-slate-600" onclick="htmx.ajax('POST', '/api/roster/playcount', {{values: {{id: '{id}', delta: '-1'}}, target: '#board', swap: 'outerHTML'}})">−</button>"#,
            r#"{count}"#,
            r#"<button class="px-1 hover:text-slate-600" onclick="htmx.ajax('POST', '/api/roster/playcount', {{values: {{id: '{id}', delta: '1'}}, target: '#board', swap: 'outerHTML'}})">+</button>"#,
            r#"</p></div>"#
        ),
        name = html_escape(&m.name),
        id = m.id,
        count = m.play_count
    ));

    if up_next {
        html.push_str(&format!(
            r#"<button class="text-xs font-medium text-slate-500 hover:text-slate-700 px-1.5 py-1 rounded hover:bg-slate-100" onclick="htmx.ajax('POST', '/api/queue/demote', {{values: {{id: '{}'}}, target: '#board', swap: 'outerHTML'}})">Substitute</button>"#,
            m.id
        ));
    } else if !prefix_full {
        html.push_str(&format!(
            r#"<button class="text-xs font-bold text-amber-600 hover:text-amber-700 px-1.5 py-1 rounded hover:bg-amber-50" onclick="htmx.ajax('POST', '/api/queue/promote', {{values: {{id: '{}'}}, target: '#board', swap: 'outerHTML'}})">Next match</button>"#,
            m.id
        ));
    }
    html.push_str(&format!(
        r#"<button class="text-xs text-slate-400 hover:text-slate-600 px-1.5 py-1 rounded hover:bg-slate-100" onclick="htmx.ajax('POST', '/api/roster/rest', {{values: {{id: '{}'}}, target: '#board', swap: 'outerHTML'}})">Rest</button>"#,
        m.id
    ));
    html.push_str(&format!(
        r#"<button class="text-xs text-red-400 hover:text-red-600 px-1.5 py-1 rounded hover:bg-red-50" onclick="htmx.ajax('POST', '/api/roster/remove', {{values: {{id: '{}'}}, target: '#board', swap: 'outerHTML'}})">✕</button>"#,
        m.id
    ));

    html.push_str(r#"</div>"#);
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{replace_session, reset_session, with_session};

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
    fn panel_splits_at_boundary() {
        reset();
        seed(&["A", "B", "C", "D", "E"]);
        queue::set_boundary(2);
        let html = with_session(render_waiting_panel);
        assert!(html.contains("Next match"));
        assert!(html.contains("Substitutes"));
        assert_eq!(html.matches("bg-amber-50 border-amber-300").count(), 2);
        // Ranks render 1-based.
        assert!(html.contains(r#"w-5 text-center">1<"#));
        assert!(html.contains(r#"w-5 text-center">5<"#));
        reset();
    }

    #[test]
    fn panel_without_boundary_has_no_sections() {
        reset();
        seed(&["A", "B"]);
        let html = with_session(render_waiting_panel);
        assert!(!html.contains("Next match</p>"));
        assert!(!html.contains("Substitutes"));
        assert!(html.contains("Auto-arrange"));
        reset();
    }

    #[test]
    fn panel_hides_promote_when_prefix_full() {
        reset();
        seed(&["A", "B", "C", "D", "E"]);
        queue::set_boundary(4);
        let html = with_session(render_waiting_panel);
        assert!(!html.contains("'/api/queue/promote'"));
        assert_eq!(html.matches("'/api/queue/demote'").count(), 4);
        reset();
    }

    #[test]
    fn empty_queue_renders_hint() {
        reset();
        let html = with_session(render_waiting_panel);
        assert!(html.contains("Nobody waiting"));
        assert!(!html.contains("Auto-arrange"));
        reset();
    }

    #[test]
    fn arrange_button_needs_room_and_substitutes() {
        reset();
        seed(&["A", "B", "C", "D", "E"]);
        queue::set_boundary(2);
        assert!(with_session(render_waiting_panel).contains("Auto-arrange"));
        // Up-next block already at cap: nothing for arranging to pull in.
        queue::set_boundary(4);
        assert!(!with_session(render_waiting_panel).contains("Auto-arrange"));
        // Everyone already up next: nobody left to sort forward.
        seed(&["A", "B", "C"]);
        queue::set_boundary(3);
        assert!(!with_session(render_waiting_panel).contains("Auto-arrange"));
        reset();
    }

    #[test]
    fn reorder_post_applies_permutation() {
        reset();
        seed(&["A", "B", "C"]);
        let html = handle_reorder_post("ids=m3%2Cm1%2Cm2");
        assert!(html.contains(r#"id="board""#));
        with_session(|s| {
            assert_eq!(
                s.waiting_order,
                vec!["m3".to_string(), "m1".to_string(), "m2".to_string()]
            );
        });
        reset();
    }

    #[test]
    fn reorder_post_rejects_non_permutation() {
        reset();
        seed(&["A", "B"]);
        let html = handle_reorder_post("ids=m1");
        assert!(html.contains("session state conflict"));
        with_session(|s| assert_eq!(s.waiting_order.len(), 2));
        reset();
    }

    #[test]
    fn promote_and_demote_posts_move_members() {
        reset();
        seed(&["A", "B", "C", "D", "E"]);
        queue::set_boundary(2);

        handle_promote_post("id=m4");
        with_session(|s| {
            assert_eq!(s.waiting_rank("m4"), Some(2));
            assert_eq!(queue::effective_boundary(s.waiting_order.len()), 3);
        });

        handle_demote_post("id=m1");
        with_session(|s| {
            assert_eq!(s.waiting_rank("m1"), Some(4));
            assert_eq!(queue::effective_boundary(s.waiting_order.len()), 2);
        });
        reset();
    }

    #[test]
    fn promote_post_rejects_seated_member() {
        reset();
        seed(&["A", "B"]);
        with_session_mut(|s| s.assign_to_slot(0, 0, "m1")).unwrap();
        let html = handle_promote_post("id=m1");
        assert!(html.contains("not in the waiting order"));
        reset();
    }

    #[test]
    fn arrange_post_sorts_and_marks_prefix() {
        reset();
        seed(&["A", "B", "C", "D", "E"]);
        with_session_mut(|s| s.adjust_play_count("m1", 5)).unwrap();

        let html = handle_arrange_post("");
        assert!(html.contains(r#"id="board""#));
        with_session(|s| {
            assert_eq!(s.waiting_rank("m1"), Some(4)); // most-played drops back
            assert_eq!(queue::effective_boundary(s.waiting_order.len()), 4);
        });
        reset();
    }
}
