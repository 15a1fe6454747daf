//! The session board — the one fragment almost every route swaps back in.
//!
//! Court actions, queue actions, and roster actions all mutate the store
//! and then answer with the whole `#board` so the header counts, court
//! cards, and queue panels can never drift apart. Domain errors ride the
//! same fragment as a notice banner instead of replacing the target.

use crate::routes::util::html_escape;
use crate::routes::{courts, queue, roster};
use crate::session::state::{SessionState, StoreError, with_session};

/// Handle GET /api/board
/// The full session board, rendered from the current store.
pub fn handle_board_get(_query: &str) -> String {
    with_session(render_board)
}

/// The shared answer for board-targeted mutations: the fresh board on
/// success, the board plus a notice for a store error. The store call ran
/// inside `with_session_mut`, so whatever it left behind is what renders.
pub(crate) fn respond(result: Result<(), StoreError>) -> String {
    match result {
        Ok(()) => with_session(render_board),
        Err(e) => with_session(|s| render_board_with_notice(s, &e.to_string())),
    }
}

/// A bare inline error for malformed requests. Swapped into whatever
/// target the caller aimed at, so it stays a lone span. Messages echo
/// request values, so they get escaped like member names do.
pub(crate) fn error_span(msg: &str) -> String {
    format!(
        r#"<span class="text-sm text-red-600">{}</span>"#,
        html_escape(msg)
    )
}

pub fn render_board(state: &SessionState) -> String {
    render_board_with_notice(state, "")
}

/// Render the board with an optional notice banner pinned under the
/// header. Used by handlers whose store call came back with an error:
/// the board re-renders from whatever state survived, message on top.
pub fn render_board_with_notice(state: &SessionState, notice: &str) -> String {
    let mut html = String::with_capacity(16384);
    html.push_str(r#"<div id="board" class="max-w-md mx-auto px-3 pt-4 pb-24 flex flex-col gap-4">"#);

    html.push_str(&render_header(state));

    if !notice.is_empty() {
        html.push_str(&format!(
            r#"<div class="rounded-xl border border-red-200 bg-red-50 px-3 py-2 text-sm text-red-600">{}</div>"#,
            html_escape(notice)
        ));
    }

    html.push_str(&courts::render_courts_section(state));

    if !state.courts.iter().any(|c| c.iter().any(Option::is_some))
        && state.waiting_order.len() < 2
        && !state.members.is_empty()
    {
        html.push_str(
            r#"<p class="rounded-xl border border-dashed border-slate-200 px-3 py-2 text-center text-xs text-slate-400">Need at least 2 players to start</p>"#,
        );
    }

    html.push_str(&queue::render_waiting_panel(state));
    html.push_str(&roster::render_resting_panel(state));
    html.push_str(&roster::render_add_bar());

    html.push_str("</div>");
    html
}

fn render_header(state: &SessionState) -> String {
    let status = if state.courts.iter().any(|c| c.iter().any(Option::is_some)) {
        "Match in progress"
    } else {
        "Waiting to start"
    };
    format!(
        r#"<div class="flex items-center justify-between"><div><p class="text-lg font-extrabold text-slate-800">🏸 Courtside</p><p class="text-xs text-slate-400">{count} member{plural} · {status}</p></div><button class="rounded-full bg-amber-100 text-amber-700 text-sm font-bold px-3 py-1.5 hover:bg-amber-200" onclick="htmx.ajax('GET', '/api/payment', {{target: '#dialog', swap: 'innerHTML'}})">💰 Collect</button></div>"#,
        count = state.members.len(),
        plural = if state.members.len() == 1 { "" } else { "s" },
        status = status
    )
}
