//! `/api/court/*` routes — court cards, the slot picker and the match flow.
//!
//! Each court renders as a portrait SVG (net horizontal, team A on top).
//! Occupied slots carry an unassign badge; empty slots open the picker
//! dialog. Finish runs the full rotation: credit the players, send them to
//! the back of the queue, refill from the fairest candidates and re-arm the
//! up-next prefix.

use crate::routes::board::{error_span, respond};
use crate::routes::util::{html_escape, parse_form_body, parse_index, parse_query, require_param};
use crate::session::queue;
use crate::session::state::{COURT_COUNT, SessionState, with_session, with_session_mut};

// ── Court geometry ─────────────────────────────────────────────────
// Portrait viewBox 0 20 400 400. Net compressed (non-proportional) so the
// slot circles get room.

const COURT_X: i32 = 60;
const COURT_Y: i32 = 30;
const COURT_W: i32 = 280;
const COURT_H: i32 = 360;
const NET_Y: i32 = COURT_Y + COURT_H / 2; // 210
const CENTER_X: i32 = COURT_X + COURT_W / 2; // 200
const TOP_SSL: i32 = NET_Y - 55; // short service lines
const BOT_SSL: i32 = NET_Y + 55;
const TOP_LSL: i32 = COURT_Y + 20; // long service lines
const BOT_LSL: i32 = COURT_Y + COURT_H - 20;
const LEFT_SGL: i32 = COURT_X + 21; // singles sidelines
const RIGHT_SGL: i32 = COURT_X + COURT_W - 21;

/// Slot centers: A-left, A-right, B-left, B-right.
const SLOT_POS: [(i32, i32); 4] = [(140, 102), (259, 102), (140, 317), (259, 317)];

/// Ring colors for the two sides of the net.
const TEAM_COLORS: [&str; 2] = ["#F59E0B", "#3B82F6"];

// ── GET /api/court/picker ──────────────────────────────────────────

/// Handle GET /api/court/picker?court={i}&slot={j}
/// Dialog fragment listing every waiting member for an empty slot.
pub fn handle_picker_get(query: &str) -> String {
    let params = parse_query(query);
    let court = match parse_index(&params, "court") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };
    let slot = match parse_index(&params, "slot") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };
    with_session(|s| render_picker(s, court, slot))
}

fn render_picker(state: &SessionState, court: usize, slot: usize) -> String {
    let waiting = state.waiting_members();
    let mut html = String::with_capacity(2048);

    html.push_str(
        r#"<div class="fixed inset-0 z-40 flex items-end sm:items-center justify-center bg-black/40" onclick="document.getElementById('dialog').innerHTML=''">"#,
    );
    html.push_str(
        r#"<div class="bg-white rounded-t-2xl sm:rounded-2xl w-full sm:max-w-sm max-h-[70vh] overflow-y-auto p-4" onclick="event.stopPropagation()">"#,
    );
    html.push_str(&format!(
        r#"<p class="text-base font-bold text-slate-800 mb-3">Who plays? <span class="text-sm font-normal text-slate-400">Court {} · slot {}</span></p>"#,
        court + 1,
        slot + 1
    ));

    if waiting.is_empty() {
        html.push_str(
            r#"<p class="text-sm text-slate-400 text-center py-6">Nobody is waiting right now</p>"#,
        );
    } else {
        html.push_str(r#"<div class="flex flex-col gap-1">"#);
        for m in &waiting {
            html.push_str(&format!(
                r#"<button class="flex items-center gap-3 rounded-lg px-3 py-2 hover:bg-emerald-50 active:bg-emerald-100 text-left" onclick="htmx.ajax('POST', '/api/court/assign', {{values: {{id: '{id}', court: '{court}', slot: '{slot}'}}, target: '#board', swap: 'outerHTML'}}); document.getElementById('dialog').innerHTML=''"><span class="text-2xl">{emoji}</span><span class="flex-1 font-medium text-slate-800">{name}</span><span class="text-xs text-slate-400">🏸 {count}</span><span class="text-xs font-bold text-emerald-600">Play</span></button>"#,
                id = m.id,
                court = court,
                slot = slot,
                emoji = m.emoji,
                name = html_escape(&m.name),
                count = m.play_count
            ));
        }
        html.push_str(r#"</div>"#);
    }

    html.push_str(
        r#"<button class="w-full mt-3 py-2 rounded-lg text-sm text-slate-500 hover:bg-slate-100" onclick="document.getElementById('dialog').innerHTML=''">Cancel</button>"#,
    );
    html.push_str(r#"</div></div>"#);
    html
}

// ── POST /api/court/assign ─────────────────────────────────────────

/// Handle POST /api/court/assign
/// Body: id={member}&court={i}&slot={j}
/// Seats the member (evicting any occupant to the back of the queue) and
/// shrinks the up-next prefix if the member was part of it.
pub fn handle_assign_post(body: &str) -> String {
    let params = parse_form_body(body);
    let id = match require_param(&params, "id") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };
    let court = match parse_index(&params, "court") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };
    let slot = match parse_index(&params, "slot") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    respond(with_session_mut(|s| {
        let rank = s.waiting_rank(id);
        let len = s.waiting_order.len();
        s.assign_to_slot(court, slot, id)?;
        queue::note_prefix_departure(rank, len);
        Ok(())
    }))
}

// ── POST /api/court/unassign ───────────────────────────────────────

/// Handle POST /api/court/unassign
/// Body: court={i}&slot={j}
/// Sends the occupant to the back of the waiting order. Empty slot is fine.
pub fn handle_unassign_post(body: &str) -> String {
    let params = parse_form_body(body);
    let court = match parse_index(&params, "court") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };
    let slot = match parse_index(&params, "slot") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    respond(with_session_mut(|s| s.remove_from_slot(court, slot)).map(|_| ()))
}

// ── POST /api/court/autofill ───────────────────────────────────────

/// Handle POST /api/court/autofill
/// Body: court={i}
/// Seats the fairest waiting members into the empty slots, then re-arms the
/// up-next prefix over whoever still waits.
pub fn handle_autofill_post(body: &str) -> String {
    let params = parse_form_body(body);
    let court = match parse_index(&params, "court") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    respond(with_session_mut(|s| {
        s.auto_fill_slots(court)?;
        queue::reset_for_refill(s.waiting_order.len());
        Ok(())
    }))
}

// ── POST /api/court/finish ─────────────────────────────────────────

/// Handle POST /api/court/finish
/// Body: court={i}
/// Full rotation: credit and release the players, refill the court from the
/// fairest candidates, fairness-sort the rest and re-arm the prefix.
pub fn handle_finish_post(body: &str) -> String {
    let params = parse_form_body(body);
    let court = match parse_index(&params, "court") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    respond(with_session_mut(|s| {
        s.finish_match(court)?;
        s.auto_fill_slots(court)?;
        queue::auto_arrange(s)
    }))
}

// ── POST /api/court/clear ──────────────────────────────────────────

/// Handle POST /api/court/clear
/// Body: court={i}
/// Aborts the match: players return to the queue with no play credit.
pub fn handle_clear_post(body: &str) -> String {
    let params = parse_form_body(body);
    let court = match parse_index(&params, "court") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    respond(with_session_mut(|s| s.clear_court(court)).map(|_| ()))
}

// ── Court rendering ────────────────────────────────────────────────

/// Render the two court cards side by side.
pub fn render_courts_section(state: &SessionState) -> String {
    let mut html = String::with_capacity(8192);
    html.push_str(r#"<div class="grid grid-cols-1 sm:grid-cols-2 gap-4">"#);
    for court in 0..COURT_COUNT {
        html.push_str(&render_court_card(state, court));
    }
    html.push_str(r#"</div>"#);
    html
}

fn render_court_card(state: &SessionState, court: usize) -> String {
    let active = state.is_court_active(court);
    let fillable = state.can_auto_fill(court);
    let mut html = String::with_capacity(8192);

    html.push_str(r#"<div class="rounded-xl border border-slate-200 bg-white p-3 shadow-sm">"#);
    html.push_str(&format!(
        r#"<div class="flex items-center justify-between mb-2"><p class="text-sm font-bold text-slate-700">Court {}</p>{}</div>"#,
        court + 1,
        if active {
            r#"<span class="text-xs font-medium text-emerald-600">● in play</span>"#
        } else {
            r#"<span class="text-xs text-slate-400">idle</span>"#
        }
    ));

    html.push_str(&render_court_svg(state, court));

    html.push_str(r#"<div class="flex gap-2 mt-2">"#);
    if active {
        html.push_str(&format!(
            r#"<button class="flex-1 bg-emerald-600 hover:bg-emerald-700 active:bg-emerald-800 text-white font-bold py-2 px-3 rounded-lg text-sm" onclick="htmx.ajax('POST', '/api/court/finish', {{values: {{court: '{0}'}}, target: '#board', swap: 'outerHTML'}})">🏆 Finish &amp; rotate</button>"#,
            court
        ));
        html.push_str(&format!(
            r#"<button class="bg-slate-100 hover:bg-slate-200 text-slate-600 font-medium py-2 px-3 rounded-lg text-sm" onclick="htmx.ajax('POST', '/api/court/clear', {{values: {{court: '{0}'}}, target: '#board', swap: 'outerHTML'}})">🗑 Clear</button>"#,
            court
        ));
    }
    if fillable {
        html.push_str(&format!(
            r#"<button class="flex-1 bg-amber-500 hover:bg-amber-600 text-white font-bold py-2 px-3 rounded-lg text-sm" onclick="htmx.ajax('POST', '/api/court/autofill', {{values: {{court: '{0}'}}, target: '#board', swap: 'outerHTML'}})">⚡ Fill court</button>"#,
            court
        ));
    }
    html.push_str(r#"</div>"#);

    html.push_str(r#"</div>"#);
    html
}

fn render_court_svg(state: &SessionState, court: usize) -> String {
    let mut html = String::with_capacity(6144);

    html.push_str(
        r#"<svg viewBox="0 20 400 400" xmlns="http://www.w3.org/2000/svg" class="w-full drop-shadow" aria-label="badminton court">"#,
    );
    html.push_str(&format!(
        r##"<defs><pattern id="net-mesh-{0}" width="7" height="7" patternUnits="userSpaceOnUse"><path d="M 0 0 L 7 7 M 7 0 L 0 7" stroke="#2a2a2a" stroke-width="0.7" fill="none"/></pattern></defs>"##,
        court
    ));

    // Surface and outer boundary.
    html.push_str(&format!(
        r##"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="#2E8B57" rx="6"/><rect x="{x}" y="{y}" width="{w}" height="{h}" fill="none" stroke="white" stroke-width="3" rx="6"/>"##,
        x = COURT_X,
        y = COURT_Y,
        w = COURT_W,
        h = COURT_H
    ));

    // Singles sidelines, service lines, center lines.
    for (x1, y1, x2, y2) in [
        (LEFT_SGL, COURT_Y, LEFT_SGL, COURT_Y + COURT_H),
        (RIGHT_SGL, COURT_Y, RIGHT_SGL, COURT_Y + COURT_H),
        (COURT_X, TOP_LSL, COURT_X + COURT_W, TOP_LSL),
        (COURT_X, BOT_LSL, COURT_X + COURT_W, BOT_LSL),
        (COURT_X, TOP_SSL, COURT_X + COURT_W, TOP_SSL),
        (COURT_X, BOT_SSL, COURT_X + COURT_W, BOT_SSL),
        (CENTER_X, COURT_Y, CENTER_X, TOP_SSL),
        (CENTER_X, BOT_SSL, CENTER_X, COURT_Y + COURT_H),
    ] {
        html.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="white" stroke-width="2"/>"#,
            x1, y1, x2, y2
        ));
    }

    // Net: posts, mesh body, white tape.
    html.push_str(&format!(
        r##"<rect x="{px1}" y="{py}" width="12" height="6" fill="#555" rx="3"/><rect x="{px2}" y="{py}" width="12" height="6" fill="#555" rx="3"/><circle cx="{px1}" cy="{net}" r="5" fill="#444"/><circle cx="{cx2}" cy="{net}" r="5" fill="#444"/>"##,
        px1 = COURT_X - 12,
        px2 = COURT_X + COURT_W,
        py = NET_Y - 3,
        net = NET_Y,
        cx2 = COURT_X + COURT_W + 12
    ));
    html.push_str(&format!(
        r##"<rect x="{x}" y="{y}" width="{w}" height="12" fill="url(#net-mesh-{court})" stroke="#222" stroke-width="1.5"/><rect x="{tx}" y="{ty}" width="{tw}" height="8" fill="white" stroke="#ddd" stroke-width="1" rx="3"/>"##,
        x = COURT_X,
        y = NET_Y - 6,
        w = COURT_W,
        court = court,
        tx = COURT_X - 2,
        ty = NET_Y - 4,
        tw = COURT_W + 4
    ));

    for (slot, (x, y)) in SLOT_POS.iter().enumerate() {
        html.push_str(&render_slot(state, court, slot, *x, *y));
    }

    html.push_str(r#"</svg>"#);
    html
}

fn render_slot(state: &SessionState, court: usize, slot: usize, x: i32, y: i32) -> String {
    let occupant = state.courts[court][slot]
        .as_deref()
        .and_then(|id| state.member(id));
    let team_color = TEAM_COLORS[if slot < 2 { 0 } else { 1 }];

    match occupant {
        Some(m) => format!(
            concat!(
                r#"<g>"#,
                r#"<circle cx="{x}" cy="{y}" r="36" fill="{color}" opacity="0.25"/>"#,
                r#"<circle cx="{x}" cy="{y}" r="30" fill="rgba(255,255,255,0.92)" stroke="{color}" stroke-width="3"/>"#,
                r#"<text x="{x}" y="{ey}" text-anchor="middle" font-size="26">{emoji}</text>"#,
                r#"<g style="cursor:pointer" onclick="htmx.ajax('POST', '/api/court/unassign', {{values: {{court: '{court}', slot: '{slot}'}}, target: '#board', swap: 'outerHTML'}})">"#,
                r##"<circle cx="{bx}" cy="{by}" r="11" fill="#EF4444" stroke="white" stroke-width="2"/>"##,
                r#"<text x="{bx}" y="{bty}" text-anchor="middle" fill="white" font-size="14" font-weight="700">×</text>"#,
                r#"</g>"#,
                r##"<text x="{x}" y="{ny}" text-anchor="middle" font-size="11" font-weight="700" stroke="#1a5c35" stroke-width="3" paint-order="stroke" fill="white">{name}</text>"##,
                r#"</g>"#
            ),
            x = x,
            y = y,
            ey = y + 10,
            color = team_color,
            emoji = m.emoji,
            court = court,
            slot = slot,
            bx = x + 22,
            by = y - 20,
            bty = y - 15,
            ny = y + 48,
            name = html_escape(&m.name)
        ),
        None => format!(
            concat!(
                r#"<g style="cursor:pointer" onclick="htmx.ajax('GET', '/api/court/picker', {{values: {{court: '{court}', slot: '{slot}'}}, target: '#dialog', swap: 'innerHTML'}})">"#,
                r#"<circle cx="{x}" cy="{y}" r="30" fill="rgba(255,255,255,0.12)" stroke="rgba(255,255,255,0.45)" stroke-width="2" stroke-dasharray="6 4"/>"#,
                r#"<text x="{x}" y="{py}" text-anchor="middle" fill="rgba(255,255,255,0.5)" font-size="20">+</text>"#,
                r#"<text x="{x}" y="{ly}" text-anchor="middle" fill="rgba(255,255,255,0.4)" font-size="10" font-weight="500">open</text>"#,
                r#"</g>"#
            ),
            court = court,
            slot = slot,
            x = x,
            y = y,
            py = y + 5,
            ly = y + 48
        ),
    }
}
