//! `/api/payment/*` routes — the fee-collection dialog.
//!
//! Collection is a tap-per-member affair: the dialog lists everyone with
//! their settled state, and the totals row keeps a running collected /
//! outstanding / total tally. Fee and paid toggles re-render only the
//! dialog; the board behind it never shows payment state.

use crate::routes::board::error_span;
use crate::routes::util::{html_escape, parse_form_body, require_param};
use crate::session::state::{SessionState, with_session, with_session_mut};

// ── GET /api/payment ───────────────────────────────────────────────

/// Handle GET /api/payment
/// The fee-collection dialog fragment, swapped into `#dialog`.
pub fn handle_payment_get(_query: &str) -> String {
    with_session(|s| render_payment_dialog(s, ""))
}

// ── POST /api/payment/fee ──────────────────────────────────────────

/// Handle POST /api/payment/fee
/// Body: fee={per-person amount}
/// Replaces the session fee. Zero or garbage is refused here; the store
/// itself takes any value.
pub fn handle_fee_post(body: &str) -> String {
    let params = parse_form_body(body);
    let raw = match require_param(&params, "fee") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    match raw.parse::<u32>() {
        Ok(fee) if fee > 0 => {
            with_session_mut(|s| s.set_session_fee(fee));
            with_session(|s| render_payment_dialog(s, ""))
        }
        _ => with_session(|s| render_payment_dialog(s, "Fee must be a positive number")),
    }
}

// ── POST /api/payment/toggle ───────────────────────────────────────

/// Handle POST /api/payment/toggle
/// Body: id={member}
/// Flips one member's settled state and re-renders the dialog.
pub fn handle_toggle_post(body: &str) -> String {
    let params = parse_form_body(body);
    let id = match require_param(&params, "id") {
        Ok(v) => v,
        Err(e) => return error_span(&e),
    };

    match with_session_mut(|s| s.toggle_paid(id)) {
        Ok(_) => with_session(|s| render_payment_dialog(s, "")),
        Err(e) => with_session(|s| render_payment_dialog(s, &e.to_string())),
    }
}

// ── Dialog rendering ───────────────────────────────────────────────

fn render_payment_dialog(state: &SessionState, notice: &str) -> String {
    let total_members = state.members.len();
    let paid_count = state.members.iter().filter(|m| m.paid).count();
    let unpaid_count = total_members - paid_count;
    let fee = state.session_fee as u64;
    let mut html = String::with_capacity(4096);

    html.push_str(
        r#"<div class="fixed inset-0 z-40 flex items-end sm:items-center justify-center bg-black/40" onclick="document.getElementById('dialog').innerHTML=''">"#,
    );
    html.push_str(
        r#"<div class="bg-white rounded-t-2xl sm:rounded-2xl w-full sm:max-w-sm max-h-[80vh] overflow-y-auto p-4" onclick="event.stopPropagation()">"#,
    );

    html.push_str(&format!(
        r#"<div class="flex items-center justify-between mb-1"><p class="text-base font-bold text-slate-800">💰 Collect fees <span class="text-sm font-normal text-slate-400">{} members</span></p><button class="text-slate-400 hover:text-slate-600 px-1" onclick="document.getElementById('dialog').innerHTML=''">✕</button></div>"#,
        total_members
    ));

    if !notice.is_empty() {
        html.push_str(&format!(
            r#"<div class="text-center text-xs text-red-600 mb-2">{}</div>"#,
            html_escape(notice)
        ));
    }

    html.push_str(&format!(
        r#"<div class="flex items-center gap-2 my-3"><label class="text-sm text-slate-500" for="fee-input">Fee per person</label><input id="fee-input" type="number" inputmode="numeric" pattern="[0-9]*" min="1" value="{}" class="w-24 border border-slate-200 rounded-lg px-2 py-1 text-sm text-slate-800 focus:border-emerald-500 focus:ring-emerald-500" onchange="htmx.ajax('POST', '/api/payment/fee', {{values: {{fee: this.value}}, target: '#dialog', swap: 'innerHTML'}})"></div>"#,
        state.session_fee
    ));

    if total_members == 0 {
        html.push_str(
            r#"<p class="text-sm text-slate-400 text-center py-6">Nobody to collect from yet</p>"#,
        );
        html.push_str(r#"</div></div>"#);
        return html;
    }

    if unpaid_count > 0 {
        html.push_str(&format!(
            r#"<p class="text-xs font-medium text-amber-600 mb-2">{} still to pay</p>"#,
            unpaid_count
        ));
    } else {
        html.push_str(r#"<p class="text-xs font-medium text-emerald-600 mb-2">All settled 🎉</p>"#);
    }

    html.push_str(r#"<div class="flex flex-col gap-1">"#);
    for m in &state.members {
        let state_chip = if m.paid {
            r#"<span class="text-xs font-bold text-emerald-600">✅ Paid</span>"#.to_string()
        } else {
            format!(r#"<span class="text-xs font-bold text-amber-600">💸 ${}</span>"#, fee)
        };
        html.push_str(&format!(
            r#"<button class="flex items-center gap-3 rounded-lg px-3 py-2 hover:bg-slate-50 active:bg-slate-100 text-left" onclick="htmx.ajax('POST', '/api/payment/toggle', {{values: {{id: '{id}'}}, target: '#dialog', swap: 'innerHTML'}})"><span class="text-xl">{emoji}</span><span class="flex-1 font-medium text-slate-800 truncate">{name}</span>{chip}</button>"#,
            id = m.id,
            emoji = m.emoji,
            name = html_escape(&m.name),
            chip = state_chip
        ));
    }
    html.push_str(r#"</div>"#);

    html.push_str(&format!(
        r#"<div class="border-t border-slate-100 mt-3 pt-3 grid grid-cols-3 text-center"><div><p class="text-xs text-slate-400">Collected</p><p class="text-sm font-bold text-emerald-600">${}</p></div><div><p class="text-xs text-slate-400">Outstanding</p><p class="text-sm font-bold text-amber-600">${}</p></div><div><p class="text-xs text-slate-400">Total</p><p class="text-sm font-bold text-slate-700">${}</p></div></div>"#,
        paid_count as u64 * fee,
        unpaid_count as u64 * fee,
        total_members as u64 * fee
    ));

    html.push_str(r#"</div></div>"#);
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{replace_session, reset_session};

    fn reset() {
        reset_session();
    }

    fn seed(names: &[&str]) {
        let mut state = SessionState::default();
        for name in names {
            state.add_member(name);
        }
        replace_session(state);
    }

    #[test]
    fn dialog_lists_members_with_settled_state() {
        reset();
        seed(&["Alice", "Bob"]);
        with_session_mut(|s| s.toggle_paid("m1")).unwrap();
        let html = handle_payment_get("");
        assert!(html.contains("Alice"));
        assert!(html.contains("Bob"));
        assert_eq!(html.matches("✅ Paid").count(), 1);
        assert_eq!(html.matches("💸 $200").count(), 1);
        assert!(html.contains("1 still to pay"));
        reset();
    }

    #[test]
    fn dialog_totals_add_up() {
        reset();
        seed(&["A", "B", "C"]);
        with_session_mut(|s| s.toggle_paid("m2")).unwrap();
        let html = handle_payment_get("");
        assert!(html.contains(r#"<p class="text-sm font-bold text-emerald-600">$200</p>"#));
        assert!(html.contains(r#"<p class="text-sm font-bold text-amber-600">$400</p>"#));
        assert!(html.contains(r#"<p class="text-sm font-bold text-slate-700">$600</p>"#));
        reset();
    }

    #[test]
    fn dialog_with_empty_roster() {
        reset();
        let html = handle_payment_get("");
        assert!(html.contains("Nobody to collect from yet"));
        reset();
    }

    #[test]
    fn dialog_celebrates_full_settlement() {
        reset();
        seed(&["A"]);
        with_session_mut(|s| s.toggle_paid("m1")).unwrap();
        let html = handle_payment_get("");
        assert!(html.contains("All settled"));
        reset();
    }

    #[test]
    fn fee_post_updates_dialog_and_store() {
        reset();
        seed(&["A"]);
        let html = handle_fee_post("fee=250");
        assert!(html.contains(r#"value="250""#));
        assert!(html.contains("💸 $250"));
        with_session(|s| assert_eq!(s.session_fee, 250));
        reset();
    }

    #[test]
    fn fee_post_refuses_nonpositive_input() {
        reset();
        seed(&["A"]);
        for body in ["fee=0", "fee=-50", "fee=abc"] {
            let html = handle_fee_post(body);
            assert!(html.contains("positive number"));
        }
        with_session(|s| assert_eq!(s.session_fee, 200)); // untouched
        assert!(handle_fee_post("").contains("missing &#39;fee&#39;"));
        reset();
    }

    #[test]
    fn toggle_post_flips_member() {
        reset();
        seed(&["Alice"]);
        handle_toggle_post("id=m1");
        with_session(|s| assert!(s.member("m1").unwrap().paid));
        let html = handle_toggle_post("id=m1");
        with_session(|s| assert!(!s.member("m1").unwrap().paid));
        assert!(html.contains("💸"));
        reset();
    }

    #[test]
    fn toggle_post_unknown_member_notices() {
        reset();
        seed(&["Alice"]);
        let html = handle_toggle_post("id=m9");
        assert!(html.contains("no member with id"));
        assert!(html.contains("Collect fees")); // dialog survives the error
        reset();
    }
}
