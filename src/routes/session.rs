//! `/api/session/*` routes — persistence and lifecycle for the whole store.
//!
//! The store lives in WASM memory; localStorage is the durable copy. The
//! page shell checkpoints after mutating actions (persist), restores on
//! load, and offers a file-based export/import pair for moving a session
//! between devices. Payloads travel as URL-safe base64 of the session
//! JSON, so they survive form bodies and storage untouched.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::routes::util::{get_param, html_escape, parse_form_body};
use crate::session::queue;
use crate::session::state::{
    STORAGE_KEY, export_session_json, export_session_json_pretty, import_session_json,
    reset_session, with_session,
};

// ── GET /api/session/state ─────────────────────────────────────────

/// Handle GET /api/session/state
/// The current session as pretty-printed JSON, for inspection.
pub fn handle_state_get(_query: &str) -> String {
    export_session_json_pretty()
}

// ── POST /api/session/persist ──────────────────────────────────────

/// Handle POST /api/session/persist
/// Returns a script that writes the encoded session under the storage
/// key. Called by the page shell after mutating actions.
pub fn handle_persist_post(_body: &str) -> String {
    format!(
        r#"<script>
(function() {{
  localStorage.setItem('{key}', '{state}');
  console.log('[courtside] Session saved');
}})();
</script>"#,
        key = STORAGE_KEY,
        state = encode_session_b64()
    )
}

// ── POST /api/session/restore ──────────────────────────────────────

/// Handle POST /api/session/restore
/// Body: state={base64} (or the raw base64 as the whole body)
/// Restores the store from a previously persisted payload. Called by the
/// page shell on load, before the first board render.
pub fn handle_restore_post(body: &str) -> String {
    let params = parse_form_body(body);
    let state_b64 = get_param(&params, "state").unwrap_or(body.trim());
    match restore_from_b64(state_b64) {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("error: {}", e),
    }
}

// ── GET /api/session/export ────────────────────────────────────────

/// Handle GET /api/session/export
/// Returns a <script> tag that triggers a file download of the encoded
/// session, for carrying it to another device.
pub fn handle_export_get(_query: &str) -> String {
    format!(
        r#"<script>
(function() {{
  var b = new Blob(['{state}'], {{type: 'text/plain'}});
  var a = document.createElement('a');
  a.href = URL.createObjectURL(b);
  a.download = 'courtside-session.txt';
  a.click();
  URL.revokeObjectURL(a.href);
  console.log('[courtside] Session exported');
}})();
</script>"#,
        state = encode_session_b64()
    )
}

// ── POST /api/session/import ───────────────────────────────────────

/// Handle POST /api/session/import
/// Accepts the base64 payload from an exported session file and makes it
/// the live store.
pub fn handle_import_post(body: &str) -> String {
    let params = parse_form_body(body);
    let state_b64 = get_param(&params, "state").unwrap_or(body.trim());
    match restore_from_b64(state_b64) {
        Ok(()) => r#"<span class="text-sm text-emerald-600">Session imported</span>"#.to_string(),
        // Parse errors echo payload text, so the message gets escaped.
        Err(e) => format!(
            r#"<span class="text-sm text-red-600">Import failed: {}</span>"#,
            html_escape(&e)
        ),
    }
}

// ── POST /api/session/reset ────────────────────────────────────────

/// Handle POST /api/session/reset
/// Wipes the store back to an empty session and returns the fresh board.
/// The caller is expected to follow up with a persist.
pub fn handle_reset_post(_body: &str) -> String {
    reset_session();
    queue::clear_boundary();
    with_session(crate::routes::board::render_board)
}

// ── Payload codec ──────────────────────────────────────────────────

fn encode_session_b64() -> String {
    URL_SAFE_NO_PAD.encode(export_session_json())
}

/// Decode and install a persisted payload. An empty payload is a no-op:
/// first visit, nothing stored yet. Any accepted payload starts with a
/// fresh next-match boundary; that marker is never persisted.
fn restore_from_b64(state_b64: &str) -> Result<(), String> {
    if state_b64.is_empty() {
        return Ok(());
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(state_b64)
        .map_err(|e| format!("base64 decode error: {}", e))?;
    let json = String::from_utf8(bytes).map_err(|_| "payload is not valid UTF-8".to_string())?;
    import_session_json(&json)?;
    queue::clear_boundary();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{SessionState, replace_session, with_session_mut};

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
    fn state_get_is_readable_json() {
        reset();
        seed(&["Alice"]);
        let json = handle_state_get("");
        assert!(json.contains('\n')); // pretty-printed
        assert!(json.contains(r#""sessionFee": 200"#));
        assert!(json.contains(r#""waitingOrder""#));
        assert!(json.contains("Alice"));
        reset();
    }

    #[test]
    fn persist_script_carries_the_encoded_session() {
        reset();
        seed(&["Alice", "Bob"]);
        let expected = URL_SAFE_NO_PAD.encode(export_session_json());
        let html = handle_persist_post("");
        assert!(html.contains("localStorage.setItem"));
        assert!(html.contains(STORAGE_KEY));
        assert!(html.contains(&expected));
        assert!(html.contains("[courtside] Session saved"));
        reset();
    }

    #[test]
    fn restore_roundtrip() {
        reset();
        seed(&["Alice", "Bob", "Cleo"]);
        with_session_mut(|s| s.assign_to_slot(1, 3, "m2")).unwrap();
        let payload = URL_SAFE_NO_PAD.encode(export_session_json());

        reset_session();
        assert_eq!(handle_restore_post(&format!("state={}", payload)), "ok");
        with_session(|s| {
            assert_eq!(s.members.len(), 3);
            assert_eq!(s.courts[1][3].as_deref(), Some("m2"));
            assert_eq!(s.waiting_order, vec!["m1", "m3"]);
        });
        reset();
    }

    #[test]
    fn restore_accepts_raw_body() {
        reset();
        seed(&["Alice"]);
        let payload = URL_SAFE_NO_PAD.encode(export_session_json());
        reset_session();
        assert_eq!(handle_restore_post(&payload), "ok");
        with_session(|s| assert_eq!(s.members.len(), 1));
        reset();
    }

    #[test]
    fn restore_of_nothing_is_a_noop() {
        reset();
        seed(&["Alice"]);
        assert_eq!(handle_restore_post(""), "ok");
        with_session(|s| assert_eq!(s.members.len(), 1)); // untouched
        reset();
    }

    #[test]
    fn restore_rejects_garbage_without_touching_the_store() {
        reset();
        seed(&["Alice"]);
        assert!(handle_restore_post("state=!!!not-base64!!!").starts_with("error:"));
        let bad_json = URL_SAFE_NO_PAD.encode("{\"members\": 42}");
        assert!(handle_restore_post(&format!("state={}", bad_json)).starts_with("error:"));
        with_session(|s| assert_eq!(s.members.len(), 1));
        reset();
    }

    #[test]
    fn restore_rejects_inconsistent_payload() {
        reset();
        let orphan_queue = r#"{"members":[],"sessionFee":200,"courts":[[null,null,null,null],[null,null,null,null]],"waitingOrder":["m7"]}"#;
        let payload = URL_SAFE_NO_PAD.encode(orphan_queue);
        assert!(handle_restore_post(&format!("state={}", payload)).starts_with("error:"));
        reset();
    }

    #[test]
    fn restore_starts_with_a_fresh_boundary() {
        reset();
        seed(&["A", "B", "C", "D", "E"]);
        queue::set_boundary(4);
        let payload = URL_SAFE_NO_PAD.encode(export_session_json());
        assert_eq!(handle_restore_post(&format!("state={}", payload)), "ok");
        assert_eq!(queue::effective_boundary(5), 0);
        reset();
    }

    #[test]
    fn export_script_downloads_the_session() {
        reset();
        seed(&["Alice"]);
        let expected = URL_SAFE_NO_PAD.encode(export_session_json());
        let html = handle_export_get("");
        assert!(html.contains("new Blob"));
        assert!(html.contains("courtside-session.txt"));
        assert!(html.contains(&expected));
        assert!(html.contains("[courtside] Session exported"));
        reset();
    }

    #[test]
    fn export_then_import_roundtrip() {
        reset();
        seed(&["Alice", "Bob"]);
        with_session_mut(|s| s.toggle_paid("m1")).unwrap();
        let payload = URL_SAFE_NO_PAD.encode(export_session_json());

        reset_session();
        let html = handle_import_post(&format!("state={}", payload));
        assert!(html.contains("Session imported"));
        with_session(|s| {
            assert_eq!(s.members.len(), 2);
            assert!(s.member("m1").unwrap().paid);
        });
        reset();
    }

    #[test]
    fn import_failure_is_a_red_span() {
        reset();
        let html = handle_import_post("state=???");
        assert!(html.contains("Import failed:"));
        assert!(html.contains("text-red-600"));

        // A bad enum variant echoes payload text in the parse error; it must
        // come back escaped.
        let sneaky = URL_SAFE_NO_PAD.encode(
            r#"{"members":[{"id":"m1","name":"A","emoji":"🦊","playCount":0,"status":"<b>","paid":false}],"sessionFee":200,"courts":[[null,null,null,null],[null,null,null,null]],"waitingOrder":["m1"]}"#,
        );
        let html = handle_import_post(&format!("state={}", sneaky));
        assert!(html.contains("Import failed:"));
        assert!(!html.contains("<b>"));
        reset();
    }

    #[test]
    fn reset_returns_a_fresh_board() {
        reset();
        seed(&["Alice", "Bob"]);
        queue::set_boundary(2);
        let html = handle_reset_post("");
        assert!(html.contains(r#"id="board""#));
        assert!(html.contains("0 members"));
        with_session(|s| {
            assert!(s.members.is_empty());
            assert_eq!(s.session_fee, 200);
        });
        assert_eq!(queue::effective_boundary(9), 0);
        reset();
    }
}
