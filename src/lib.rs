//! Courtside in-browser WASM server.
//!
//! Exports `handle_request(method, path, query, body)` for the Service Worker
//! bridge to call. Uses `matchit` for URL routing — the same router
//! engine that powers Axum.
//!
//! The store is one badminton session: the member roster, two courts of
//! four slots, the waiting queue with its volatile next-match prefix, and
//! the per-person fee ledger. Mutating routes answer with the full board
//! fragment so the header counts, court cards and queue panels can never
//! drift apart.

use wasm_bindgen::prelude::*;

pub mod routes;
pub mod session;

/// Process an HTTP-like request and return an HTML fragment.
///
/// Called from JavaScript (Web Worker) via wasm-bindgen.
///
/// # Arguments
/// * `method` — HTTP method (e.g., "GET", "POST")
/// * `path`   — URL path (e.g., "/api/court/assign")
/// * `query`  — Query string (e.g., "?court=0&slot=2")
/// * `body`   — Request body (e.g., POST form data). Empty string for GET requests.
///
/// # Returns
/// An HTML string fragment suitable for HTMX to swap into the DOM.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    // Build the router. matchit compiles route patterns into a radix tree.
    let mut router = matchit::Router::new();

    // Register routes — the value is a &str tag we match on below
    router.insert("/api/board", "board").ok();

    // Court and match-flow routes
    router.insert("/api/court/picker", "court_picker").ok();
    router.insert("/api/court/assign", "court_assign").ok();
    router.insert("/api/court/unassign", "court_unassign").ok();
    router.insert("/api/court/autofill", "court_autofill").ok();
    router.insert("/api/court/finish", "court_finish").ok();
    router.insert("/api/court/clear", "court_clear").ok();

    // Roster routes
    router.insert("/api/roster/add", "roster_add").ok();
    router.insert("/api/roster/remove", "roster_remove").ok();
    router.insert("/api/roster/rest", "roster_rest").ok();
    router.insert("/api/roster/return", "roster_return").ok();
    router.insert("/api/roster/playcount", "roster_playcount").ok();

    // Waiting-queue routes
    router.insert("/api/queue/reorder", "queue_reorder").ok();
    router.insert("/api/queue/promote", "queue_promote").ok();
    router.insert("/api/queue/demote", "queue_demote").ok();
    router.insert("/api/queue/arrange", "queue_arrange").ok();

    // Fee-collection routes
    router.insert("/api/payment", "payment").ok();
    router.insert("/api/payment/toggle", "payment_toggle").ok();
    router.insert("/api/payment/fee", "payment_fee").ok();

    // Session persistence routes
    router.insert("/api/session/state", "session_state").ok();
    router.insert("/api/session/persist", "session_persist").ok();
    router.insert("/api/session/restore", "session_restore").ok();
    router.insert("/api/session/export", "session_export").ok();
    router.insert("/api/session/import", "session_import").ok();
    router.insert("/api/session/reset", "session_reset").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            // GET routes
            ("board", "GET") => routes::board::handle_board_get(query),
            ("court_picker", "GET") => routes::courts::handle_picker_get(query),
            ("payment", "GET") => routes::payment::handle_payment_get(query),
            ("session_state", "GET") => routes::session::handle_state_get(query),
            ("session_export", "GET") => routes::session::handle_export_get(query),

            // POST routes
            ("court_assign", "POST") => routes::courts::handle_assign_post(body),
            ("court_unassign", "POST") => routes::courts::handle_unassign_post(body),
            ("court_autofill", "POST") => routes::courts::handle_autofill_post(body),
            ("court_finish", "POST") => routes::courts::handle_finish_post(body),
            ("court_clear", "POST") => routes::courts::handle_clear_post(body),
            ("roster_add", "POST") => routes::roster::handle_add_post(body),
            ("roster_remove", "POST") => routes::roster::handle_remove_post(body),
            ("roster_rest", "POST") => routes::roster::handle_rest_post(body),
            ("roster_return", "POST") => routes::roster::handle_return_post(body),
            ("roster_playcount", "POST") => routes::roster::handle_playcount_post(body),
            ("queue_reorder", "POST") => routes::queue::handle_reorder_post(body),
            ("queue_promote", "POST") => routes::queue::handle_promote_post(body),
            ("queue_demote", "POST") => routes::queue::handle_demote_post(body),
            ("queue_arrange", "POST") => routes::queue::handle_arrange_post(body),
            ("payment_toggle", "POST") => routes::payment::handle_toggle_post(body),
            ("payment_fee", "POST") => routes::payment::handle_fee_post(body),
            ("session_persist", "POST") => routes::session::handle_persist_post(body),
            ("session_restore", "POST") => routes::session::handle_restore_post(body),
            ("session_import", "POST") => routes::session::handle_import_post(body),
            ("session_reset", "POST") => routes::session::handle_reset_post(body),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    r#"<span class="text-sm text-red-600">404 — route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-sm text-red-600">405 — method not allowed</span>"#.to_string()
}
