//! HTML-fragment route handlers — one module per URL prefix, plus shared
//! form/query parsing helpers. Every handler takes the raw query or body
//! string and returns a fragment for HTMX to swap into the DOM.

pub mod board;
pub mod courts;
pub mod payment;
pub mod queue;
pub mod roster;
pub mod session;
pub mod util;
