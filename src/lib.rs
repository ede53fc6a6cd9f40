/// Per-user token balances, including the initial-grant logic applied when
/// a user is first seen.
pub mod balance;

/// Typed requests for ledger operations, validated before any state changes.
pub mod command;

/// Transfer records and their lifecycle states.
pub mod transfer;

/// The ordered transfer history and its pending/approved/rejected
/// transitions.
pub mod ledger;

/// Bookkeeping for the currently logged-in user.
pub mod session;

/// Key-value persistence interface, plus in-memory and JSON-file adapters.
pub mod storage;

/// Application state container. Coordinates session, balances and transfer
/// history, hydrating them from storage once and writing every mutation
/// through.
pub mod app;

/// Could live in its own crate as the binary bootstrap, but staying here
/// lets the integration tests reuse it.
pub mod bin_utils;
