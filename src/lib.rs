//! Parley - client library and terminal front end for a retrieval-augmented chat service
//!
//! The [`client`] module talks to the service, [`format`] renders and validates
//! message text, and [`chat`] keeps the conversation state. The remaining
//! modules support the `parley` binary.

pub mod auth;
pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod format;
pub mod logging;
pub mod storage;
