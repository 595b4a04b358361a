//! Chat transcript, state and session handling.
//!
//! [`ChatSession`] drives the conversation; [`ChatState`] is the owned record of
//! it. [`supervise`] runs one interactive turn so that a panic inside it is
//! reported instead of tearing down the prompt.

pub mod locale;
pub mod message;
pub mod session;
pub mod state;

pub use locale::{Locale, Notice};
pub use message::{Message, MessageMetadata, Role};
pub use session::ChatSession;
pub use state::{ChatState, ConnectionStatus};

use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Run `turn`, converting a panic into an error string.
pub async fn supervise<F: Future>(turn: F) -> Result<F::Output, String> {
    AssertUnwindSafe(turn)
        .catch_unwind()
        .await
        .map_err(|payload| {
            let reason = panic_message(payload.as_ref());
            tracing::error!(reason = %reason, "Chat turn panicked");
            reason
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
