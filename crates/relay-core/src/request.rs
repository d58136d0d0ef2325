//! Inbound requests.
//!
//! Every adapter defines its own [`Request`] type: it carries the raw text
//! plus whatever the adapter needs to answer (a socket, a mailbox address, a
//! terminal handle). Handlers only ever see the trait object.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AdapterResult;

/// A single inbound message and the channel back to its origin.
///
/// Requests are immutable once created and are dropped after dispatch.
#[async_trait]
pub trait Request: Send + Sync {
    /// The raw message text.
    fn message(&self) -> &str;

    /// The originating user, when the medium has one.
    fn user(&self) -> Option<&str> {
        None
    }

    /// Sends `text` back through the adapter that produced this request.
    ///
    /// May be called any number of times, including zero.
    async fn respond(&self, text: &str) -> AdapterResult<()>;
}

/// A shared request trait object.
pub type BoxedRequest = Arc<dyn Request>;

/// What an adapter hands to the [`Dispatcher`](crate::Dispatcher).
///
/// The exit signal is its own variant, so no message text can ever be
/// mistaken for it.
#[derive(Clone)]
pub enum Inbound {
    /// A routable message.
    Request(BoxedRequest),
    /// Shut the bot down. No handler runs.
    Exit,
}

impl Inbound {
    /// Wraps a concrete request.
    pub fn request<R: Request + 'static>(request: R) -> Self {
        Self::Request(Arc::new(request))
    }

    /// Returns `true` for the exit signal.
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exit)
    }
}

impl From<BoxedRequest> for Inbound {
    fn from(request: BoxedRequest) -> Self {
        Self::Request(request)
    }
}

impl fmt::Debug for Inbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(r) => f.debug_tuple("Request").field(&r.message()).finish(),
            Self::Exit => f.write_str("Exit"),
        }
    }
}
