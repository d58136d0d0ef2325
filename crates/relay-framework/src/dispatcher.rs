//! The dispatch core.
//!
//! The [`Router`] owns the ordered binding list of every loaded plugin and is
//! the [`Dispatcher`] all adapters call into. For each inbound message:
//!
//! 1. [`Inbound::Exit`] sets the exiting flag. No handler runs.
//! 2. Otherwise bindings are tried **in registration order**; the first whose
//!    pattern matches the start of the message runs, and no other does.
//! 3. If none matches, the request is answered with [`unknown_command`].
//!
//! A handler that returns a value instead of responding fails the dispatch
//! with [`DispatchError::InvalidHandlerContract`]; a handler that returns
//! `Err` fails it with [`DispatchError::Handler`]. Neither is swallowed.
//!
//! Overlapping patterns are not detected. If `"find"` is registered before
//! `"find me (?P<what>.*)"`, the second can never match.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{BoxedRequest, DispatchError, DispatchResult, Dispatcher, Inbound};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, info};

use crate::capability::Binding;
use crate::routing::HandlerOutcome;

/// Renders the reply sent when no binding matches `message`.
pub fn unknown_command(message: &str) -> String {
    format!("I don't know command \"{message}\".")
}

/// The central message router.
///
/// Bindings are fixed at construction and read without locking, so one
/// `Router` can serve any number of concurrent dispatches.
#[derive(Debug, Clone)]
pub struct Router {
    bindings: Arc<[Binding]>,
    exit: CancellationToken,
}

impl Router {
    /// Creates a router over `bindings`, which are tried in the given order.
    pub fn new(bindings: Vec<Binding>) -> Self {
        Self {
            bindings: bindings.into(),
            exit: CancellationToken::new(),
        }
    }

    /// Returns the bindings in dispatch order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Returns `true` once the exit signal has been dispatched.
    pub fn is_exiting(&self) -> bool {
        self.exit.is_cancelled()
    }

    /// Returns a token that is cancelled when the exit signal arrives.
    pub fn exit_token(&self) -> CancellationToken {
        self.exit.clone()
    }

    /// Routes one request.
    pub async fn route(&self, request: BoxedRequest) -> DispatchResult<()> {
        let message = request.message();

        let Some((binding, captures)) = self
            .bindings
            .iter()
            .find_map(|b| b.captures(message).map(|caps| (b, caps)))
        else {
            debug!(text = message, "No pattern matched");
            request.respond(&unknown_command(message)).await?;
            return Ok(());
        };

        debug!(
            plugin = binding.plugin(),
            pattern = binding.pattern(),
            "Pattern matched"
        );

        let outcome = binding
            .invoke(Arc::clone(&request), captures)
            .instrument(debug_span!("handler", plugin = binding.plugin()))
            .await;

        match outcome {
            HandlerOutcome::Done => Ok(()),
            HandlerOutcome::Returned(returned) => Err(DispatchError::InvalidHandlerContract {
                plugin: binding.plugin().to_owned(),
                pattern: binding.pattern().to_owned(),
                returned,
            }),
            HandlerOutcome::Failed(source) => Err(DispatchError::Handler {
                plugin: binding.plugin().to_owned(),
                pattern: binding.pattern().to_owned(),
                source: source.into(),
            }),
        }
    }
}

#[async_trait]
impl Dispatcher for Router {
    async fn dispatch(&self, inbound: Inbound) -> DispatchResult<()> {
        match inbound {
            Inbound::Exit => {
                info!("Exit signal received");
                self.exit.cancel();
                Ok(())
            }
            Inbound::Request(request) => self.route(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::collect;
    use crate::plugin::{Plugin, Routable};
    use crate::routing::{Captures, Routes};
    use parking_lot::Mutex;
    use relay_core::{AdapterResult, Request};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    #[derive(Default)]
    struct Recorded {
        message: String,
        replies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Request for Recorded {
        fn message(&self) -> &str {
            &self.message
        }

        async fn respond(&self, text: &str) -> AdapterResult<()> {
            self.replies.lock().push(text.to_owned());
            Ok(())
        }
    }

    fn request(message: &str) -> Arc<Recorded> {
        Arc::new(Recorded {
            message: message.to_owned(),
            ..Default::default()
        })
    }

    async fn send(router: &Router, message: &str) -> (DispatchResult<()>, Vec<String>) {
        let req = request(message);
        let result = router.dispatch(Inbound::Request(req.clone())).await;
        let replies = req.replies.lock().clone();
        (result, replies)
    }

    struct Cats;

    impl Cats {
        async fn show(self: Arc<Self>, request: BoxedRequest, _: Captures) -> anyhow::Result<()> {
            request.respond("the Cat").await?;
            Ok(())
        }

        async fn find(self: Arc<Self>, request: BoxedRequest, caps: Captures) -> anyhow::Result<()> {
            let this = caps.get("this").unwrap_or_default();
            request.respond(&format!("I found {this}")).await?;
            Ok(())
        }

        async fn chatty(self: Arc<Self>, _: BoxedRequest, _: Captures) -> String {
            "Hello world".into()
        }

        async fn broken(self: Arc<Self>, _: BoxedRequest, _: Captures) -> anyhow::Result<()> {
            anyhow::bail!("database is gone")
        }
    }

    impl Routable for Cats {
        fn routes(self: Arc<Self>) -> Routes {
            Routes::builder(self)
                .route_with_doc("show me a cat", "Shows a cat.", Cats::show)
                .route("find (?P<this>.*)", Cats::find)
                .route("hello", Cats::chatty)
                .route("break", Cats::broken)
                .build()
        }
    }

    impl Plugin for Cats {}

    fn cats_router() -> Router {
        Router::new(collect("cats", Arc::new(Cats)).unwrap())
    }

    #[tokio::test]
    async fn test_scenario_cat_find_unknown() {
        let router = cats_router();

        let (result, replies) = send(&router, "show me a cat").await;
        assert_ok!(result);
        assert_eq!(replies, ["the Cat"]);

        let (result, replies) = send(&router, "find Umputun").await;
        assert_ok!(result);
        assert_eq!(replies, ["I found Umputun"]);

        let (result, replies) = send(&router, "unknown thing").await;
        assert_ok!(result);
        assert_eq!(replies, ["I don't know command \"unknown thing\"."]);
    }

    #[tokio::test]
    async fn test_unknown_command_echoes_any_input() {
        let router = Router::new(Vec::new());
        for message in ["", "blah minor", "Find me", "\"quoted\"", "многоязычный"] {
            let (result, replies) = send(&router, message).await;
            assert_ok!(result);
            assert_eq!(replies, [unknown_command(message)]);
        }
    }

    #[tokio::test]
    async fn test_returning_a_value_violates_contract() {
        let router = cats_router();
        let (result, replies) = send(&router, "hello").await;

        assert!(replies.is_empty());
        match assert_err!(result) {
            DispatchError::InvalidHandlerContract {
                plugin,
                pattern,
                returned,
            } => {
                assert_eq!(plugin, "cats");
                assert_eq!(pattern, "hello");
                assert_eq!(returned, "Hello world");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let router = cats_router();
        let (result, _) = send(&router, "break").await;
        let err = assert_err!(result);
        assert!(matches!(err, DispatchError::Handler { .. }));
        assert!(err.to_string().contains("database is gone"));
    }

    struct Counter {
        hits: Arc<AtomicUsize>,
        bump: usize,
    }

    impl Counter {
        async fn hit(self: Arc<Self>, _: BoxedRequest, _: Captures) {
            self.hits.fetch_add(self.bump, Ordering::SeqCst);
        }
    }

    impl Routable for Counter {
        fn routes(self: Arc<Self>) -> Routes {
            Routes::builder(self).route("find", Counter::hit).build()
        }
    }

    impl Plugin for Counter {}

    #[tokio::test]
    async fn test_first_registered_binding_wins() {
        let hits = Arc::new(AtomicUsize::new(0));
        let first = Arc::new(Counter {
            hits: Arc::clone(&hits),
            bump: 1,
        });
        let second = Arc::new(Counter {
            hits: Arc::clone(&hits),
            bump: 100,
        });

        let mut bindings = collect("first", first).unwrap();
        bindings.extend(collect("second", second).unwrap());
        let router = Router::new(bindings);

        let (result, replies) = send(&router, "find something").await;
        assert_ok!(result);
        assert!(replies.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exit_sets_flag_without_running_handlers() {
        let router = cats_router();
        let token = router.exit_token();
        assert!(!router.is_exiting());

        assert_ok!(router.dispatch(Inbound::Exit).await);

        assert!(router.is_exiting());
        assert!(token.is_cancelled());
    }
}
