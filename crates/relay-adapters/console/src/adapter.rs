//! The console adapter.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{
    Adapter, AdapterContext, AdapterDescriptor, AdapterResult, Dispatcher, Inbound, Request,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::ConsoleSettings;

type Output = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// Descriptor registered under the name `console`.
pub static CONSOLE_ADAPTER: AdapterDescriptor = AdapterDescriptor {
    name: "console",
    create: ConsoleAdapter::create,
};

/// Talks to the bot through a terminal.
pub struct ConsoleAdapter {
    dispatcher: Arc<dyn Dispatcher>,
    settings: ConsoleSettings,
    user: String,
    output: Output,
}

impl ConsoleAdapter {
    fn create(ctx: AdapterContext) -> AdapterResult<Arc<dyn Adapter>> {
        let settings: ConsoleSettings = ctx.settings()?;
        Ok(Arc::new(Self::new(
            ctx.dispatcher,
            settings,
            tokio::io::stdout(),
        )))
    }

    /// Creates an adapter that writes prompts and responses to `output`.
    pub fn new<W>(dispatcher: Arc<dyn Dispatcher>, settings: ConsoleSettings, output: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let user = settings.resolve_user();
        Self {
            dispatcher,
            settings,
            user,
            output: Arc::new(Mutex::new(Box::new(output))),
        }
    }

    /// Reads requests from `input` until it ends or an exit command, then
    /// sends the exit signal.
    ///
    /// Lines are dispatched one at a time, in order, with only the line
    /// terminator removed. Blank lines are skipped. A failed dispatch is
    /// logged and reported on the output.
    pub async fn serve<R>(&self, input: R)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        loop {
            self.prompt().await;

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Console input closed");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Failed to read console input");
                    break;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if self.settings.is_exit(trimmed) {
                break;
            }

            let request = ConsoleRequest {
                message: line,
                user: self.user.clone(),
                output: Arc::clone(&self.output),
            };
            if let Err(e) = self.dispatcher.dispatch(Inbound::request(request)).await {
                error!(error = %e, "Failed to handle console request");
                if let Err(e) = write_line(&self.output, &format!("Error: {e}")).await {
                    warn!(error = %e, "Failed to report console error");
                }
            }
        }

        info!("Console session ended");
        if let Err(e) = self.dispatcher.dispatch(Inbound::Exit).await {
            error!(error = %e, "Failed to deliver exit signal");
        }
    }

    async fn prompt(&self) {
        if self.settings.prompt.is_empty() {
            return;
        }
        let mut out = self.output.lock().await;
        if let Err(e) = out.write_all(self.settings.prompt.as_bytes()).await {
            debug!(error = %e, "Failed to write console prompt");
            return;
        }
        if let Err(e) = out.flush().await {
            debug!(error = %e, "Failed to flush console prompt");
        }
    }
}

#[async_trait]
impl Adapter for ConsoleAdapter {
    fn name(&self) -> &str {
        "console"
    }

    async fn start(self: Arc<Self>) -> AdapterResult<()> {
        tokio::spawn(async move {
            self.serve(BufReader::new(tokio::io::stdin())).await;
        });
        Ok(())
    }
}

/// One console line.
pub struct ConsoleRequest {
    message: String,
    user: String,
    output: Output,
}

#[async_trait]
impl Request for ConsoleRequest {
    fn message(&self) -> &str {
        &self.message
    }

    fn user(&self) -> Option<&str> {
        Some(&self.user)
    }

    async fn respond(&self, text: &str) -> AdapterResult<()> {
        write_line(&self.output, text).await
    }
}

async fn write_line(output: &Output, text: &str) -> AdapterResult<()> {
    let mut out = output.lock().await;
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{DispatchError, DispatchResult};
    use std::io;
    use std::pin::Pin;
    use std::sync::Mutex as StdMutex;
    use std::task::{Context, Poll};

    #[derive(Clone, Default)]
    struct Captured(Arc<StdMutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl AsyncWrite for Captured {
        fn poll_write(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Echoes `<user>: <message>`, fails on `fail`, and records exits.
    #[derive(Default)]
    struct Echo {
        exits: StdMutex<usize>,
    }

    #[async_trait]
    impl Dispatcher for Echo {
        async fn dispatch(&self, inbound: Inbound) -> DispatchResult<()> {
            match inbound {
                Inbound::Exit => *self.exits.lock().unwrap() += 1,
                Inbound::Request(request) => {
                    if request.message() == "fail" {
                        return Err(DispatchError::InvalidHandlerContract {
                            plugin: "echo".into(),
                            pattern: "fail".into(),
                            returned: "oops".into(),
                        });
                    }
                    let user = request.user().unwrap_or("?");
                    request
                        .respond(&format!("{user}: {}", request.message()))
                        .await?;
                }
            }
            Ok(())
        }
    }

    fn adapter(echo: Arc<Echo>, prompt: &str) -> (ConsoleAdapter, Captured) {
        let captured = Captured::default();
        let settings = ConsoleSettings {
            prompt: prompt.to_string(),
            user: Some("alice".into()),
            ..Default::default()
        };
        (ConsoleAdapter::new(echo, settings, captured.clone()), captured)
    }

    #[tokio::test]
    async fn test_lines_dispatched_in_order_until_eof() {
        let echo = Arc::new(Echo::default());
        let (console, out) = adapter(Arc::clone(&echo), "");

        console.serve(&b"show me a cat\n\n   \nfind x\n"[..]).await;

        assert_eq!(out.text(), "alice: show me a cat\nalice: find x\n");
        assert_eq!(*echo.exits.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_line_text_is_not_trimmed() {
        let echo = Arc::new(Echo::default());
        let (console, out) = adapter(Arc::clone(&echo), "");

        console.serve(&b"  todo y \r\n  quit  \nlater\n"[..]).await;

        assert_eq!(out.text(), "alice:   todo y \n");
        assert_eq!(*echo.exits.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_exit_command_stops_reading() {
        let echo = Arc::new(Echo::default());
        let (console, out) = adapter(Arc::clone(&echo), "");

        console.serve(&b"one\nquit\ntwo\n"[..]).await;

        assert_eq!(out.text(), "alice: one\n");
        assert_eq!(*echo.exits.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_error_is_reported_and_session_continues() {
        let echo = Arc::new(Echo::default());
        let (console, out) = adapter(Arc::clone(&echo), "");

        console.serve(&b"fail\nok\n"[..]).await;

        let text = out.text();
        assert!(text.starts_with("Error: "));
        assert!(text.ends_with("alice: ok\n"));
    }

    #[tokio::test]
    async fn test_prompt_before_each_read() {
        let echo = Arc::new(Echo::default());
        let (console, out) = adapter(echo, "> ");

        console.serve(&b"hi\n"[..]).await;

        assert_eq!(out.text(), "> alice: hi\n> ");
    }

    struct Broken;

    impl AsyncWrite for Broken {
        fn poll_write(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
            _: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_write_failures_do_not_end_session() {
        let echo = Arc::new(Echo::default());
        let settings = ConsoleSettings {
            prompt: "> ".into(),
            user: Some("alice".into()),
            ..Default::default()
        };
        let console = ConsoleAdapter::new(echo.clone(), settings, Broken);

        console.serve(&b"fail\nhi\n"[..]).await;

        assert_eq!(*echo.exits.lock().unwrap(), 1);
    }

    #[test]
    fn test_descriptor_name() {
        assert_eq!(CONSOLE_ADAPTER.name, "console");
    }
}
