//! Reminder plugin for Relay.
//!
//! ```text
//! > remind me in 10 min to stretch
//! ok
//! > my reminders
//! 3f9a07c2) 2026-10-16 09:40 stretch
//! ...
//! > 3f9a done
//! ok
//! ```
//!
//! A reminder due while the session is open is delivered as:
//!
//! ```text
//! Reminder: stretch (3f9a07c2)
//! ```
//!
//! Reminders live in the plugin's store, one list per user, so they survive
//! a restart. A background worker checks for due reminders and delivers each
//! one exactly once, through the last request the user sent in this session.
//!
//! ```toml
//! plugins = ["reminder"]
//!
//! [settings.reminder]
//! check_interval_secs = 5
//! ```

mod entry;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use relay::core::{BoxError, BoxedRequest, Store, StoreError, StoreResult};
use relay::framework::{Captures, Plugin, PluginContext, PluginDescriptor, Worker, WorkerSlot};
use relay_framework::routes;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

pub use entry::{Entry, parse_delay};

/// Descriptor registered under the name `reminder`.
pub static REMINDER_PLUGIN: PluginDescriptor = PluginDescriptor {
    name: "reminder",
    create: Reminder::create,
};

/// Settings read from `[settings.reminder]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// How often due reminders are looked up.
    pub check_interval_secs: u64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            check_interval_secs: 5,
        }
    }
}

/// Outcome of [`Reminder::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancel {
    Removed,
    NotFound,
    /// This many reminders start with the given id.
    Ambiguous(usize),
}

pub struct Reminder {
    store: Store,
    /// Last request per user; reminders are answered through it.
    listeners: Mutex<HashMap<String, BoxedRequest>>,
    /// Serializes read-modify-write cycles on the store.
    edit: Mutex<()>,
    worker: WorkerSlot,
}

impl Reminder {
    fn create(ctx: PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
        let settings: ReminderSettings = ctx.settings()?;
        if settings.check_interval_secs == 0 {
            return Err("check_interval_secs must be greater than 0".into());
        }

        let plugin = Arc::new(Self::new(ctx.store.clone(), ctx.worker_slot()));
        plugin.worker.start(
            Arc::clone(&plugin),
            Duration::from_secs(settings.check_interval_secs),
        );
        Ok(plugin)
    }

    /// Creates the plugin without starting its worker.
    pub fn new(store: Store, worker: WorkerSlot) -> Self {
        Self {
            store,
            listeners: Mutex::new(HashMap::new()),
            edit: Mutex::new(()),
            worker,
        }
    }

    /// Stops the background worker.
    pub fn stop(&self) {
        self.worker.stop();
    }

    /// Pending reminders of `user`, earliest first.
    pub fn entries(&self, user: &str) -> StoreResult<Vec<Entry>> {
        let mut entries: Vec<Entry> = match self.store.get_as(user) {
            Ok(entries) => entries,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        entries.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    /// Adds a reminder for `user`.
    pub fn schedule(&self, user: &str, due: OffsetDateTime, text: &str) -> StoreResult<Entry> {
        let entry = Entry::new(due, text);
        let _guard = self.edit.lock();
        let mut entries = self.entries(user)?;
        entries.push(entry.clone());
        self.store.set(user, &entries)?;
        Ok(entry)
    }

    /// Removes the reminder of `user` whose id is `prefix`, or the only one
    /// whose id starts with it. Nothing is removed when several match.
    pub fn cancel(&self, user: &str, prefix: &str) -> StoreResult<Cancel> {
        let _guard = self.edit.lock();
        let mut entries = self.entries(user)?;
        let index = match entries.iter().position(|e| e.id == prefix) {
            Some(index) => index,
            None => {
                let mut matches = entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.id.starts_with(prefix));
                match (matches.next(), matches.count()) {
                    (None, _) => return Ok(Cancel::NotFound),
                    (Some((index, _)), 0) => index,
                    (Some(_), rest) => return Ok(Cancel::Ambiguous(rest + 1)),
                }
            }
        };
        entries.remove(index);
        self.store.set(user, &entries)?;
        Ok(Cancel::Removed)
    }

    /// Delivers every reminder due at `now` to users seen in this session
    /// and removes it. Returns the number delivered.
    pub async fn deliver_due(&self, now: OffsetDateTime) -> anyhow::Result<usize> {
        let mut outgoing = Vec::new();
        {
            let _guard = self.edit.lock();
            let listeners = self.listeners.lock();
            for user in self.store.keys() {
                let Some(request) = listeners.get(&user) else {
                    continue;
                };
                let (due, pending): (Vec<Entry>, Vec<Entry>) = self
                    .entries(&user)?
                    .into_iter()
                    .partition(|e| e.due <= now);
                if due.is_empty() {
                    continue;
                }
                self.store.set(&user, &pending)?;
                outgoing.extend(due.into_iter().map(|e| (Arc::clone(request), e)));
            }
        }

        let delivered = outgoing.len();
        for (request, entry) in outgoing {
            let text = format!("Reminder: {} ({})", entry.text, entry.id);
            if let Err(e) = request.respond(&text).await {
                warn!(id = %entry.id, error = %e, "Failed to deliver reminder");
            }
        }
        Ok(delivered)
    }

    fn listen(&self, user: &str, request: &BoxedRequest) {
        self.listeners
            .lock()
            .insert(user.to_string(), Arc::clone(request));
    }
}

fn user_of(request: &BoxedRequest) -> String {
    request.user().unwrap_or("anonymous").to_string()
}

#[routes]
impl Reminder {
    /// Sets a reminder.
    #[route(r"remind me in (?P<amount>\d+) ?(?P<unit>seconds?|secs?|s|minutes?|mins?|m|hours?|h) to (?P<what>.+)")]
    async fn add(self: Arc<Self>, request: BoxedRequest, caps: Captures) -> anyhow::Result<()> {
        let user = user_of(&request);
        let amount = caps.get("amount").unwrap_or_default();
        let unit = caps.get("unit").unwrap_or_default();
        let Some(due) = parse_delay(amount, unit)
            .and_then(|delay| OffsetDateTime::now_utc().checked_add(delay))
        else {
            request.respond("That is too far away.").await?;
            return Ok(());
        };

        let what = caps.get("what").unwrap_or_default();
        let entry = self.schedule(&user, due, what)?;
        debug!(user = %user, id = %entry.id, "Reminder scheduled");

        self.listen(&user, &request);
        request.respond("ok").await?;
        Ok(())
    }

    /// Lists your reminders.
    #[route("my reminders")]
    async fn list(self: Arc<Self>, request: BoxedRequest, _: Captures) -> anyhow::Result<()> {
        let user = user_of(&request);
        self.listen(&user, &request);

        let entries = self.entries(&user)?;
        if entries.is_empty() {
            request.respond("You have no reminders.").await?;
            return Ok(());
        }
        let lines = entries
            .iter()
            .map(Entry::listing_line)
            .collect::<Result<Vec<_>, _>>()?;
        request.respond(&lines.join("\n")).await?;
        Ok(())
    }

    /// Cancels a reminder by id.
    #[route("(?P<id>[0-9a-f]+) done")]
    async fn done(self: Arc<Self>, request: BoxedRequest, caps: Captures) -> anyhow::Result<()> {
        let user = user_of(&request);
        let reply = match self.cancel(&user, caps.get("id").unwrap_or_default())? {
            Cancel::Removed => "ok".to_string(),
            Cancel::NotFound => "No such reminder.".to_string(),
            Cancel::Ambiguous(n) => format!("{n} reminders match that id, use more of it."),
        };
        request.respond(&reply).await?;
        Ok(())
    }
}

impl Plugin for Reminder {}

#[async_trait]
impl Worker for Reminder {
    fn worker_name(&self) -> &str {
        "reminder"
    }

    async fn do_job(&self) -> anyhow::Result<()> {
        let delivered = self.deliver_due(OffsetDateTime::now_utc()).await?;
        if delivered > 0 {
            debug!(delivered, "Reminders delivered");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay::core::{AdapterResult, Dispatcher, Inbound, Request};
    use relay::framework::{Router, collect};
    use time::macros::datetime;

    struct Line {
        text: String,
        user: String,
        replies: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Request for Line {
        fn message(&self) -> &str {
            &self.text
        }

        fn user(&self) -> Option<&str> {
            Some(&self.user)
        }

        async fn respond(&self, text: &str) -> AdapterResult<()> {
            self.replies.lock().push(text.to_owned());
            Ok(())
        }
    }

    struct Harness {
        plugin: Arc<Reminder>,
        router: Router,
        replies: Arc<Mutex<Vec<String>>>,
    }

    impl Harness {
        fn new() -> Self {
            let plugin = Arc::new(Reminder::new(Store::in_memory(), WorkerSlot::new()));
            let router = Router::new(collect("reminder", plugin.clone()).unwrap());
            Self {
                plugin,
                router,
                replies: Arc::default(),
            }
        }

        async fn write(&self, text: &str, user: &str) {
            let line = Line {
                text: text.into(),
                user: user.into(),
                replies: Arc::clone(&self.replies),
            };
            self.router
                .dispatch(Inbound::request(line))
                .await
                .unwrap();
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.replies.lock())
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let h = Harness::new();

        h.write("remind me in 10 min to stretch", "alice").await;
        assert_eq!(h.take(), ["ok"]);

        let entries = h.plugin.entries("alice").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "stretch");

        h.write("my reminders", "alice").await;
        let replies = h.take();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with(&format!("{}) ", entries[0].id)));
        assert!(replies[0].ends_with(" stretch"));
    }

    #[tokio::test]
    async fn test_listing_is_sorted_by_due_time() {
        let h = Harness::new();
        let birthday = h
            .plugin
            .schedule("alice", datetime!(2012-10-05 00:00 UTC), "Celebrate my birthday")
            .unwrap();
        let doc = h
            .plugin
            .schedule("alice", datetime!(2012-09-01 00:00 UTC), "Write a doc")
            .unwrap();

        h.write("my reminders", "alice").await;
        assert_eq!(
            h.take(),
            [format!(
                "{}) 2012-09-01 00:00 Write a doc\n{}) 2012-10-05 00:00 Celebrate my birthday",
                doc.id, birthday.id
            )]
        );
    }

    #[tokio::test]
    async fn test_reminders_are_per_user() {
        let h = Harness::new();
        h.write("remind me in 1h to water plants", "blah").await;
        h.write("remind me in 2h to call mom", "minor").await;
        h.take();

        h.write("my reminders", "minor").await;
        let replies = h.take();
        assert!(replies[0].ends_with(" call mom"));
        assert!(!replies[0].contains("water plants"));

        h.write("my reminders", "nobody").await;
        assert_eq!(h.take(), ["You have no reminders."]);
    }

    #[tokio::test]
    async fn test_due_reminder_is_delivered_once() {
        let h = Harness::new();
        h.write("my reminders", "alice").await;
        h.take();

        let first = h
            .plugin
            .schedule("alice", datetime!(2012-09-05 02:00 UTC), "do task1")
            .unwrap();
        h.plugin
            .schedule("alice", datetime!(2012-09-05 02:30 UTC), "do task2")
            .unwrap();

        let delivered = h
            .plugin
            .deliver_due(datetime!(2012-09-05 02:01 UTC))
            .await
            .unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(h.take(), [format!("Reminder: do task1 ({})", first.id)]);

        let delivered = h
            .plugin
            .deliver_due(datetime!(2012-09-05 02:12 UTC))
            .await
            .unwrap();
        assert_eq!(delivered, 0);
        assert!(h.take().is_empty());
        assert_eq!(h.plugin.entries("alice").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_listener_keeps_reminder() {
        let h = Harness::new();
        h.plugin
            .schedule("ghost", datetime!(2012-09-05 02:00 UTC), "boo")
            .unwrap();

        let delivered = h
            .plugin
            .deliver_due(datetime!(2013-01-01 00:00 UTC))
            .await
            .unwrap();
        assert_eq!(delivered, 0);
        assert_eq!(h.plugin.entries("ghost").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_done_cancels_by_id_prefix() {
        let h = Harness::new();
        let entry = h
            .plugin
            .schedule("alice", datetime!(2012-09-05 02:00 UTC), "do task1")
            .unwrap();

        h.write(&format!("{} done", &entry.id[..2]), "alice").await;
        assert_eq!(h.take(), ["ok"]);
        assert!(h.plugin.entries("alice").unwrap().is_empty());

        h.write(&format!("{} done", entry.id), "alice").await;
        assert_eq!(h.take(), ["No such reminder."]);
    }

    #[tokio::test]
    async fn test_done_refuses_ambiguous_prefix() {
        let h = Harness::new();
        let due = datetime!(2012-09-05 02:00 UTC);
        let entries = ["ab12cd34", "ab99ef00", "ab12"].map(|id| Entry {
            id: id.into(),
            due,
            text: format!("task {id}"),
        });
        h.plugin.store.set("alice", &entries).unwrap();

        h.write("ab done", "alice").await;
        assert_eq!(h.take(), ["3 reminders match that id, use more of it."]);
        assert_eq!(h.plugin.entries("alice").unwrap().len(), 3);

        h.write("ab12 done", "alice").await;
        assert_eq!(h.take(), ["ok"]);
        let left: Vec<_> = h.plugin.entries("alice").unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(left, ["ab12cd34", "ab99ef00"]);

        h.write("ab1 done", "alice").await;
        assert_eq!(h.take(), ["ok"]);
        let left: Vec<_> = h.plugin.entries("alice").unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(left, ["ab99ef00"]);
    }

    #[tokio::test]
    async fn test_overflowing_delay() {
        let h = Harness::new();
        h.write("remind me in 99999999999999999999 h to wait", "alice").await;
        assert_eq!(h.take(), ["That is too far away."]);
    }

    #[tokio::test]
    async fn test_descriptor_starts_worker() {
        let plugin = REMINDER_PLUGIN
            .instantiate(PluginContext::new("reminder", Store::in_memory()))
            .unwrap();
        let reminder = plugin.as_any().downcast::<Reminder>().unwrap();
        assert!(reminder.worker.is_running());
        reminder.stop();
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let ctx = PluginContext::new("reminder", Store::in_memory())
            .with_settings(serde_json::json!({ "check_interval_secs": 0 }));
        assert!(REMINDER_PLUGIN.instantiate(ctx).is_err());
    }
}
