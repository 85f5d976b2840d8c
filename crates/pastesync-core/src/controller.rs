//! Live paste controller
//!
//! Ties a [`PasteSession`] to the paste store and the live task: load once,
//! subscribe, apply pushes, save edits.

use tracing::{debug, info};

use crate::api::PasteStore;
use crate::config::Config;
use crate::error::{ClientError, ClientResult, SessionError};
use crate::models::PasteId;
use crate::session::{PasteSession, SaveOutcome};
use crate::sync::{spawn_live_task, LiveEvent, LiveHandle};

/// Controller for one paste
pub struct PasteController<S> {
    store: S,
    session: PasteSession,
    live: Option<LiveHandle>,
}

impl<S: PasteStore> PasteController<S> {
    pub fn new(store: S, id: PasteId) -> Self {
        Self {
            store,
            session: PasteSession::new(id),
            live: None,
        }
    }

    pub fn session(&self) -> &PasteSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PasteSession {
        &mut self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn live(&self) -> Option<&LiveHandle> {
        self.live.as_ref()
    }

    /// Load the paste once
    ///
    /// Failures are recorded on the session (error text in place of the
    /// content) and not retried.
    pub async fn bootstrap(&mut self) -> &PasteSession {
        let result = self.store.fetch(self.session.id()).await;
        self.session.apply_bootstrap(result);
        &self.session
    }

    /// Start the live subscription for this paste
    ///
    /// Any previous subscription is shut down first, so only one transport
    /// exists per paste.
    pub async fn subscribe(&mut self, config: &Config) -> ClientResult<()> {
        let url = config
            .ws_url(self.session.id())
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        info!("Subscribing to {}", url);
        self.attach_live(spawn_live_task(url, config.reconnect_policy()))
            .await;
        Ok(())
    }

    /// Use an existing live handle
    pub async fn attach_live(&mut self, handle: LiveHandle) {
        if let Some(old) = self.live.replace(handle) {
            old.shutdown().await;
        }
    }

    /// Load, then subscribe regardless of the load outcome
    pub async fn start(&mut self, config: &Config) -> ClientResult<()> {
        self.bootstrap().await;
        self.subscribe(config).await
    }

    /// Wait for the next live event and apply it
    ///
    /// Returns `None` when there is no subscription or the task has stopped.
    pub async fn next_event(&mut self) -> Option<LiveEvent> {
        let event = self.live.as_mut()?.next_event().await?;
        self.session.apply_live_event(&event);
        Some(event)
    }

    /// Apply every event already queued, without waiting
    pub fn drain_events(&mut self) -> Vec<LiveEvent> {
        let mut applied = Vec::new();
        if let Some(live) = self.live.as_mut() {
            while let Some(event) = live.try_next_event() {
                self.session.apply_live_event(&event);
                applied.push(event);
            }
        }
        if !applied.is_empty() {
            debug!("Applied {} queued live events", applied.len());
        }
        applied
    }

    /// Save the current draft
    ///
    /// Blank drafts fail locally. On success the body is also pushed over
    /// the live connection when it is open. Whatever arrives last, save
    /// response or push, wins on the cached body.
    pub async fn save(&mut self) -> Result<SaveOutcome, SessionError> {
        let text = self.session.prepare_save()?;
        let result = self.store.update(self.session.id(), &text).await;
        let outcome = self.session.finish_save(&text, result);

        if outcome == SaveOutcome::Saved {
            let pushed = self.live.as_ref().is_some_and(|live| live.push(&text));
            debug!("Saved {}, pushed over live connection: {}", self.session.id(), pushed);
        }

        Ok(outcome)
    }

    /// Replace the draft and save it
    pub async fn save_text(
        &mut self,
        text: impl Into<String>,
    ) -> Result<SaveOutcome, SessionError> {
        self.session.set_draft(text)?;
        self.save().await
    }

    /// Stop the live subscription
    pub async fn shutdown(&mut self) {
        if let Some(live) = self.live.take() {
            live.shutdown().await;
        }
    }
}
