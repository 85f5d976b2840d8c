//! Paste session state
//!
//! Everything a front-end shows for one paste: the cached server copy, the
//! visible display, the edit draft, the retired flag, connectivity and
//! viewer count. The session does no I/O. The controller feeds it request
//! results and live events.
//!
//! Reconciliation rule: server pushes always update the cached copy, but
//! only reach the display when no edit is in progress. The draft is never
//! touched by a push, and leaving edit mode shows the latest cached copy.

use std::fmt;

use tracing::{debug, info};

use crate::error::{ClientError, ClientResult, SessionError};
use crate::models::{Paste, PasteId};
use crate::sync::{ConnectionState, InboundFrame, LiveEvent};

/// Text shown in place of content when loading fails
pub const LOAD_ERROR_TEXT: &str = "Error: Paste not found";

/// User-visible notice raised by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Paste is retired and read-only (banner)
    Retired,
    /// Save refused locally
    EmptyContent,
    /// Save hit a retired paste
    SaveGone,
    /// Save failed; the draft is kept for another try
    SaveFailed(String),
    /// Live connection dropped for good
    Disconnected,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Retired => f.write_str("This paste has been deleted and is read-only"),
            Notice::EmptyContent => f.write_str("Content cannot be empty"),
            Notice::SaveGone => f.write_str("This paste has been deleted and cannot be edited"),
            Notice::SaveFailed(reason) => write!(f, "Failed to save changes: {}", reason),
            Notice::Disconnected => f.write_str("Live updates disconnected"),
        }
    }
}

/// Result of a save attempt as seen by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Stored; the session has left edit mode
    Saved,
    /// Paste retired; session is read-only and left edit mode
    Gone,
    /// Failed; still editing with the draft intact
    Rejected(String),
}

/// State of one paste as seen by the user
#[derive(Debug, Clone)]
pub struct PasteSession {
    id: PasteId,
    /// Latest known server body
    cached: String,
    /// What the view shows
    display: String,
    /// Edit buffer; `Some` while editing
    draft: Option<String>,
    retired: bool,
    load_error: Option<String>,
    status: ConnectionState,
    user_count: Option<u32>,
    notices: Vec<Notice>,
}

impl PasteSession {
    pub fn new(id: PasteId) -> Self {
        Self {
            id,
            cached: String::new(),
            display: String::new(),
            draft: None,
            retired: false,
            load_error: None,
            status: ConnectionState::Connecting,
            user_count: None,
            notices: Vec::new(),
        }
    }

    pub fn id(&self) -> &PasteId {
        &self.id
    }

    /// Latest known server body
    pub fn cached(&self) -> &str {
        &self.cached
    }

    /// What the view currently shows
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Edit buffer, if editing
    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Whether the edit control is enabled
    pub fn can_edit(&self) -> bool {
        !self.retired
    }

    /// Error from the initial load, if it failed
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn status(&self) -> ConnectionState {
        self.status
    }

    pub fn user_count(&self) -> Option<u32> {
        self.user_count
    }

    /// Notices raised since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Apply the result of the initial load
    ///
    /// Retirement comes only from the body's `deleted` flag.
    pub fn apply_bootstrap(&mut self, result: ClientResult<Paste>) {
        match result {
            Ok(paste) => {
                debug!("Loaded paste {} ({} bytes)", self.id, paste.text.len());
                self.load_error = None;
                self.set_cached(paste.text);
                if paste.deleted {
                    self.mark_retired();
                }
            }
            Err(e) => {
                info!("Failed to load paste {}: {}", self.id, e);
                self.load_error = Some(e.to_string());
                self.display = LOAD_ERROR_TEXT.to_string();
            }
        }
    }

    /// Apply a frame from the live connection
    ///
    /// Returns whether the visible display changed.
    pub fn apply_frame(&mut self, frame: &InboundFrame) -> bool {
        match frame {
            InboundFrame::UserCount(count) => {
                self.user_count = Some(*count);
                false
            }
            _ => match frame.snapshot() {
                Some(text) => {
                    let before_editing = self.is_editing();
                    self.set_cached(text.to_string());
                    !before_editing
                }
                None => false,
            },
        }
    }

    /// Apply an event from the live task
    pub fn apply_live_event(&mut self, event: &LiveEvent) {
        match event {
            LiveEvent::StatusChanged(state) => self.status = *state,
            LiveEvent::Frame(frame) => {
                self.apply_frame(frame);
            }
            LiveEvent::Terminal(_) => self.mark_retired(),
            LiveEvent::GaveUp => self.notices.push(Notice::Disconnected),
            LiveEvent::TransportError(_) | LiveEvent::RetryScheduled { .. } => {}
        }
    }

    /// Enter the read-only terminal state
    pub fn mark_retired(&mut self) {
        if !self.retired {
            info!("Paste {} is deleted - read-only mode", self.id);
            self.retired = true;
            self.notices.push(Notice::Retired);
        }
    }

    /// Start editing with a copy of the cached body
    pub fn enter_edit(&mut self) -> Result<&str, SessionError> {
        if self.retired {
            return Err(SessionError::Retired);
        }
        let draft = self.draft.insert(self.cached.clone());
        Ok(draft.as_str())
    }

    /// Leave edit mode, discarding the draft
    pub fn exit_edit(&mut self) {
        self.draft = None;
        self.display = self.cached.clone();
    }

    /// Enter edit mode if idle, leave it if editing
    pub fn toggle_edit(&mut self) -> Result<(), SessionError> {
        if self.is_editing() {
            self.exit_edit();
            Ok(())
        } else {
            self.enter_edit().map(|_| ())
        }
    }

    /// Replace the draft while editing
    pub fn set_draft(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        if self.retired {
            return Err(SessionError::Retired);
        }
        match self.draft.as_mut() {
            Some(draft) => {
                *draft = text.into();
                Ok(())
            }
            None => Err(SessionError::NotEditing),
        }
    }

    /// Validate the draft for saving and return a copy to send
    ///
    /// Empty or whitespace-only drafts are refused here, so no request is
    /// ever made for them.
    pub fn prepare_save(&mut self) -> Result<String, SessionError> {
        let draft = self.draft.as_deref().ok_or(SessionError::NotEditing)?;
        if draft.trim().is_empty() {
            self.notices.push(Notice::EmptyContent);
            return Err(SessionError::EmptyDraft);
        }
        Ok(draft.to_string())
    }

    /// Apply the store's answer to a save of `text`
    pub fn finish_save(&mut self, text: &str, result: ClientResult<()>) -> SaveOutcome {
        match result {
            Ok(()) => {
                self.set_cached(text.to_string());
                self.exit_edit();
                SaveOutcome::Saved
            }
            Err(e) if e.is_terminal() => {
                self.mark_retired();
                self.exit_edit();
                self.notices.push(Notice::SaveGone);
                SaveOutcome::Gone
            }
            Err(e) => {
                let reason = describe_save_error(&e);
                self.notices.push(Notice::SaveFailed(reason.clone()));
                SaveOutcome::Rejected(reason)
            }
        }
    }

    fn set_cached(&mut self, text: String) {
        if !self.is_editing() {
            self.display = text.clone();
        }
        self.cached = text;
    }
}

fn describe_save_error(error: &ClientError) -> String {
    match error {
        ClientError::Rejected { message, .. } | ClientError::TooLarge { message } => {
            message.clone()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{CloseInfo, CloseKind};

    fn session() -> PasteSession {
        PasteSession::new(PasteId::parse("00001").unwrap())
    }

    fn loaded(text: &str) -> PasteSession {
        let mut s = session();
        s.apply_bootstrap(Ok(Paste {
            id: Some("00001".to_string()),
            text: text.to_string(),
            deleted: false,
        }));
        s
    }

    fn update(text: &str) -> InboundFrame {
        InboundFrame::Update(text.to_string())
    }

    #[test]
    fn test_bootstrap_then_push_updates_display() {
        let mut s = loaded("hello");
        assert_eq!(s.display(), "hello");
        assert!(s.can_edit());

        assert!(s.apply_frame(&update("hello world")));
        assert_eq!(s.display(), "hello world");
        assert_eq!(s.cached(), "hello world");
    }

    #[test]
    fn test_push_while_editing_keeps_draft() {
        let mut s = loaded("hello world");
        assert_eq!(s.enter_edit().unwrap(), "hello world");

        assert!(!s.apply_frame(&update("hello world!!")));
        assert_eq!(s.cached(), "hello world!!");
        assert_eq!(s.draft(), Some("hello world"));
        assert_eq!(s.display(), "hello world");

        s.exit_edit();
        assert_eq!(s.display(), "hello world!!");
        assert!(s.draft().is_none());
    }

    #[test]
    fn test_draft_edits_survive_pushes() {
        let mut s = loaded("a");
        s.enter_edit().unwrap();
        s.set_draft("my edit").unwrap();

        s.apply_frame(&InboundFrame::Legacy("b".to_string()));
        s.apply_frame(&update("c"));

        assert_eq!(s.draft(), Some("my edit"));
        assert_eq!(s.cached(), "c");
    }

    #[test]
    fn test_bootstrap_deleted_is_terminal() {
        let mut s = session();
        s.apply_bootstrap(Ok(Paste {
            id: None,
            text: "old".to_string(),
            deleted: true,
        }));

        assert_eq!(s.display(), "old");
        assert!(s.is_retired());
        assert!(!s.can_edit());
        assert_eq!(s.enter_edit(), Err(SessionError::Retired));
        assert_eq!(s.take_notices(), vec![Notice::Retired]);
    }

    #[test]
    fn test_bootstrap_failure_shows_error() {
        let mut s = session();
        s.apply_bootstrap(Err(ClientError::NotFound {
            id: "00001".to_string(),
        }));

        assert_eq!(s.display(), LOAD_ERROR_TEXT);
        assert!(s.load_error().is_some());
        // Not retired: a failed load says nothing about deletion
        assert!(!s.is_retired());

        // A later init frame still fills the view
        s.apply_frame(&InboundFrame::Init("late".to_string()));
        assert_eq!(s.display(), "late");
    }

    #[test]
    fn test_unknown_json_frame_leaves_content() {
        let mut s = loaded("hello");
        let frame = InboundFrame::decode(r#"{"type":"cursor","pos":4}"#);

        assert!(!s.apply_frame(&frame));
        assert_eq!(s.display(), "hello");
        assert_eq!(s.cached(), "hello");
    }

    #[test]
    fn test_user_count_is_display_only() {
        let mut s = loaded("body");
        assert!(!s.apply_frame(&InboundFrame::UserCount(4)));
        assert_eq!(s.user_count(), Some(4));
        assert_eq!(s.cached(), "body");
        assert_eq!(s.display(), "body");
    }

    #[test]
    fn test_live_terminal_marks_retired_once() {
        let mut s = loaded("body");
        s.apply_live_event(&LiveEvent::StatusChanged(ConnectionState::Closed(
            CloseKind::Terminal,
        )));
        s.apply_live_event(&LiveEvent::Terminal(CloseInfo::new(1008, "")));
        s.apply_live_event(&LiveEvent::Terminal(CloseInfo::new(1008, "")));

        assert!(s.is_retired());
        assert!(s.status().is_terminal());
        assert_eq!(s.take_notices(), vec![Notice::Retired]);
    }

    #[test]
    fn test_gave_up_notice() {
        let mut s = loaded("body");
        s.apply_live_event(&LiveEvent::GaveUp);
        assert_eq!(s.take_notices(), vec![Notice::Disconnected]);
        assert!(!s.is_retired());
    }

    #[test]
    fn test_toggle_edit() {
        let mut s = loaded("x");
        s.toggle_edit().unwrap();
        assert!(s.is_editing());
        s.toggle_edit().unwrap();
        assert!(!s.is_editing());
    }

    #[test]
    fn test_set_draft_requires_editing() {
        let mut s = loaded("x");
        assert_eq!(s.set_draft("y"), Err(SessionError::NotEditing));
    }

    #[test]
    fn test_prepare_save_rejects_blank() {
        let mut s = loaded("x");
        assert_eq!(s.prepare_save(), Err(SessionError::NotEditing));

        s.enter_edit().unwrap();
        s.set_draft("   \n").unwrap();
        assert_eq!(s.prepare_save(), Err(SessionError::EmptyDraft));
        assert_eq!(s.take_notices(), vec![Notice::EmptyContent]);
        assert!(s.is_editing());
    }

    #[test]
    fn test_finish_save_success() {
        let mut s = loaded("x");
        s.enter_edit().unwrap();
        s.set_draft("new").unwrap();
        let text = s.prepare_save().unwrap();

        assert_eq!(s.finish_save(&text, Ok(())), SaveOutcome::Saved);
        assert!(!s.is_editing());
        assert_eq!(s.cached(), "new");
        assert_eq!(s.display(), "new");
    }

    #[test]
    fn test_finish_save_gone() {
        let mut s = loaded("x");
        s.enter_edit().unwrap();
        s.set_draft("new").unwrap();

        let outcome = s.finish_save(
            "new",
            Err(ClientError::Gone {
                id: "00001".to_string(),
            }),
        );
        assert_eq!(outcome, SaveOutcome::Gone);
        assert!(s.is_retired());
        assert!(!s.is_editing());
        assert_eq!(s.display(), "x");
        assert_eq!(s.take_notices(), vec![Notice::Retired, Notice::SaveGone]);
    }

    #[test]
    fn test_finish_save_rejected_keeps_draft() {
        let mut s = loaded("x");
        s.enter_edit().unwrap();
        s.set_draft("new").unwrap();

        let outcome = s.finish_save(
            "new",
            Err(ClientError::Rejected {
                status: 500,
                message: "disk full".to_string(),
            }),
        );
        assert_eq!(outcome, SaveOutcome::Rejected("disk full".to_string()));
        assert!(s.is_editing());
        assert_eq!(s.draft(), Some("new"));
        assert_eq!(s.cached(), "x");
        assert_eq!(
            s.take_notices(),
            vec![Notice::SaveFailed("disk full".to_string())]
        );
    }
}
