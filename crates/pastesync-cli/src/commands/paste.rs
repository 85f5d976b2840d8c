//! Paste command handlers

use std::io::{self, Read};

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use pastesync_core::sync::LiveEvent;
use pastesync_core::{
    Config, HttpPasteStore, PasteController, PasteId, PasteSession, PasteStore, SaveOutcome,
    SessionError,
};

use crate::editor;
use crate::output::{Output, OutputFormat};

/// Load a paste once and print it
pub async fn view(store: &HttpPasteStore, id: PasteId, output: &Output) -> Result<()> {
    let paste = store.fetch(&id).await;
    let mut session = PasteSession::new(id);
    session.apply_bootstrap(paste);

    output.print_session(&session);
    report_notices(&mut session, output);

    match session.load_error() {
        Some(error) => Err(anyhow!("Could not load paste {}: {}", session.id(), error)),
        None => Ok(()),
    }
}

/// Print a paste, then follow live updates until Ctrl-C, deletion or give-up
pub async fn watch(
    store: HttpPasteStore,
    config: &Config,
    id: PasteId,
    output: &Output,
) -> Result<()> {
    let mut controller = PasteController::new(store, id);
    controller.start(config).await?;

    output.print_session(controller.session());
    report_notices(controller.session_mut(), output);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let event = tokio::select! {
            _ = &mut ctrl_c => None,
            event = controller.next_event() => event,
        };
        let Some(event) = event else {
            break;
        };

        output.print_live_event(&event, controller.session());
        report_notices(controller.session_mut(), output);

        if matches!(event, LiveEvent::Terminal(_) | LiveEvent::GaveUp) {
            break;
        }
    }

    controller.shutdown().await;
    Ok(())
}

/// Edit a paste in $EDITOR while staying subscribed
///
/// Updates that arrive while the editor is open refresh the cached copy but
/// never the draft. Leaving the editor without changes shows the latest copy.
pub async fn edit(
    store: HttpPasteStore,
    config: &Config,
    id: PasteId,
    output: &Output,
) -> Result<()> {
    let mut controller = PasteController::new(store, id);
    controller.start(config).await?;

    let result = edit_session(&mut controller, output).await;
    controller.shutdown().await;
    result
}

async fn edit_session<S: PasteStore>(
    controller: &mut PasteController<S>,
    output: &Output,
) -> Result<()> {
    let id = controller.session().id().to_string();

    if let Some(error) = controller.session().load_error() {
        bail!("Could not load paste {}: {}", id, error);
    }

    // Pick up the init frame or a deletion close before editing
    controller.drain_events();
    report_notices(controller.session_mut(), output);

    let original = match controller.session_mut().enter_edit() {
        Ok(draft) => draft.to_string(),
        Err(SessionError::Retired) => bail!("Paste {} has been deleted and is read-only", id),
        Err(e) => return Err(e.into()),
    };

    let mut draft = original.clone();
    'edit: loop {
        let edited = open_editor(&id, draft).await?;

        let arrived = controller.drain_events();
        debug!("{} live events arrived while editing", arrived.len());
        report_notices(controller.session_mut(), output);

        if controller.session().is_retired() {
            controller.session_mut().exit_edit();
            bail!("Paste {} was deleted while editing; changes not saved", id);
        }

        if edited == original {
            controller.session_mut().exit_edit();
            output.message("No changes made.");
            output.print_session(controller.session());
            return Ok(());
        }

        let mut outcome = controller.save_text(edited.clone()).await;
        loop {
            report_notices(controller.session_mut(), output);

            match outcome {
                Ok(SaveOutcome::Saved) => {
                    output.success(&format!("Saved paste {}", id));
                    if !output.is_quiet() {
                        output.print_session(controller.session());
                    }
                    return Ok(());
                }
                Ok(SaveOutcome::Gone) => {
                    bail!("Paste {} has been deleted and cannot be edited", id)
                }
                // Failed saves keep the draft; retrying sends it unchanged
                Ok(SaveOutcome::Rejected(reason)) => {
                    if !output.should_prompt() || !editor::confirm("Retry saving?")? {
                        controller.session_mut().exit_edit();
                        bail!("Failed to save changes: {}", reason);
                    }
                    outcome = controller.save().await;
                }
                Err(SessionError::EmptyDraft) => {
                    if output.should_prompt()
                        && editor::confirm("Content cannot be empty. Edit again?")?
                    {
                        draft = edited;
                        continue 'edit;
                    }
                    controller.session_mut().exit_edit();
                    bail!("Content cannot be empty");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Run the blocking editor without stalling the live task
async fn open_editor(id: &str, draft: String) -> Result<String> {
    let id = id.to_string();
    tokio::task::spawn_blocking(move || editor::edit_text(&id, &draft))
        .await
        .context("Editor task failed")?
}

/// Create a new paste from --text or stdin
pub async fn create(store: &HttpPasteStore, text: Option<String>, output: &Output) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read paste body from stdin")?;
            buf
        }
    };

    let id = store.create(&text).await.context("Failed to create paste")?;
    let url = store.config().api_url(&format!("/{}", id))?;

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({"id": id.as_str(), "url": url.as_str()}));
        }
        OutputFormat::Quiet => println!("{}", id),
        OutputFormat::Human => {
            output.success(&format!("Created paste {}", id));
            println!("  {}", url);
        }
    }

    Ok(())
}

fn report_notices(session: &mut PasteSession, output: &Output) {
    for notice in session.take_notices() {
        output.notice(&notice);
    }
}
