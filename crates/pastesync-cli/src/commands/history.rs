//! History command handlers

use anyhow::{bail, Context, Result};

use pastesync_core::{HistoryEntry, HttpPasteStore, PasteId};

use crate::editor;
use crate::output::Output;

/// List the audit history, newest first
pub async fn list(store: &HttpPasteStore, output: &Output) -> Result<()> {
    let entries = store
        .history()
        .await
        .context("Failed to load history")?;
    output.print_history(&entries);
    Ok(())
}

/// Retire a paste, then show the reloaded history
///
/// On failure the history is left as it was and nothing is reprinted.
pub async fn delete(
    store: &HttpPasteStore,
    id: PasteId,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let entries = store
        .history()
        .await
        .context("Failed to load history")?;

    if let Some(entry) = find_entry(&entries, &id) {
        if !entry.is_deletable() {
            bail!("Paste {} is already deleted", id);
        }
    }

    if !yes {
        if !output.should_prompt() {
            bail!("Refusing to delete paste {} without --yes", id);
        }
        if !editor::confirm(&format!("Delete paste {}?", id))? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete(&id)
        .await
        .with_context(|| format!("Failed to delete paste {}", id))?;

    output.success(&format!("Deleted paste {}", id));

    let entries = store
        .history()
        .await
        .context("Failed to reload history")?;
    output.print_history(&entries);
    Ok(())
}

fn find_entry<'a>(entries: &'a [HistoryEntry], id: &PasteId) -> Option<&'a HistoryEntry> {
    entries.iter().find(|entry| entry.id == id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<HistoryEntry> {
        serde_json::from_str(
            r#"[
                {"id":"00002","timestamp":"2024-05-01T10:00:00Z","creator_ip":"10.0.0.2",
                 "version":1,"action":"create","deleted":false},
                {"id":"00001","timestamp":"2024-04-30T09:00:00Z","creator_ip":"10.0.0.1",
                 "version":3,"action":"delete","deleted":true}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_find_entry() {
        let entries = history();

        let live = find_entry(&entries, &PasteId::parse("00002").unwrap()).unwrap();
        assert!(live.is_deletable());

        let retired = find_entry(&entries, &PasteId::parse("/00001").unwrap()).unwrap();
        assert!(!retired.is_deletable());

        assert!(find_entry(&entries, &PasteId::parse("00003").unwrap()).is_none());
    }
}
