//! Interactive editing support
//!
//! Round-trips a paste draft through $EDITOR and asks for confirmations.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::Command;
use tempfile::NamedTempFile;

/// Open a paste draft in the user's editor and return the edited text
///
/// The draft lives in a temp file named after the paste; the file is removed
/// however the editor exits.
pub fn edit_text(paste_id: &str, draft: &str) -> Result<String> {
    let editor = find_editor()?;
    run_editor(&editor, paste_id, draft)
}

fn run_editor(editor: &str, paste_id: &str, draft: &str) -> Result<String> {
    let (program, args) = editor_command(editor)?;

    let mut file = draft_file(paste_id)?;
    file.write_all(draft.as_bytes())
        .and_then(|_| file.flush())
        .with_context(|| format!("Failed to write draft to {:?}", file.path()))?;

    let status = Command::new(program)
        .args(args)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        bail!("Editor '{}' exited with {}; draft discarded", editor, status);
    }

    fs::read_to_string(file.path())
        .with_context(|| format!("Failed to read edited draft {:?}", file.path()))
}

/// Temp file for one paste's draft, deleted on drop
fn draft_file(paste_id: &str) -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(&format!("pastesync-{}-", paste_id))
        .suffix(".txt")
        .tempfile()
        .context("Failed to create draft file")
}

/// Split an editor setting such as `code --wait` into program and arguments
fn editor_command(editor: &str) -> Result<(&str, Vec<&str>)> {
    let mut parts = editor.split_whitespace();
    match parts.next() {
        Some(program) => Ok((program, parts.collect())),
        None => bail!("Editor command is empty"),
    }
}

/// $VISUAL, then $EDITOR, then the first common editor on PATH
fn find_editor() -> Result<String> {
    let configured = ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|value| !value.trim().is_empty());
    if let Some(editor) = configured {
        return Ok(editor);
    }

    ["nano", "vim", "vi"]
        .into_iter()
        .find(|editor| command_exists(editor))
        .map(str::to_string)
        .context("No editor found. Set $EDITOR, e.g. export EDITOR=nano")
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Ask a yes/no question; anything but yes (or no TTY) means no
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    Ok(is_yes(&answer))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
