//! Native platform bits (copypasta clipboard).

use anyhow::{anyhow, Result};
use copypasta::{ClipboardContext, ClipboardProvider};

use crate::app::App;

/// Copy text to system clipboard using copypasta
pub fn copy_to_clipboard(content: &str) -> Result<()> {
    let mut ctx = ClipboardContext::new().map_err(|e| anyhow!("clipboard unavailable: {e}"))?;
    ctx.set_contents(content.to_string())
        .map_err(|e| anyhow!("clipboard write failed: {e}"))
}

/// Put the current share link on the clipboard and report it with a toast.
pub fn copy_share_link(app: &mut App) {
    let link = app.share_link();
    match copy_to_clipboard(&link) {
        Ok(()) => {
            log::info!("copied share link {link}");
            app.show_toast("Link copied".to_string());
        }
        Err(e) => {
            log::warn!("copy failed: {e:#}");
            app.show_error_toast("Copy failed".to_string());
        }
    }
}
