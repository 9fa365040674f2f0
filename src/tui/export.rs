use crate::storage::ExportFormat;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Where `d` writes the summary: `summary.txt` in the working directory.
pub fn download_path(fallback_dir: &Path) -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| fallback_dir.to_path_buf())
        .join("summary.txt")
}

/// Timestamped export file inside the data directory.
pub fn export_path(data_dir: &Path, format: ExportFormat) -> PathBuf {
    let stamp = time::OffsetDateTime::now_utc().unix_timestamp();
    let ext = match format {
        ExportFormat::Json => "json",
        ExportFormat::Csv => "csv",
    };
    data_dir.join(format!("docsum-history-{stamp}.{ext}"))
}

/// Initialize the clipboard manager thread if not already initialized.
/// Operations run sequentially, and each clipboard instance is kept alive
/// long enough for clipboard managers on Linux to read it.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                match Clipboard::new() {
                    Ok(mut clipboard) => {
                        if clipboard.set_text(&text).is_ok() {
                            std::thread::sleep(Duration::from_secs(2));
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue text for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
