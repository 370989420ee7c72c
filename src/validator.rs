//! Structural PDF checks for downloaded files.

use lopdf::Document;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::Config;

/// True when `path` holds a parseable PDF above the size floor with at least one page.
///
/// Every failure mode (missing file, tiny file, parse error or parser panic,
/// empty page tree) collapses to `false`. Small stand-ins are usually HTML error pages served
/// with a `.pdf` name.
pub fn is_valid_pdf(path: &Path) -> bool {
    let size = match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => return false,
    };

    if size <= Config::MIN_PDF_BYTES {
        debug!("{} is only {} bytes", path.display(), size);
        return false;
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    // lopdf can panic on hostile input; treat that like any other parse failure
    let parsed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        Document::load_mem(&bytes).map(|document| document.get_pages().len())
    }));

    match parsed {
        Ok(Ok(pages)) => pages > 0,
        Ok(Err(e)) => {
            debug!("{} does not parse as PDF: {}", path.display(), e);
            false
        }
        Err(_) => {
            warn!("{} made the PDF parser panic", path.display());
            false
        }
    }
}

/// Runs [`is_valid_pdf`] on the blocking pool so large files don't stall the runtime.
pub async fn is_valid_pdf_async(path: &Path) -> bool {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || is_valid_pdf(&path))
        .await
        .unwrap_or(false)
}
