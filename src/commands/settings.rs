// ABOUTME: Settings commands
// ABOUTME: Persists theme and language changes made in the settings tab

use std::path::Path;

use crate::config::Settings;
use crate::ActionResponse;

/// Write `settings` to `path`; the caller keeps its in-memory copy either way
pub fn save_settings(path: &Path, settings: Settings) -> ActionResponse<Settings> {
    match settings.save_to(path) {
        Ok(()) => {
            log::info!(
                "Saved settings: theme={:?} language={:?}",
                settings.theme,
                settings.language
            );
            ActionResponse::success(settings)
        }
        Err(e) => {
            log::error!("Save settings to {} failed: {}", path.display(), e);
            ActionResponse::error(format!("Failed to save settings: {}", e))
        }
    }
}
