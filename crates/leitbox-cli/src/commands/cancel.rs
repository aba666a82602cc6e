//! The `leitbox cancel` command — discard a user's active session.

use std::path::PathBuf;

use anyhow::Result;

use leitbox_core::error::EngineError;
use leitbox_core::session::SessionManager;

pub async fn execute(user: i64, config_path: Option<PathBuf>) -> Result<()> {
    let (config, store) = super::open(config_path.as_deref())?;
    let manager = SessionManager::new(store, config.session_config());

    match manager.cancel_session(user).await {
        Ok(()) => {
            println!("Session cancelled for user {user}; committed answers are kept.");
            Ok(())
        }
        Err(EngineError::SessionNotFound(_)) => {
            println!("No active session for user {user}; nothing to cancel.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
