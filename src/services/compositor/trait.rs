use crate::config::Config;
use crate::error::{Result, SwayctrlError};
use crate::events::WindowEvent;
use crate::tree::{Node, WindowId};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Поток разобранных событий окон. Закрытие канала или `Err` означает,
/// что подписка потеряна
pub type WindowEventStream = mpsc::Receiver<Result<WindowEvent>>;

/// Trait for the compositor IPC surface used by commands and the daemon
#[async_trait::async_trait]
pub trait Compositor: Send + Sync {
    /// Snapshot of the whole window tree
    async fn get_tree(&self) -> Result<Node>;

    /// Run a command; fails on the first sub-command sway reports as failed
    async fn run_command(&self, command: &str) -> Result<()>;

    /// Subscribe to window events
    async fn subscribe_windows(&self) -> Result<WindowEventStream>;
}

/// Результат одной подкоманды `RUN_COMMAND`
#[derive(Debug, Clone, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Первая неудачная подкоманда превращается в ошибку с её номером
pub fn check_outcomes(outcomes: &[CommandOutcome]) -> Result<()> {
    for (index, outcome) in outcomes.iter().enumerate() {
        if !outcome.success {
            return Err(SwayctrlError::CommandFailed {
                index,
                message: outcome.error.clone().unwrap_or_else(|| "неизвестная ошибка".to_string()),
            });
        }
    }
    Ok(())
}

pub fn focus_command(id: WindowId) -> String {
    format!("[con_id={}] focus", id)
}

/// Factory function to create an appropriate compositor based on the dry_run flag
pub fn create_compositor(config: &Config, dry_run: bool) -> Result<Arc<dyn Compositor>> {
    if dry_run {
        Ok(Arc::new(super::dry_run::DryRunCompositor::demo()))
    } else {
        Ok(Arc::new(super::swaymsg::SwaymsgCompositor::new(&config.sway)?))
    }
}
