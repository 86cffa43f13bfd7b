use crate::error::Result;
use crate::services::compositor::{focus_command, Compositor};
use crate::services::daemon_client::DaemonClient;
use crate::services::protocol::MruEntry;
use crate::tree::selector::previous_window;
use crate::tree::WindowId;
use tracing::info;

use super::focused_node;

/// `prev`: вернуться к предыдущему окну из истории демона
pub async fn run(compositor: &dyn Compositor, client: &DaemonClient) -> Result<Option<WindowId>> {
    let history = client.list_windows().await?;
    prev_with_history(compositor, &history).await
}

pub async fn prev_with_history(compositor: &dyn Compositor, history: &[MruEntry]) -> Result<Option<WindowId>> {
    let tree = compositor.get_tree().await?;

    let focused = focused_node(&tree)?;

    // Фокус на пустом рабочем столе: предыдущим считается голова истории
    let target = if focused.is_window() {
        previous_window(history, focused.id)
    } else {
        history.first()
    };

    match target {
        Some(entry) => {
            info!("Фокус на предыдущее окно {}", entry);
            compositor.run_command(&focus_command(entry.id)).await?;
            Ok(Some(entry.id))
        }
        None => {
            info!("Нет другого окна для фокуса");
            Ok(None)
        }
    }
}
