use crate::config::LaunchConfig;
use crate::error::{Result, SwayctrlError};
use crate::services::compositor::{focus_command, Compositor};
use crate::services::daemon_client::DaemonClient;
use crate::services::protocol::MruEntry;
use crate::tree::selector::{mru_positions, pick_best};
use crate::tree::{WindowCriteria, WindowId};
use crate::utils::launcher;
use tracing::info;

use super::launch::launch_and_focus;

/// `focus --title RE --appid ID [--launch CMD]`
pub async fn run(
    compositor: &dyn Compositor,
    client: &DaemonClient,
    criteria: &WindowCriteria,
    launch: Option<&str>,
    launch_config: &LaunchConfig,
) -> Result<WindowId> {
    let history = client.list_windows().await?;
    focus_with_history(compositor, &history, criteria, launch, launch_config).await
}

pub async fn focus_with_history(
    compositor: &dyn Compositor,
    history: &[MruEntry],
    criteria: &WindowCriteria,
    launch: Option<&str>,
    launch_config: &LaunchConfig,
) -> Result<WindowId> {
    let positions = mru_positions(history);
    let tree = compositor.get_tree().await?;

    if let Some(node) = pick_best(&tree, criteria, &positions) {
        info!("Фокус на {}", node);
        compositor.run_command(&focus_command(node.id)).await?;
        return Ok(node.id);
    }

    match launch {
        Some(command) => {
            info!("Подходящих окон нет, запускаем {:?}", command);
            launch_and_focus(compositor, launch_config, || launcher::spawn_shell(command)).await
        }
        None => SwayctrlError::precondition("Нет окон, подходящих под критерии"),
    }
}
