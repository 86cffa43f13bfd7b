use crate::error::Result;
use crate::services::compositor::{focus_command, Compositor};
use crate::tree::selector::next_app_instance;
use crate::tree::WindowId;
use tracing::info;

use super::focused_node;

/// `appnext`: следующее окно того же приложения по кругу
pub async fn run(compositor: &dyn Compositor) -> Result<Option<WindowId>> {
    let tree = compositor.get_tree().await?;
    let focused = focused_node(&tree)?;

    match next_app_instance(&tree, focused)? {
        Some(next) => {
            compositor.run_command(&focus_command(next.id)).await?;
            Ok(Some(next.id))
        }
        None => {
            info!("Других окон {} нет", focused.app_id.as_deref().unwrap_or("?"));
            Ok(None)
        }
    }
}
