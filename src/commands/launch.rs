use crate::config::LaunchConfig;
use crate::error::Result;
use crate::services::compositor::{focus_command, Compositor};
use crate::swayctrl_error;
use crate::tree::WindowId;
use crate::utils::launcher;
use std::collections::HashSet;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// `launch <cmd> [args…]`
pub async fn run(
    compositor: &dyn Compositor,
    config: &LaunchConfig,
    program: &str,
    args: &[String],
) -> Result<WindowId> {
    launch_and_focus(compositor, config, || launcher::spawn_detached(program, args)).await
}

/// Запомнить текущие окна, запустить процесс, дождаться нового окна и
/// сфокусировать его. Из нескольких новых окон берётся наименьший id.
pub async fn launch_and_focus<F>(
    compositor: &dyn Compositor,
    config: &LaunchConfig,
    spawn: F,
) -> Result<WindowId>
where
    F: FnOnce() -> Result<u32>,
{
    let before: HashSet<WindowId> = compositor.get_tree().await?.window_ids().into_iter().collect();
    debug!("Окон до запуска: {}", before.len());

    spawn()?;

    let id = wait_for_new_window(compositor, &before, config).await?;
    info!("Новое окно {}, фокусируем", id);
    compositor.run_command(&focus_command(id)).await?;
    Ok(id)
}

async fn wait_for_new_window(
    compositor: &dyn Compositor,
    before: &HashSet<WindowId>,
    config: &LaunchConfig,
) -> Result<WindowId> {
    let deadline = Instant::now() + config.deadline();
    let mut ticker = interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let tree = compositor.get_tree().await?;
        let fresh = tree
            .window_ids()
            .into_iter()
            .filter(|id| !before.contains(id))
            .min();
        if let Some(id) = fresh {
            return Ok(id);
        }

        if Instant::now() >= deadline {
            return Err(swayctrl_error!(
                timeout,
                "новое окно не появилось за {:?}; попробуйте ещё раз",
                config.deadline()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwayctrlError;
    use crate::services::compositor::DryRunCompositor;
    use crate::tree::{Node, NodeType};
    use std::sync::Arc;
    use std::time::Duration;

    fn config(deadline_ms: u64) -> LaunchConfig {
        LaunchConfig {
            poll_interval_ms: 10,
            deadline_ms,
        }
    }

    fn tree_with(windows: Vec<Node>) -> Node {
        Node::new(1, NodeType::Root).with_children(vec![Node::new(3, NodeType::Workspace).with_children(windows)])
    }

    #[tokio::test]
    async fn test_new_window_is_focused() {
        let compositor = Arc::new(DryRunCompositor::new(tree_with(vec![Node::window(5, "foot", "old")])));

        let delayed = compositor.clone();
        let appear = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            delayed.set_tree(tree_with(vec![
                Node::window(5, "foot", "old"),
                Node::window(12, "imv", "second"),
                Node::window(11, "imv", "first"),
            ]));
        });

        let id = launch_and_focus(compositor.as_ref(), &config(2000), || Ok(1)).await.unwrap();
        appear.await.unwrap();

        assert_eq!(id, 11);
        assert_eq!(compositor.executed(), vec!["[con_id=11] focus".to_string()]);
    }

    #[tokio::test]
    async fn test_no_new_window_times_out() {
        let compositor = DryRunCompositor::demo();
        let err = launch_and_focus(&compositor, &config(60), || Ok(1)).await.unwrap_err();

        assert!(matches!(err, SwayctrlError::Timeout(_)));
        assert!(compositor.executed().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_fatal() {
        let compositor = DryRunCompositor::demo();
        let err = run(&compositor, &config(60), "/nonexistent/swayctrl-test-binary", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, SwayctrlError::Precondition(_)));
    }
}
