use crate::error::Result;
use crate::events::WindowEvent;
use crate::tree::{Node, NodeType, WindowId};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::info;

use super::r#trait::{Compositor, WindowEventStream};

/// Композитор в памяти: фиксированное дерево, команды только записываются.
///
/// Без сценария подписка бесконечно эмулирует смену фокуса по кругу; со
/// сценарием отдаёт заданные события и закрывает поток.
pub struct DryRunCompositor {
    tree: Mutex<Node>,
    commands: Mutex<Vec<String>>,
    script: Mutex<Option<Vec<WindowEvent>>>,
    tick: Duration,
}

impl DryRunCompositor {
    pub fn new(tree: Node) -> Self {
        Self {
            tree: Mutex::new(tree),
            commands: Mutex::new(Vec::new()),
            script: Mutex::new(None),
            tick: Duration::from_secs(10),
        }
    }

    /// Демонстрационное дерево для `--dry-run`
    pub fn demo() -> Self {
        let mut floating = Node::window(9, "pavucontrol", "Volume Control - dry_run").with_visible(true);
        floating.node_type = NodeType::FloatingCon;

        let workspace = Node::new(3, NodeType::Workspace)
            .with_floating(vec![floating])
            .with_children(vec![Node::new(4, NodeType::Con).with_children(vec![
                Node::window(5, "foot", "Terminal - dry_run")
                    .with_visible(true)
                    .with_focused(true),
                Node::window(6, "firefox", "Browser - dry_run").with_visible(true),
                Node::window(7, "foot", "Editor - dry_run").with_visible(true),
            ])]);
        let output = Node::new(2, NodeType::Output).with_children(vec![workspace]);

        Self::new(Node::new(1, NodeType::Root).with_children(vec![output]))
    }

    /// Подписка отдаст ровно эти события, после чего поток закроется
    #[allow(dead_code)]
    pub fn with_script(self, events: Vec<WindowEvent>) -> Self {
        *self.script.lock() = Some(events);
        self
    }

    #[allow(dead_code)]
    pub fn set_tree(&self, tree: Node) {
        *self.tree.lock() = tree;
    }

    /// Команды, которые были бы отправлены sway
    #[allow(dead_code)]
    pub fn executed(&self) -> Vec<String> {
        self.commands.lock().clone()
    }
}

fn apply_focus(node: &mut Node, id: WindowId) {
    node.focused = node.id == id;
    for child in node.floating_nodes.iter_mut().chain(node.nodes.iter_mut()) {
        apply_focus(child, id);
    }
}

fn parse_focus_target(command: &str) -> Option<WindowId> {
    command
        .strip_prefix("[con_id=")?
        .strip_suffix("] focus")?
        .parse()
        .ok()
}

#[async_trait::async_trait]
impl Compositor for DryRunCompositor {
    async fn get_tree(&self) -> Result<Node> {
        Ok(self.tree.lock().clone())
    }

    async fn run_command(&self, command: &str) -> Result<()> {
        info!("[DRY RUN] Команда sway: {}", command);
        if let Some(id) = parse_focus_target(command) {
            apply_focus(&mut self.tree.lock(), id);
        }
        self.commands.lock().push(command.to_string());
        Ok(())
    }

    async fn subscribe_windows(&self) -> Result<WindowEventStream> {
        let (tx, rx) = mpsc::channel(64);

        let script = self.script.lock().take();
        if let Some(events) = script {
            tokio::spawn(async move {
                for event in events {
                    if tx.send(Ok(event)).await.is_err() {
                        return;
                    }
                }
            });
            return Ok(rx);
        }

        info!("Dry-run режим - события окон эмулируются");
        let windows: Vec<Node> = {
            let tree = self.tree.lock();
            let mut windows = Vec::new();
            tree.walk(&mut |node| {
                if node.is_window() {
                    windows.push(node.clone());
                }
            });
            windows
        };
        let tick = self.tick;

        tokio::spawn(async move {
            if windows.is_empty() {
                return;
            }
            let mut window_index = 0;
            let mut interval = interval(tick);
            loop {
                interval.tick().await;
                let window = windows[window_index].clone();
                info!("Dry-run: эмулируем смену окна на: {}", window.title());
                if tx.send(Ok(WindowEvent::focus(window))).await.is_err() {
                    return;
                }
                window_index = (window_index + 1) % windows.len();
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::compositor::focus_command;

    #[tokio::test]
    async fn test_focus_command_moves_focus() {
        let compositor = DryRunCompositor::demo();
        compositor.run_command(&focus_command(6)).await.unwrap();

        let tree = compositor.get_tree().await.unwrap();
        assert_eq!(tree.focused_node().map(|n| n.id), Some(6));
        assert_eq!(compositor.executed(), vec!["[con_id=6] focus".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_stream_closes_after_events() {
        let compositor = DryRunCompositor::demo().with_script(vec![
            WindowEvent::focus(Node::window(5, "foot", "a")),
            WindowEvent::close(Node::window(5, "foot", "a")),
        ]);
        let mut stream = compositor.subscribe_windows().await.unwrap();
        assert!(stream.recv().await.unwrap().is_ok());
        assert!(stream.recv().await.unwrap().is_ok());
        assert!(stream.recv().await.is_none());
    }

    #[test]
    fn test_parse_focus_target() {
        assert_eq!(parse_focus_target("[con_id=17] focus"), Some(17));
        assert_eq!(parse_focus_target("workspace 2"), None);
    }
}
