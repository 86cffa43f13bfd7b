use crate::error::Result;
use crate::services::compositor::Compositor;
use crate::services::mru::MruState;
use crate::tree::{Node, WindowId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Периодическая сверка MRU с деревом sway на случай пропущенного `close`.
///
/// Окно удаляется, только если его нет в двух сверках подряд: окно, которое
/// появилось и получило фокус между снимком дерева и сверкой, не пострадает.
pub struct Reconciler {
    compositor: Arc<dyn Compositor>,
    state: Arc<MruState>,
    period: Duration,
    suspects: HashSet<WindowId>,
}

impl Reconciler {
    pub fn new(compositor: Arc<dyn Compositor>, state: Arc<MruState>, period: Duration) -> Self {
        Self {
            compositor,
            state,
            period,
            suspects: HashSet::new(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!("Сверка MRU с деревом каждые {:?}", self.period);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Первый тик срабатывает сразу, история в этот момент ещё пустая
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.compositor.get_tree().await {
                Ok(tree) => {
                    self.sweep(&tree);
                }
                Err(e) => warn!("Сверка MRU пропущена, дерево недоступно: {}", e),
            }
        }
    }

    /// Одна сверка; возвращает удалённые окна
    pub fn sweep(&mut self, tree: &Node) -> Vec<WindowId> {
        let live: HashSet<WindowId> = tree.window_ids().into_iter().collect();
        let missing: HashSet<WindowId> = self
            .state
            .snapshot()
            .into_iter()
            .map(|entry| entry.id)
            .filter(|id| !live.contains(id))
            .collect();

        let mut evicted = Vec::new();
        for id in missing.intersection(&self.suspects) {
            if self.state.remove(*id) {
                evicted.push(*id);
            }
        }
        self.suspects = missing.difference(&self.suspects).copied().collect();

        if evicted.is_empty() {
            debug!("Сверка MRU: расхождений нет, под подозрением {}", self.suspects.len());
        } else {
            warn!("Сверка MRU: удалены закрытые окна без события close: {:?}", evicted);
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::compositor::DryRunCompositor;
    use crate::tree::NodeType;

    fn tree_with(ids: &[WindowId]) -> Node {
        let windows = ids.iter().map(|id| Node::window(*id, "app", "w")).collect();
        Node::new(1, NodeType::Root).with_children(vec![Node::new(2, NodeType::Workspace).with_children(windows)])
    }

    #[test]
    fn test_evicts_after_two_consecutive_misses() {
        let state = Arc::new(MruState::new());
        for id in [10, 20, 30] {
            state.bring_front(id, "app");
        }
        let mut reconciler = Reconciler::new(
            Arc::new(DryRunCompositor::demo()),
            state.clone(),
            Duration::from_secs(1),
        );

        // 20 пропал впервые: только подозрение
        assert!(reconciler.sweep(&tree_with(&[10, 30])).is_empty());
        assert_eq!(state.len(), 3);

        // 30 тоже пропал, 20 пропал второй раз
        assert_eq!(reconciler.sweep(&tree_with(&[10])), vec![20]);
        assert_eq!(state.len(), 2);

        assert_eq!(reconciler.sweep(&tree_with(&[10])), vec![30]);
        let ids: Vec<WindowId> = state.snapshot().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![10]);
    }

    #[test]
    fn test_window_that_reappears_is_kept() {
        let state = Arc::new(MruState::new());
        state.bring_front(5, "app");
        let mut reconciler = Reconciler::new(
            Arc::new(DryRunCompositor::demo()),
            state.clone(),
            Duration::from_secs(1),
        );

        assert!(reconciler.sweep(&tree_with(&[])).is_empty());
        assert!(reconciler.sweep(&tree_with(&[5])).is_empty());
        assert!(reconciler.sweep(&tree_with(&[])).is_empty());
        assert_eq!(state.len(), 1);
    }
}
