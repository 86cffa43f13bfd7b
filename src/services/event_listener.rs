use crate::debug_if_enabled;
use crate::error::{Result, SwayctrlError};
use crate::events::{WindowEvent, WindowEventType};
use crate::services::compositor::Compositor;
use crate::services::mru::MruState;
use std::sync::Arc;
use tracing::{error, info};

/// EventListener: единственный писатель в MRU.
///
/// Фокус переносит окно в голову списка, закрытие удаляет его, остальные
/// события игнорируются. Потеря подписки фатальна: демон не должен отдавать
/// устаревшую историю.
pub struct EventListener {
    compositor: Arc<dyn Compositor>,
    state: Arc<MruState>,
    verbose: bool,
}

impl EventListener {
    pub fn new(compositor: Arc<dyn Compositor>, state: Arc<MruState>, verbose: bool) -> Self {
        info!("Инициализация EventListener (verbose: {})", verbose);
        Self {
            compositor,
            state,
            verbose,
        }
    }

    /// Возвращается только с ошибкой
    pub async fn run(self) -> Result<()> {
        let mut events = self.compositor.subscribe_windows().await?;
        info!("EventListener запущен, ждём события окон");

        while let Some(event) = events.recv().await {
            match event {
                Ok(event) => {
                    self.handle_event(&event);
                }
                Err(e) => {
                    error!("Ошибка потока событий sway: {}", e);
                    return Err(e);
                }
            }
        }

        Err(SwayctrlError::EventStreamClosed(
            "подписка на события окон закрыта".to_string(),
        ))
    }

    /// Применить одно событие; true, если оно изменило MRU
    pub fn handle_event(&self, event: &WindowEvent) -> bool {
        match event.change {
            WindowEventType::Focus => {
                self.state
                    .bring_front(event.container.id, event.app_id_or_placeholder());
            }
            WindowEventType::Close => {
                self.state.remove(event.container.id);
            }
            _ => return false,
        }

        if self.verbose {
            let entries: Vec<String> = self.state.snapshot().iter().map(|e| e.to_string()).collect();
            info!("Event[{:?}]: [{}]", event.change, entries.join(" "));
        } else {
            debug_if_enabled!("Событие {} применено, окон в истории: {}", event, self.state.len());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::compositor::DryRunCompositor;
    use crate::services::protocol::MruEntry;
    use crate::tree::Node;

    fn listener_with(events: Vec<WindowEvent>) -> (EventListener, Arc<MruState>) {
        let compositor = Arc::new(DryRunCompositor::demo().with_script(events));
        let state = Arc::new(MruState::new());
        (EventListener::new(compositor, state.clone(), false), state)
    }

    #[tokio::test]
    async fn test_focus_and_close_update_history() {
        let (listener, state) = listener_with(vec![
            WindowEvent::focus(Node::window(1, "foot", "a")),
            WindowEvent::focus(Node::window(2, "firefox", "b")),
            WindowEvent::new(WindowEventType::Title, Node::window(3, "kitty", "c")),
            WindowEvent::focus(Node::window(1, "foot", "a")),
            WindowEvent::focus(Node::window(4, "", "xterm")),
            WindowEvent::close(Node::window(2, "firefox", "b")),
        ]);

        let result = listener.run().await;
        assert!(matches!(result, Err(SwayctrlError::EventStreamClosed(_))));
        assert_eq!(
            state.snapshot(),
            vec![MruEntry::new(4, "?"), MruEntry::new(1, "foot")]
        );
    }

    #[test]
    fn test_ignored_events_do_not_touch_history() {
        let (listener, state) = listener_with(Vec::new());
        let applied = listener.handle_event(&WindowEvent::new(
            WindowEventType::New,
            Node::window(9, "foot", "new"),
        ));
        assert!(!applied);
        assert_eq!(state.len(), 0);

        // Закрытие неизвестного окна не ошибка
        assert!(listener.handle_event(&WindowEvent::close(Node::window(9, "foot", "x"))));
        assert_eq!(state.len(), 0);
    }
}
