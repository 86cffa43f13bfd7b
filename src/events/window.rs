use crate::tree::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Событие окна из подписки sway (`subscribe ["window"]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowEvent {
    pub change: WindowEventType,
    pub container: Node,
}

impl WindowEvent {
    pub fn new(change: WindowEventType, container: Node) -> Self {
        Self { change, container }
    }

    #[allow(dead_code)]
    pub fn focus(container: Node) -> Self {
        Self::new(WindowEventType::Focus, container)
    }

    #[allow(dead_code)]
    pub fn close(container: Node) -> Self {
        Self::new(WindowEventType::Close, container)
    }

    /// app_id окна для истории; у окон без app_id (xwayland) ставится "?"
    pub fn app_id_or_placeholder(&self) -> &str {
        match self.container.app_id.as_deref() {
            Some(app_id) if !app_id.is_empty() => app_id,
            _ => "?",
        }
    }
}

impl fmt::Display for WindowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.change, self.container)
    }
}

/// Тип события окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowEventType {
    New,
    Close,
    Focus,
    Title,
    FullscreenMode,
    Move,
    Floating,
    Urgent,
    Mark,
    #[serde(other)]
    Other,
}
