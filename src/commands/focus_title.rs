use crate::error::{Result, SwayctrlError};
use crate::events::WindowEventType;
use crate::services::compositor::Compositor;
use std::io::Write;

use super::focused_node;

/// `focustitle`: заголовок сфокусированного окна, затем по строке на каждую
/// смену фокуса или заголовка. Закрытие сфокусированного окна даёт пустую строку.
pub async fn run<W: Write>(compositor: &dyn Compositor, out: &mut W) -> Result<()> {
    // Подписка раньше снимка дерева, чтобы не потерять событие между ними
    let mut events = compositor.subscribe_windows().await?;

    let tree = compositor.get_tree().await?;
    writeln!(out, "{}", focused_node(&tree)?.display_title())?;
    out.flush()?;

    while let Some(event) = events.recv().await {
        let event = event?;
        if !event.container.focused {
            continue;
        }
        match event.change {
            WindowEventType::Focus | WindowEventType::Title => {
                writeln!(out, "{}", event.container.display_title())?;
            }
            WindowEventType::Close => writeln!(out)?,
            _ => continue,
        }
        out.flush()?;
    }

    Err(SwayctrlError::EventStreamClosed(
        "подписка на события окон закрыта".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WindowEvent;
    use crate::services::compositor::DryRunCompositor;
    use crate::tree::{Node, NodeType};

    #[tokio::test]
    async fn test_prints_titles_until_stream_ends() {
        let mut xwayland = Node::window(8, "", "Steam").with_focused(true);
        xwayland.shell = Some("xwayland".to_string());

        let compositor = DryRunCompositor::demo().with_script(vec![
            WindowEvent::focus(Node::window(6, "firefox", "Browser").with_focused(true)),
            WindowEvent::new(WindowEventType::Title, Node::window(7, "foot", "background")),
            WindowEvent::new(WindowEventType::Title, xwayland),
            WindowEvent::close(Node::window(8, "", "Steam").with_focused(true)),
            WindowEvent::close(Node::window(7, "foot", "background")),
        ]);

        let mut out = Vec::new();
        let err = run(&compositor, &mut out).await.unwrap_err();
        assert!(matches!(err, SwayctrlError::EventStreamClosed(_)));

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Terminal - dry_run\nBrowser\n[xwayland] Steam\n\n"
        );
    }

    #[tokio::test]
    async fn test_no_focused_node_is_precondition_error() {
        let tree = Node::new(1, NodeType::Root).with_children(vec![Node::window(5, "foot", "a")]);
        let compositor = DryRunCompositor::new(tree).with_script(Vec::new());

        let mut out = Vec::new();
        let err = run(&compositor, &mut out).await.unwrap_err();
        assert!(matches!(err, SwayctrlError::Precondition(_)));
        assert!(out.is_empty());
    }
}
