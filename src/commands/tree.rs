use crate::error::Result;
use crate::services::compositor::Compositor;
use crate::tree::render_tree;
use std::io::Write;

/// `tree`: сокращённое дерево sway в stdout
pub async fn run<W: Write>(compositor: &dyn Compositor, out: &mut W) -> Result<()> {
    let tree = compositor.get_tree().await?;
    out.write_all(render_tree(&tree).as_bytes())?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::compositor::DryRunCompositor;

    #[tokio::test]
    async fn test_prints_demo_tree() {
        let mut out = Vec::new();
        run(&DryRunCompositor::demo(), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "[1:root]");
        assert_eq!(lines[2], "    [3:workspace]");
        assert_eq!(lines[3], "      [9:floating_con] [app_id:pavucontrol] | Volume Control - dry_run");
        assert_eq!(lines.len(), 8);
    }
}
