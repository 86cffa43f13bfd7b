use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор контейнера sway (con_id)
pub type WindowId = i64;

/// Узел дерева sway в том виде, в каком его отдаёт `get_tree`.
///
/// Лишние поля ответа игнорируются; всё, что может отсутствовать у
/// служебных узлов (output, workspace), сделано необязательным.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: WindowId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub floating_nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    Output,
    Workspace,
    Con,
    FloatingCon,
    Dockarea,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Root => "root",
            NodeType::Output => "output",
            NodeType::Workspace => "workspace",
            NodeType::Con => "con",
            NodeType::FloatingCon => "floating_con",
            NodeType::Dockarea => "dockarea",
            NodeType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl Node {
    pub fn new(id: WindowId, node_type: NodeType) -> Self {
        Self {
            id,
            name: None,
            node_type,
            app_id: None,
            shell: None,
            focused: false,
            visible: None,
            nodes: Vec::new(),
            floating_nodes: Vec::new(),
        }
    }

    /// Окно-приложение: con/floating_con без дочерних узлов.
    /// Контейнеры раскладки тоже имеют тип con, но всегда содержат детей.
    pub fn window(id: WindowId, app_id: &str, title: &str) -> Self {
        let mut node = Self::new(id, NodeType::Con);
        node.app_id = Some(app_id.to_string());
        node.name = Some(title.to_string());
        node.shell = Some("xdg_shell".to_string());
        node
    }

    pub fn with_children(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_floating(mut self, floating_nodes: Vec<Node>) -> Self {
        self.floating_nodes = floating_nodes;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn is_window(&self) -> bool {
        matches!(self.node_type, NodeType::Con | NodeType::FloatingCon)
            && self.nodes.is_empty()
            && self.floating_nodes.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(false)
    }

    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Обход в глубину: сначала плавающие, затем тайловые дети
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        for child in &self.floating_nodes {
            child.walk(visit);
        }
        for child in &self.nodes {
            child.walk(visit);
        }
    }

    /// То же, но с глубиной узла (для печати дерева)
    pub fn walk_with_depth<'a>(&'a self, depth: usize, visit: &mut dyn FnMut(&'a Node, usize)) {
        visit(self, depth);
        for child in &self.floating_nodes {
            child.walk_with_depth(depth + 1, visit);
        }
        for child in &self.nodes {
            child.walk_with_depth(depth + 1, visit);
        }
    }

    pub fn focused_node(&self) -> Option<&Node> {
        let mut found = None;
        self.walk(&mut |node| {
            if found.is_none() && node.focused {
                found = Some(node);
            }
        });
        found
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        let mut ids = Vec::new();
        self.walk(&mut |node| {
            if node.is_window() {
                ids.push(node.id);
            }
        });
        ids
    }

    /// Заголовок для вывода: не-xdg окна помечаются оболочкой (например, `[xwayland] ...`)
    pub fn display_title(&self) -> String {
        match self.shell.as_deref() {
            Some(shell) if shell != "xdg_shell" => format!("[{}] {}", shell, self.title()),
            _ => self.title().to_string(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.id, self.node_type)?;
        if let Some(app_id) = self.app_id.as_deref().filter(|a| !a.is_empty()) {
            write!(f, " [app_id:{}]", app_id)?;
        }
        if let Some(shell) = self.shell.as_deref().filter(|s| *s != "xdg_shell") {
            write!(f, " [shell:{}]", shell)?;
        }
        if !self.title().is_empty() {
            write!(f, " | {}", self.title())?;
        }
        Ok(())
    }
}

/// Сокращённое представление дерева для команды `tree`
pub fn render_tree(root: &Node) -> String {
    let mut out = String::new();
    root.walk_with_depth(0, &mut |node, depth| {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&node.to_string());
        out.push('\n');
    });
    out
}
