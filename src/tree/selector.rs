//! Выбор окон из снимка дерева sway.
//!
//! Все функции здесь чистые: на вход снимок дерева и (опционально) порядок
//! MRU от демона, на выходе выбранные узлы. Никакого IPC.

use crate::error::{Result, SwayctrlError};
use crate::services::protocol::MruEntry;
use crate::tree::node::{Node, WindowId};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Критерии команды `focus`: все заданные условия должны выполняться
#[derive(Debug, Clone, Default)]
pub struct WindowCriteria {
    pub title: Option<Regex>,
    pub app_id: Option<String>,
}

impl WindowCriteria {
    /// Хотя бы одно из условий обязательно; пустой шаблон считается не заданным
    pub fn new(title: Option<&str>, app_id: Option<&str>) -> Result<Self> {
        let title = title.filter(|t| !t.is_empty());
        let app_id = app_id.filter(|a| !a.is_empty());
        if title.is_none() && app_id.is_none() {
            return SwayctrlError::precondition("Нужен хотя бы один из параметров --title или --appid");
        }
        Ok(Self {
            title: title.map(Regex::new).transpose()?,
            app_id: app_id.map(str::to_string),
        })
    }

    pub fn matches(&self, node: &Node) -> bool {
        if !node.is_window() {
            return false;
        }
        if let Some(re) = &self.title {
            if !re.is_match(node.title()) {
                return false;
            }
        }
        if let Some(app_id) = &self.app_id {
            if node.app_id.as_deref() != Some(app_id.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Позиции окон в списке MRU (0 = последнее сфокусированное)
pub fn mru_positions(entries: &[MruEntry]) -> HashMap<WindowId, usize> {
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| (entry.id, idx))
        .collect()
}

/// Все узлы, удовлетворяющие предикату, в порядке обхода дерева
pub fn tree_select<'a>(root: &'a Node, pick: impl Fn(&Node) -> bool) -> Vec<&'a Node> {
    let mut matches = Vec::new();
    root.walk(&mut |node| {
        if pick(node) {
            matches.push(node);
        }
    });
    matches
}

/// Порядок предпочтения: видимые раньше скрытых, затем недавно
/// сфокусированные, затем исходный порядок дерева (сортировка стабильная)
pub fn compare_candidates(a: &Node, b: &Node, positions: &HashMap<WindowId, usize>) -> Ordering {
    b.is_visible()
        .cmp(&a.is_visible())
        .then_with(|| match (positions.get(&a.id), positions.get(&b.id)) {
            (Some(pa), Some(pb)) => pa.cmp(pb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

pub fn rank_matches<'a>(mut matches: Vec<&'a Node>, positions: &HashMap<WindowId, usize>) -> Vec<&'a Node> {
    matches.sort_by(|a, b| compare_candidates(a, b, positions));
    matches
}

/// Лучшее окно для `focus`, если есть совпадения
pub fn pick_best<'a>(
    root: &'a Node,
    criteria: &WindowCriteria,
    positions: &HashMap<WindowId, usize>,
) -> Option<&'a Node> {
    let matches = tree_select(root, |node| criteria.matches(node));
    rank_matches(matches, positions).into_iter().next()
}

/// Следующий экземпляр того же приложения после `focused` (по кругу, в порядке дерева).
/// `Ok(None)` когда других экземпляров нет.
pub fn next_app_instance<'a>(root: &'a Node, focused: &Node) -> Result<Option<&'a Node>> {
    let app_id = match focused.app_id.as_deref() {
        Some(app_id) => app_id,
        None => {
            return SwayctrlError::precondition("Сфокусированный узел не является окном с app_id")
        }
    };

    let matches = tree_select(root, |node| node.app_id.as_deref() == Some(app_id));
    if matches.len() < 2 {
        return Ok(None);
    }

    let current = matches
        .iter()
        .position(|node| node.id == focused.id)
        .ok_or_else(|| SwayctrlError::Internal("Несогласованное дерево: фокус не найден среди окон приложения".to_string()))?;

    Ok(Some(matches[(current + 1) % matches.len()]))
}

/// Предыдущее окно для `prev`: первая запись MRU, отличная от текущего фокуса
pub fn previous_window(entries: &[MruEntry], focused_id: WindowId) -> Option<&MruEntry> {
    entries.iter().find(|entry| entry.id != focused_id)
}
