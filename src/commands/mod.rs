//! Обработчики подкоманд CLI.
//!
//! Каждая команда получает композитор через trait, поэтому с `--dry-run`
//! и в тестах работает с деревом в памяти.

pub mod appnext;
pub mod daemon;
pub mod focus;
pub mod focus_title;
pub mod launch;
pub mod passthrough;
pub mod prev;
pub mod tree;

use crate::config::Config;
use crate::error::{Result, SwayctrlError};
use crate::services::daemon_client::DaemonClient;
use crate::tree::Node;

/// Клиент демона по настройкам; без XDG_RUNTIME_DIR это ошибка предусловия
pub fn daemon_client(config: &Config) -> Result<DaemonClient> {
    Ok(DaemonClient::new(config.socket_path()?, config.request_timeout()))
}

pub fn focused_node(tree: &Node) -> Result<&Node> {
    match tree.focused_node() {
        Some(node) => Ok(node),
        None => SwayctrlError::precondition("В дереве нет сфокусированного узла"),
    }
}
