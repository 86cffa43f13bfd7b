//! Протокол сокета демона: одна JSON-строка запроса, в ответ одна строка с
//! JSON-массивом записей MRU. Ошибка обозначается закрытием соединения без ответа.

use crate::tree::WindowId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DaemonRequest {
    /// Текущий список MRU, последнее сфокусированное окно первым
    ListWindows,
}

/// Запрос длиннее этого без перевода строки не принимается
pub const MAX_REQUEST_BYTES: u64 = 4096;

/// Запись списка MRU в том виде, в каком она уходит клиентам
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MruEntry {
    #[serde(rename = "ID")]
    pub id: WindowId,
    #[serde(rename = "AppID")]
    pub app_id: String,
}

impl MruEntry {
    pub fn new(id: WindowId, app_id: &str) -> Self {
        Self {
            id,
            app_id: app_id.to_string(),
        }
    }
}

impl fmt::Display for MruEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.app_id)
    }
}
