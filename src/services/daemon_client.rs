//! Клиент сокета демона для короткоживущих команд (`focus`, `prev`).
//!
//! Один запрос, один ответ, общий таймаут на подключение и обмен. Любой
//! сбой это `DaemonUnavailable`: без истории эти команды работать не могут.

use crate::error::Result;
use crate::services::protocol::{DaemonRequest, MruEntry};
use crate::swayctrl_error;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl DaemonClient {
    pub fn new(socket_path: PathBuf, timeout: Duration) -> Self {
        Self {
            socket_path,
            timeout,
        }
    }

    /// История фокуса, последнее сфокусированное окно первым
    pub async fn list_windows(&self) -> Result<Vec<MruEntry>> {
        tokio::time::timeout(self.timeout, self.exchange(&DaemonRequest::ListWindows))
            .await
            .map_err(|_| {
                swayctrl_error!(
                    daemon_unavailable,
                    "нет ответа от {:?} за {:?}",
                    self.socket_path,
                    self.timeout
                )
            })?
    }

    async fn exchange(&self, request: &DaemonRequest) -> Result<Vec<MruEntry>> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            swayctrl_error!(daemon_unavailable, "подключение к {:?}: {}", self.socket_path, e)
        })?;
        let (reader, mut writer) = stream.into_split();

        let mut payload = serde_json::to_vec(request)?;
        payload.push(b'\n');
        writer
            .write_all(&payload)
            .await
            .map_err(|e| swayctrl_error!(daemon_unavailable, "отправка запроса: {}", e))?;

        let mut line = String::new();
        BufReader::new(reader)
            .read_line(&mut line)
            .await
            .map_err(|e| swayctrl_error!(daemon_unavailable, "чтение ответа: {}", e))?;
        if line.trim().is_empty() {
            return Err(swayctrl_error!(daemon_unavailable, "демон закрыл соединение без ответа (некорректный запрос?)"));
        }

        serde_json::from_str(&line)
            .map_err(|e| swayctrl_error!(daemon_unavailable, "некорректный ответ демона: {}", e))
    }
}
