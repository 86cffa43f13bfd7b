use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwayctrlError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка разбора JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Неверное регулярное выражение для -title: {0}")]
    Regex(#[from] regex::Error),

    #[error("Ошибка IPC sway: {0}")]
    Ipc(String),

    #[error("Команда #{index} не выполнена: {message}")]
    CommandFailed { index: usize, message: String },

    #[error("Поток событий sway завершился: {0}")]
    EventStreamClosed(String),

    #[error("Демон недоступен (запущен ли он?): {0}")]
    DaemonUnavailable(String),

    #[error("Другой экземпляр уже запущен (файл блокировки {0:?} занят)")]
    AlreadyRunning(PathBuf),

    #[error("{0}")]
    Precondition(String),

    #[error("Таймаут: {0}")]
    Timeout(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl SwayctrlError {
    pub fn precondition<T>(msg: impl Into<String>) -> Result<T> {
        Err(SwayctrlError::Precondition(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, SwayctrlError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! swayctrl_error {
    (ipc, $($arg:tt)*) => {
        $crate::error::SwayctrlError::Ipc(format!($($arg)*))
    };
    (daemon_unavailable, $($arg:tt)*) => {
        $crate::error::SwayctrlError::DaemonUnavailable(format!($($arg)*))
    };
    (precondition, $($arg:tt)*) => {
        $crate::error::SwayctrlError::Precondition(format!($($arg)*))
    };
    (timeout, $($arg:tt)*) => {
        $crate::error::SwayctrlError::Timeout(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::SwayctrlError::Internal(format!($($arg)*))
    };
}
