use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub daemon: DaemonConfig,
    pub launch: LaunchConfig,
    pub sway: SwayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DaemonConfig {
    /// Каталог для сокета и lock-файла; по умолчанию $XDG_RUNTIME_DIR
    #[serde(default)]
    pub runtime_dir: Option<PathBuf>,
    pub socket_name: String,
    pub lock_name: String,
    pub request_timeout_ms: u64,
    /// 0 отключает сверку MRU с деревом
    pub reconcile_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LaunchConfig {
    pub poll_interval_ms: u64,
    pub deadline_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SwayConfig {
    /// Явный путь к IPC-сокету sway, если SWAYSOCK устарел
    #[serde(default)]
    pub socket_path: Option<PathBuf>,
    pub swaymsg: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
                filter: "swayctrl=info".to_string(),
            },
            daemon: DaemonConfig {
                runtime_dir: None,
                socket_name: "swayctrl.sock".to_string(),
                lock_name: "swayctrl.lock".to_string(),
                request_timeout_ms: 1000,
                reconcile_interval_secs: 30,
            },
            launch: LaunchConfig {
                poll_interval_ms: 50,
                deadline_ms: 1200,
            },
            sway: SwayConfig {
                socket_path: None,
                swaymsg: "swaymsg".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SWAYCTRL_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    /// Путь к конфигурации по умолчанию: $XDG_CONFIG_HOME/swayctrl/config.toml
    pub fn default_path() -> PathBuf {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("swayctrl").join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек демона
        if self.daemon.socket_name.is_empty() || self.daemon.lock_name.is_empty() {
            anyhow::bail!("socket_name и lock_name не могут быть пустыми");
        }

        if self.daemon.request_timeout_ms == 0 {
            anyhow::bail!("request_timeout_ms должно быть больше 0");
        }

        // Валидация настроек запуска
        if self.launch.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms должно быть больше 0");
        }

        if self.launch.deadline_ms < self.launch.poll_interval_ms {
            anyhow::bail!(
                "deadline_ms ({}) должно быть не меньше poll_interval_ms ({})",
                self.launch.deadline_ms,
                self.launch.poll_interval_ms
            );
        }

        if self.sway.swaymsg.is_empty() {
            anyhow::bail!("Путь к swaymsg не может быть пустым");
        }

        Ok(())
    }

    /// Каталог рабочих файлов демона. Без XDG_RUNTIME_DIR (и без явной настройки) работать нельзя
    pub fn runtime_dir(&self) -> crate::error::Result<PathBuf> {
        if let Some(dir) = &self.daemon.runtime_dir {
            return Ok(dir.clone());
        }
        match std::env::var_os("XDG_RUNTIME_DIR") {
            Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
            _ => crate::error::SwayctrlError::precondition(
                "XDG_RUNTIME_DIR должен быть задан (там размещается сокет демона)",
            ),
        }
    }

    pub fn socket_path(&self) -> crate::error::Result<PathBuf> {
        Ok(self.runtime_dir()?.join(&self.daemon.socket_name))
    }

    pub fn lock_path(&self) -> crate::error::Result<PathBuf> {
        Ok(self.runtime_dir()?.join(&self.daemon.lock_name))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.daemon.request_timeout_ms)
    }

    pub fn reconcile_interval(&self) -> Option<Duration> {
        match self.daemon.reconcile_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl LaunchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}
