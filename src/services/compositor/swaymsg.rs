use crate::config::SwayConfig;
use crate::error::{Result, SwayctrlError};
use crate::events::WindowEvent;
use crate::swayctrl_error;
use crate::tree::Node;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::r#trait::{check_outcomes, CommandOutcome, Compositor, WindowEventStream};

/// IPC sway через утилиту `swaymsg` в raw-режиме (`-r`, компактный JSON)
pub struct SwaymsgCompositor {
    swaymsg: String,
    socket_path: PathBuf,
}

impl SwaymsgCompositor {
    pub fn new(config: &SwayConfig) -> Result<Self> {
        let socket_path = discover_socket(config.socket_path.as_deref())?;
        debug!("Используется сокет sway: {:?}", socket_path);
        Ok(Self {
            swaymsg: config.swaymsg.clone(),
            socket_path,
        })
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.swaymsg);
        cmd.env("SWAYSOCK", &self.socket_path);
        cmd
    }

    async fn output(&self, args: &[&str]) -> Result<std::process::Output> {
        self.command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| swayctrl_error!(ipc, "не удалось запустить {}: {}", self.swaymsg, e))
    }
}

#[async_trait::async_trait]
impl Compositor for SwaymsgCompositor {
    async fn get_tree(&self) -> Result<Node> {
        let output = self.output(&["-r", "-t", "get_tree"]).await?;
        if !output.status.success() {
            return Err(swayctrl_error!(
                ipc,
                "GET_TREE завершился с ошибкой: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn run_command(&self, command: &str) -> Result<()> {
        // При неудачной команде swaymsg возвращает ненулевой код, но JSON с
        // причиной всё равно печатает в stdout
        let output = self.output(&["-r", "--", command]).await?;
        let outcomes: Vec<CommandOutcome> = serde_json::from_slice(&output.stdout).map_err(|e| {
            swayctrl_error!(
                ipc,
                "RUN_COMMAND {:?}: некорректный ответ ({}): {}",
                command,
                e,
                String::from_utf8_lossy(&output.stderr).trim()
            )
        })?;
        check_outcomes(&outcomes)
    }

    async fn subscribe_windows(&self) -> Result<WindowEventStream> {
        let mut child = self
            .command()
            .args(["-r", "-m", "-t", "subscribe", r#"["window"]"#])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| swayctrl_error!(ipc, "не удалось запустить подписку {}: {}", self.swaymsg, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| swayctrl_error!(internal, "stdout подписки недоступен"))?;

        info!("Подписка на события окон sway установлена");

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(e.into())).await;
                        return;
                    }
                };

                match parse_event_line(&line) {
                    Ok(Some(event)) => {
                        if tx.send(Ok(event)).await.is_err() {
                            // Получатель ушёл; процесс swaymsg убьёт kill_on_drop
                            return;
                        }
                    }
                    Ok(None) => continue,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }

            let status = match child.wait().await {
                Ok(status) => status.to_string(),
                Err(e) => e.to_string(),
            };
            warn!("swaymsg подписки завершился: {}", status);
            let _ = tx
                .send(Err(SwayctrlError::EventStreamClosed(format!("swaymsg завершился ({})", status))))
                .await;
        });

        Ok(rx)
    }
}

/// Строка вывода `swaymsg -m`: событие окна, ответ на подписку или пустая строка
fn parse_event_line(line: &str) -> Result<Option<WindowEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(line)?;
    if value.get("change").is_some() {
        return Ok(Some(serde_json::from_value(value)?));
    }
    if value.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
        return Err(swayctrl_error!(ipc, "sway отклонил подписку: {}", line));
    }
    Ok(None)
}

/// Сокет sway: $SWAYSOCK, если файл существует; иначе путь из настроек;
/// иначе единственный `/run/user/<uid>/sway-ipc.<uid>.*.sock`.
///
/// Нужно, чтобы утилиты работали из долгоживущих сессий tmux с устаревшим SWAYSOCK.
pub fn discover_socket(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = std::env::var_os("SWAYSOCK").map(PathBuf::from) {
        if path.exists() {
            return Ok(path);
        }
        debug!("SWAYSOCK {:?} не существует, ищем сокет сами", path);
    }

    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    // SAFETY: getuid не имеет предусловий и всегда успешен
    let uid = unsafe { libc::getuid() };
    let dir = PathBuf::from(format!("/run/user/{}", uid));
    let prefix = format!("sway-ipc.{}.", uid);

    let mut candidates = find_sockets(&dir, &prefix)?;
    match candidates.len() {
        0 => Err(swayctrl_error!(
            ipc,
            "Не удалось найти сокет sway ({}/{}*.sock)",
            dir.display(),
            prefix
        )),
        1 => Ok(candidates.remove(0)),
        n => Err(swayctrl_error!(
            ipc,
            "Найдено {} сокетов sway по шаблону {}/{}*.sock",
            n,
            dir.display(),
            prefix
        )),
    }
}

fn find_sockets(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut sockets = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|name| name.starts_with(prefix) && name.ends_with(".sock"))
            .unwrap_or(false);
        if matches {
            sockets.push(path);
        }
    }
    sockets.sort();
    Ok(sockets)
}
