use crate::config::SwayConfig;
use crate::error::Result;
use crate::services::compositor::discover_socket;
use crate::swayctrl_error;
use std::process::Command;
use tracing::debug;

pub const USAGE_EXIT_CODE: i32 = 2;

/// `swaymsg [args…]`: запустить swaymsg с правильным SWAYSOCK и вернуть его код выхода
pub fn run(config: &SwayConfig, args: &[String]) -> Result<i32> {
    if args.is_empty() {
        eprintln!("Использование: swayctrl swaymsg <аргументы swaymsg>");
        return Ok(USAGE_EXIT_CODE);
    }

    let socket = discover_socket(config.socket_path.as_deref())?;
    debug!("swaymsg {:?} через {:?}", args, socket);

    let status = Command::new(&config.swaymsg)
        .args(args)
        .env("SWAYSOCK", &socket)
        .status()
        .map_err(|e| swayctrl_error!(ipc, "не удалось запустить {}: {}", config.swaymsg, e))?;

    // Завершение по сигналу без кода
    Ok(status.code().unwrap_or(1))
}
