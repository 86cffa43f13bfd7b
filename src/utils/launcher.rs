use crate::error::Result;
use crate::swayctrl_error;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use tracing::info;

/// Запустить приложение в собственной группе процессов, не дожидаясь его.
///
/// Отдельная группа нужна, чтобы приложение не получило SIGINT/SIGHUP,
/// адресованные терминалу, из которого вызвана утилита.
pub fn spawn_detached(program: &str, args: &[String]) -> Result<u32> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(|e| swayctrl_error!(precondition, "Ошибка запуска {:?}: {}", program, e))?;

    info!("Запущен {:?} (pid {})", program, child.id());
    Ok(child.id())
}

/// `focus --launch` передаёт команду оболочке целиком
pub fn spawn_shell(command: &str) -> Result<u32> {
    spawn_detached("/bin/sh", &["-c".to_string(), command.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwayctrlError;

    #[test]
    fn test_spawn_detached() {
        assert!(spawn_detached("true", &[]).unwrap() > 0);
        assert!(spawn_shell("exit 0").unwrap() > 0);
    }

    #[test]
    fn test_spawn_missing_program_is_error() {
        let err = spawn_detached("/nonexistent/swayctrl-test-binary", &[]).unwrap_err();
        assert!(matches!(err, SwayctrlError::Precondition(_)));
    }
}
