use crate::error::{Result, SwayctrlError};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Эксклюзивная неблокирующая flock-блокировка: не больше одного демона.
///
/// Снимается в Drop, а при аварийном завершении процесса её снимает ядро
/// вместе с закрытием дескриптора.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        // SAFETY: дескриптор принадлежит `file` и открыт на всё время вызова
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::WouldBlock {
                return Err(SwayctrlError::AlreadyRunning(path.to_path_buf()));
            }
            return Err(err.into());
        }

        info!("Блокировка экземпляра получена: {:?}", path);
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Ошибки игнорируем: процесс всё равно завершается
        // SAFETY: дескриптор ещё принадлежит `self.file`
        let _ = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        debug!("Блокировка экземпляра снята: {:?}", self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_second_acquire_fails_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swayctrl.lock");

        let first = InstanceLock::acquire(&path).unwrap();
        assert_eq!(first.path(), path.as_path());

        let started = Instant::now();
        let second = InstanceLock::acquire(&path);
        assert!(matches!(second, Err(SwayctrlError::AlreadyRunning(_))));
        assert!(started.elapsed() < Duration::from_secs(1));

        drop(first);
        assert!(InstanceLock::acquire(&path).is_ok());
    }
}
