use crate::error::Result;
use crate::services::mru::MruState;
use crate::services::protocol::{DaemonRequest, MruEntry, MAX_REQUEST_BYTES};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

/// Сокет демона: отдаёт копию MRU каждому подключившемуся клиенту.
///
/// Мьютекс MRU держится только пока снимается копия; сериализация и запись
/// в сокет идут уже без него, так что медленный клиент не тормозит EventListener.
pub struct QueryServer {
    listener: UnixListener,
    socket_path: PathBuf,
    state: Arc<MruState>,
    request_timeout: Duration,
}

impl QueryServer {
    /// Должен вызываться внутри runtime tokio
    pub fn bind(socket_path: &Path, state: Arc<MruState>, request_timeout: Duration) -> Result<Self> {
        // Сокет от упавшего экземпляра; второй живой экземпляр отсекает lock-файл
        match std::fs::remove_file(socket_path) {
            Ok(()) => debug!("Удалён устаревший сокет {:?}", socket_path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let listener = UnixListener::bind(socket_path)?;
        std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        info!("QueryServer слушает {:?}", socket_path);

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            state,
            request_timeout,
        })
    }

    pub async fn run(self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => {
                    let state = Arc::clone(&self.state);
                    let request_timeout = self.request_timeout;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state, request_timeout).await {
                            warn!("Ошибка соединения с клиентом: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Ошибка accept на {:?}: {}", self.socket_path, e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
            }
        }
    }
}

impl Drop for QueryServer {
    fn drop(&mut self) {
        // Best-effort: процесс всё равно завершается
        let _ = std::fs::remove_file(&self.socket_path);
        info!("QueryServer остановлен, сокет {:?} удалён", self.socket_path);
    }
}

/// Неверный, слишком длинный или запоздавший запрос: соединение закрывается без ответа
async fn handle_connection(stream: UnixStream, state: Arc<MruState>, request_timeout: Duration) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader.take(MAX_REQUEST_BYTES));
    let mut line = String::new();

    match tokio::time::timeout(request_timeout, reader.read_line(&mut line)).await {
        Ok(read) => {
            read?;
        }
        Err(_) => {
            debug!("Клиент не прислал запрос за {:?}", request_timeout);
            return Ok(());
        }
    }
    if !line.ends_with('\n') {
        if !line.is_empty() {
            warn!("Запрос без перевода строки в пределах {} байт отклонён", MAX_REQUEST_BYTES);
        }
        return Ok(());
    }

    let request = match serde_json::from_str::<DaemonRequest>(&line) {
        Ok(request) => request,
        Err(e) => {
            warn!("Некорректный запрос: {}", e);
            return Ok(());
        }
    };

    let mut payload = serde_json::to_vec(&respond(&state, request))?;
    payload.push(b'\n');
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Ответ на запрос; блокировка MRU берётся только внутри `snapshot()`
pub fn respond(state: &MruState, request: DaemonRequest) -> Vec<MruEntry> {
    match request {
        DaemonRequest::ListWindows => state.snapshot(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwayctrlError;
    use crate::services::daemon_client::DaemonClient;
    use crate::tree::WindowId;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    const BASE_IDS: WindowId = 8;

    fn client_for(path: &Path) -> DaemonClient {
        DaemonClient::new(path.to_path_buf(), Duration::from_secs(2))
    }

    fn bind(path: &Path, state: Arc<MruState>) -> QueryServer {
        QueryServer::bind(path, state, Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn test_list_windows_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swayctrl.sock");
        let state = Arc::new(MruState::new());
        state.bring_front(1, "foot");
        state.bring_front(2, "firefox");

        let handle = tokio::spawn(bind(&path, state.clone()).run());

        assert_eq!(
            client_for(&path).list_windows().await.unwrap(),
            vec![MruEntry::new(2, "firefox"), MruEntry::new(1, "foot")]
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_reply_is_bare_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swayctrl.sock");
        let state = Arc::new(MruState::new());
        state.bring_front(1, "foot");
        state.bring_front(2, "firefox");
        let handle = tokio::spawn(bind(&path, state).run());

        let mut stream = UnixStream::connect(&path).await.unwrap();
        stream.write_all(b"{\"type\":\"ListWindows\"}\n").await.unwrap();
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert!(value.is_array());
        assert_eq!(line, "[{\"ID\":2,\"AppID\":\"firefox\"},{\"ID\":1,\"AppID\":\"foot\"}]\n");

        handle.abort();
    }

    #[tokio::test]
    async fn test_malformed_request_closes_without_reply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swayctrl.sock");
        let handle = tokio::spawn(bind(&path, Arc::new(MruState::new())).run());

        let mut stream = UnixStream::connect(&path).await.unwrap();
        stream.write_all(b"{\"type\":\"Reboot\"}\n").await.unwrap();
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await.unwrap();
        assert!(reply.is_empty());

        handle.abort();
    }

    #[tokio::test]
    async fn test_silent_client_is_dropped_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swayctrl.sock");
        let server = QueryServer::bind(&path, Arc::new(MruState::new()), Duration::from_millis(100)).unwrap();
        let handle = tokio::spawn(server.run());

        let mut stream = UnixStream::connect(&path).await.unwrap();
        let started = Instant::now();
        let mut reply = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut reply))
            .await
            .expect("сервер должен закрыть соединение")
            .unwrap();
        assert!(reply.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));

        handle.abort();
    }

    #[tokio::test]
    async fn test_oversized_request_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swayctrl.sock");
        let handle = tokio::spawn(bind(&path, Arc::new(MruState::new())).run());

        let mut stream = UnixStream::connect(&path).await.unwrap();
        let junk = vec![b'x'; (MAX_REQUEST_BYTES as usize) * 2];
        // Сервер может закрыть соединение до конца записи
        let _ = stream.write_all(&junk).await;
        let mut reply = Vec::new();
        let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut reply))
            .await
            .expect("сервер должен закрыть соединение");
        assert!(reply.is_empty());

        handle.abort();
    }

    #[tokio::test]
    async fn test_stale_socket_replaced_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swayctrl.sock");
        std::fs::write(&path, b"stale").unwrap();

        let server = bind(&path, Arc::new(MruState::new()));
        assert!(path.exists());
        drop(server);
        assert!(!path.exists());

        // Без демона клиент получает жёсткую ошибку
        let err = client_for(&path).list_windows().await.unwrap_err();
        assert!(matches!(err, SwayctrlError::DaemonUnavailable(_)));
    }

    /// Допустимые состояния при работе писателя ниже: все базовые окна ровно
    /// по одному разу и не больше одного временного окна, причём в голове
    fn assert_legal_snapshot(windows: &[MruEntry]) {
        let ids: Vec<WindowId> = windows.iter().map(|w| w.id).collect();
        let unique: HashSet<WindowId> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len(), "дубликаты в снимке: {:?}", ids);

        let base: HashSet<WindowId> = ids.iter().copied().filter(|id| *id <= BASE_IDS).collect();
        assert_eq!(base, (1..=BASE_IDS).collect::<HashSet<_>>(), "снимок: {:?}", ids);

        let transient: Vec<usize> = ids
            .iter()
            .enumerate()
            .filter(|(_, id)| **id > BASE_IDS)
            .map(|(pos, _)| pos)
            .collect();
        assert!(transient.is_empty() || transient == vec![0], "снимок: {:?}", ids);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_queries_never_see_torn_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swayctrl.sock");
        let state = Arc::new(MruState::new());
        for id in 1..=BASE_IDS {
            state.bring_front(id, "app");
        }

        let server_handle = tokio::spawn(bind(&path, state.clone()).run());

        // Писатель переставляет базовые окна и парами вставляет/удаляет временные
        let stop = Arc::new(AtomicBool::new(false));
        let writer = {
            let state = state.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut i: i64 = 0;
                let mut transient = BASE_IDS + 1;
                while !stop.load(Ordering::Relaxed) {
                    state.bring_front(i % BASE_IDS + 1, "app");
                    state.bring_front(transient, "transient");
                    assert!(state.remove(transient));
                    transient += 1;
                    i = (i * 5 + 3) % 1_000_003;
                }
            })
        };

        let client = client_for(&path);
        let queries: Vec<_> = (0..64)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.list_windows().await })
            })
            .collect();

        for query in queries {
            let windows = query.await.unwrap().unwrap();
            assert_legal_snapshot(&windows);
        }

        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();
        assert_legal_snapshot(&state.snapshot());
        assert_eq!(state.len(), BASE_IDS as usize);
        server_handle.abort();
    }
}
