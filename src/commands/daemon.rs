use crate::config::Config;
use crate::error::Result;
use crate::services::compositor::Compositor;
use crate::services::event_listener::EventListener;
use crate::services::mru::MruState;
use crate::services::query_server::QueryServer;
use crate::services::reconciler::Reconciler;
use crate::utils::InstanceLock;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

/// `daemon [-v]`: вести историю фокуса и отдавать её через сокет.
///
/// Возвращается по сигналу завершения (`Ok`) или при потере подписки на
/// события (`Err`). Сокет и блокировка освобождаются в Drop на обоих путях.
pub async fn run(config: &Config, compositor: Arc<dyn Compositor>, verbose: bool) -> Result<()> {
    // Блокировка раньше сокета: иначе второй экземпляр удалил бы сокет живого
    let _lock = InstanceLock::acquire(&config.lock_path()?)?;

    let state = Arc::new(MruState::new());
    let server = QueryServer::bind(&config.socket_path()?, state.clone(), config.request_timeout())?;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Ошибка в QueryServer: {}", e);
        }
    });

    let reconciler_handle = config.reconcile_interval().map(|period| {
        let reconciler = Reconciler::new(compositor.clone(), state.clone(), period);
        tokio::spawn(async move {
            if let Err(e) = reconciler.run().await {
                warn!("Reconciler остановлен: {}", e);
            }
        })
    });

    let listener = EventListener::new(compositor, state.clone(), verbose);
    info!("Демон запущен");

    let result = tokio::select! {
        res = listener.run() => {
            if let Err(e) = &res {
                error!("Фатальная ошибка EventListener: {}", e);
            }
            res
        }
        res = shutdown_signal() => {
            info!("Получен сигнал завершения");
            res
        }
    };

    info!("Завершение работы, окон в истории: {}", state.len());

    if let Some(handle) = reconciler_handle {
        handle.abort();
        let _ = handle.await;
    }
    // Дождаться отмены, чтобы QueryServer был уничтожен и сокет удалён
    server_handle.abort();
    let _ = server_handle.await;

    result
}

async fn shutdown_signal() -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}

/// Паника в любой задаче (например, нарушение инварианта MRU) валит весь
/// процесс, а не только задачу tokio
pub fn install_abort_on_panic() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_hook(info);
        std::process::abort();
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwayctrlError;
    use crate::events::WindowEvent;
    use crate::services::compositor::DryRunCompositor;
    use crate::tree::Node;

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.daemon.runtime_dir = Some(dir.to_path_buf());
        config.daemon.reconcile_interval_secs = 0;
        config
    }

    #[tokio::test]
    async fn test_lost_event_stream_stops_daemon_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let compositor = Arc::new(
            DryRunCompositor::demo().with_script(vec![WindowEvent::focus(Node::window(5, "foot", "a"))]),
        );

        let err = run(&config, compositor, false).await.unwrap_err();
        assert!(matches!(err, SwayctrlError::EventStreamClosed(_)));

        assert!(!config.socket_path().unwrap().exists());
        assert!(InstanceLock::acquire(&config.lock_path().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_second_instance_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let _held = InstanceLock::acquire(&config.lock_path().unwrap()).unwrap();

        let err = run(&config, Arc::new(DryRunCompositor::demo()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, SwayctrlError::AlreadyRunning(_)));
        assert!(!config.socket_path().unwrap().exists());
    }
}
