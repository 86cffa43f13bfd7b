pub mod compositor;
pub mod daemon_client;
pub mod event_listener;
pub mod mru;
pub mod protocol;
pub mod query_server;
pub mod reconciler;

pub use compositor::create_compositor;
