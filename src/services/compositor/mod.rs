//! Compositor service: responsibility and boundaries
//!
//! This module talks to sway (tree snapshots, commands, window event
//! subscription) and nothing else. Selection logic lives in `crate::tree`,
//! focus history lives in the daemon services.

mod dry_run;
mod swaymsg;
mod r#trait;

pub use self::dry_run::DryRunCompositor;
pub use self::r#trait::{create_compositor, focus_command, Compositor, WindowEventStream};
pub use self::swaymsg::discover_socket;
