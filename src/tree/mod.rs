pub mod node;
pub mod selector;

pub use node::{render_tree, Node, NodeType, WindowId};
pub use selector::WindowCriteria;
