//! Drag-and-drop reordering for hierarchical lists.
//!
//! [`classify_drop_position`] turns pointer geometry into a [`DropPosition`],
//! [`is_descendant`] keeps moves acyclic and [`move_node`] produces the
//! restructured [`Forest`]. [`DragSession`] ties them to one drag gesture.

mod ancestry;
mod error;
mod mutate;
mod position;
mod session;
mod tree;

pub use crate::ancestry::*;
pub use crate::error::*;
pub use crate::mutate::*;
pub use crate::position::*;
pub use crate::session::*;
pub use crate::tree::*;
