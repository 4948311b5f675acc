//! # Case Bundle Tree
//!
//! The ordered document tree of a case bundle: files and folders, with
//! copy-on-write transforms.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use casebundle_tree::{transforms, Node, Tree};
//!
//! let tree = Arc::new(Tree::from_root(payload)?);
//! let next = transforms::remove_node(&tree, "doc-7");
//! if !Arc::ptr_eq(&tree, &next) {
//!     // publish
//! }
//! ```

pub mod error;
pub mod node;
pub mod result;
pub mod transforms;
pub mod tree;
pub mod visitor;

pub use error::*;
pub use node::*;
pub use result::*;
pub use tree::*;
pub use visitor::*;
