//! # Brain Graph Model
//!
//! Plain data types shared by every layer: the matrix store, the thresholding
//! engines, the storage backend and the property overlay.
//!
//! Design rule: no I/O, no state, no policy here. Thresholding decides which
//! edges exist; this module only describes what a node or an edge is.

pub mod node;
pub mod edge;
pub mod value;
pub mod property_map;

pub use node::{Node, NodeId};
pub use edge::{Edge, EdgeKey};
pub use value::Value;
pub use property_map::PropertyMap;
