//! PropertyMap: the named attribute bag carried by nodes and edges.

use super::Value;

/// A map of property names to values.
pub type PropertyMap = hashbrown::HashMap<String, Value>;
