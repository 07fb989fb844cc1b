/// Component that names an entity and orders it amongst its siblings.
/// Bones are looked up by `name`, so every node of a rig should have one.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct Info {
    /// A helpful name
    pub name: String,
    /// Position of the node in its source asset. Used to walk children in a stable order.
    pub node_id: usize,
}

impl Info {
    /// Create a new `Info`
    pub fn new(name: &str, node_id: usize) -> Self {
        Self {
            name: name.to_string(),
            node_id,
        }
    }
}
