use pbs_api::{Icon, TagId};

/// A node of the tag tree.
///
/// Tags are owned by the [`Store`](crate::store::Store) arena; `parent` and
/// `children` hold ids, never references. Fields are only writable from inside this
/// crate, by the atomic operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub(crate) id: TagId,
    pub(crate) name: String,
    pub(crate) icon: Option<Icon>,
    pub(crate) parent: Option<TagId>,
    pub(crate) children: Vec<TagId>,
}

impl Tag {
    pub(crate) fn new(id: TagId, name: String, icon: Option<Icon>, parent: Option<TagId>) -> Self {
        Self {
            id,
            name,
            icon,
            parent,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> Option<&Icon> {
        self.icon.as_ref()
    }

    pub fn parent(&self) -> Option<TagId> {
        self.parent
    }

    /// Child tags in display order
    pub fn children(&self) -> &[TagId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Position of `child` among this tag's children.
    pub fn child_index(&self, child: TagId) -> Option<usize> {
        self.children.iter().position(|c| *c == child)
    }
}
