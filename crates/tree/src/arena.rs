//! A generational arena holding the nodes of one tree.
//!
//! A [`NodeId`] is a slot index plus the generation the slot had when the node
//! was allocated. Freeing a node bumps its slot's generation, so handles to
//! removed nodes are detected as stale instead of silently aliasing whatever
//! node reuses the slot later.

use crate::error::TreeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A live node: adapter data plus its links.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub data: T,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub attributes: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    entry: Option<Entry<T>>,
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Allocates an unlinked node. Linking it into `parent`'s lists is the
    /// caller's business; see [`Arena::append_child`].
    pub fn alloc(&mut self, data: T, parent: Option<NodeId>) -> NodeId {
        let entry = Entry {
            data,
            parent,
            children: Vec::new(),
            attributes: Vec::new(),
        };
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Entry<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Entry<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    pub fn entry(&self, id: NodeId) -> Result<&Entry<T>, TreeError> {
        self.get(id).ok_or(TreeError::StaleHandle(id))
    }

    pub fn entry_mut(&mut self, id: NodeId) -> Result<&mut Entry<T>, TreeError> {
        self.get_mut(id).ok_or(TreeError::StaleHandle(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Allocates a node as the new last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, data: T) -> Result<NodeId, TreeError> {
        self.entry(parent)?;
        let id = self.alloc(data, Some(parent));
        self.entry_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Allocates a node as the new last attribute of `parent`.
    pub fn append_attribute(&mut self, parent: NodeId, data: T) -> Result<NodeId, TreeError> {
        self.entry(parent)?;
        let id = self.alloc(data, Some(parent));
        self.entry_mut(parent)?.attributes.push(id);
        Ok(id)
    }

    /// Unlinks `id` from its parent and frees its whole subtree.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        let parent = self.entry(id)?.parent.ok_or(TreeError::Root("removed"))?;
        let parent_entry = self.entry_mut(parent)?;
        parent_entry.children.retain(|&child| child != id);
        parent_entry.attributes.retain(|&attr| attr != id);
        self.free_subtree(id);
        Ok(())
    }

    /// Frees every child of `id`, keeping its attributes.
    pub fn clear_children(&mut self, id: NodeId) -> Result<(), TreeError> {
        let children = std::mem::take(&mut self.entry_mut(id)?.children);
        for child in children {
            self.free_subtree(child);
        }
        Ok(())
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index as usize)
                .filter(|slot| slot.generation == id.generation)
            else {
                continue;
            };
            if let Some(entry) = slot.entry.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                self.live -= 1;
                stack.extend(entry.children);
                stack.extend(entry.attributes);
            }
        }
    }
}

impl<T: Clone> Arena<T> {
    /// Deep-copies `id` and links the copy immediately before it in whichever
    /// list (children or attributes) holds it. Returns the copy.
    pub fn copy_before(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        let parent = self.entry(id)?.parent.ok_or(TreeError::Root("copied"))?;
        let copy = self.copy_subtree(id, parent)?;
        let parent_entry = self.entry_mut(parent)?;
        let siblings = if parent_entry.attributes.contains(&id) {
            &mut parent_entry.attributes
        } else {
            &mut parent_entry.children
        };
        let index = siblings
            .iter()
            .position(|&sibling| sibling == id)
            .ok_or_else(|| TreeError::illegal("node is not linked to its parent"))?;
        siblings.insert(index, copy);
        Ok(copy)
    }

    fn copy_subtree(&mut self, id: NodeId, parent: NodeId) -> Result<NodeId, TreeError> {
        let source = self.entry(id)?.clone();
        let copy = self.alloc(source.data, Some(parent));
        for attr in source.attributes {
            let attr_copy = self.copy_subtree(attr, copy)?;
            self.entry_mut(copy)?.attributes.push(attr_copy);
        }
        for child in source.children {
            let child_copy = self.copy_subtree(child, copy)?;
            self.entry_mut(copy)?.children.push(child_copy);
        }
        Ok(copy)
    }
}
