use std::ops::{Index, IndexMut};

use serde_json::{Map, Value};

use crate::data::{ModelError, NodeId, item::MenuItem};

/// Arena owning every [`MenuItem`] of a menu.
///
/// Nodes are addressed by [`NodeId`]; ownership flows root to children and
/// the parent link is a plain index. Freed slots are never reused, so a
/// stale id resolves to `None` instead of a different node.
#[derive(Debug, Clone, Default)]
pub struct MenuTree {
    nodes: Vec<Option<MenuItem>>,
    pub(crate) root: Option<NodeId>,
}

impl MenuTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: NodeId) -> Option<&MenuItem> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut MenuItem> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    fn check(&self, id: NodeId) -> Result<(), ModelError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(ModelError::NoSuchNode(id))
        }
    }

    /// Store a detached item and return its handle.
    pub fn insert(&mut self, mut item: MenuItem) -> NodeId {
        item.parent = None;
        item.children.clear();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(item));
        id
    }

    /// Make a detached node the root, detaching any previous root.
    pub fn set_root(&mut self, id: NodeId) -> Result<(), ModelError> {
        self.check(id)?;
        self.detach(id)?;
        self.root = Some(id);
        Ok(())
    }

    /// Add an item to the tree.
    ///
    /// Without a parent the item becomes the root, or a child of the root
    /// when one already exists. A non-Normal target cannot own children, so
    /// the item is appended to the target's parent instead.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NoSuchNode`] if `parent` does not exist.
    pub fn add_item(
        &mut self,
        parent: Option<NodeId>,
        item: MenuItem,
    ) -> Result<NodeId, ModelError> {
        let target = match parent {
            Some(p) => {
                self.check(p)?;
                let p_item = &self[p];
                match p_item.parent {
                    Some(grand) if !p_item.kind.is_normal() => Some(grand),
                    _ => Some(p),
                }
            }
            None => self.root,
        };

        let id = self.insert(item);
        match target {
            Some(p) => {
                let at = self[p].children.len();
                self.attach(id, p, at);
            }
            None => self.root = Some(id),
        }
        Ok(id)
    }

    fn attach(&mut self, id: NodeId, parent: NodeId, index: usize) {
        let children = &mut self[parent].children;
        let index = index.min(children.len());
        children.insert(index, id);
        self[id].parent = Some(parent);
    }

    /// Unlink a node from its parent (or from the root slot).
    ///
    /// The subtree stays in the arena and can be re-attached.
    pub fn detach(&mut self, id: NodeId) -> Result<(), ModelError> {
        self.check(id)?;
        if let Some(parent) = self[id].parent.take() {
            self[parent].children.retain(|c| *c != id);
        } else if self.root == Some(id) {
            self.root = None;
        }
        Ok(())
    }

    /// Detach a node and free it together with all of its descendants.
    pub fn drop_subtree(&mut self, id: NodeId) -> Result<usize, ModelError> {
        self.detach(id)?;
        let doomed = self.postorder(id);
        for n in &doomed {
            self.nodes[n.0] = None;
        }
        Ok(doomed.len())
    }

    /// Index of `id` among its siblings.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.get(id)?.parent?;
        self[parent].children.iter().position(|c| *c == id)
    }

    /// Swap with the previous sibling. Returns whether anything moved.
    pub fn move_up(&mut self, id: NodeId) -> Result<bool, ModelError> {
        self.check(id)?;
        let (Some(parent), Some(idx)) = (self[id].parent, self.position(id)) else {
            return Ok(false);
        };
        if idx == 0 {
            return Ok(false);
        }
        self[parent].children.swap(idx, idx - 1);
        Ok(true)
    }

    /// Swap with the next sibling. Returns whether anything moved.
    pub fn move_down(&mut self, id: NodeId) -> Result<bool, ModelError> {
        self.check(id)?;
        let (Some(parent), Some(idx)) = (self[id].parent, self.position(id)) else {
            return Ok(false);
        };
        if idx + 1 >= self[parent].children.len() {
            return Ok(false);
        }
        self[parent].children.swap(idx, idx + 1);
        Ok(true)
    }

    /// Whether `ancestor` lies on the path from the root to `id` (inclusive).
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.get(n).and_then(|i| i.parent);
        }
        false
    }

    /// Re-parent a node at `index`, then repair the structure.
    ///
    /// This is the drag-and-drop path: dropping onto a non-Normal node is
    /// accepted and its new children are moved up by [`Self::repair_structure`].
    ///
    /// # Errors
    ///
    /// Fails on unknown ids or when `new_parent` lies inside the moved subtree.
    pub fn move_item(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        index: usize,
    ) -> Result<usize, ModelError> {
        self.check(id)?;
        self.check(new_parent)?;
        if self.is_ancestor(id, new_parent) {
            return Err(ModelError::WouldCycle {
                node: id,
                parent: new_parent,
            });
        }
        self.detach(id)?;
        self.attach(id, new_parent, index);
        Ok(self.repair_structure())
    }

    /// Move children found under non-Normal nodes to the sibling level,
    /// right after their former parent and in their original order.
    ///
    /// The root has no sibling level and is left as is. Returns the number
    /// of nodes relocated.
    pub fn repair_structure(&mut self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut moved = 0;
        loop {
            let mut changed = false;
            for id in self.preorder(root) {
                let item = &self[id];
                let Some(parent) = item.parent else {
                    continue;
                };
                if item.kind.is_normal() || item.children.is_empty() {
                    continue;
                }
                let orphans = std::mem::take(&mut self[id].children);
                let at = self.position(id).map_or(0, |p| p + 1);
                warn!(
                    "`{}` is {} and cannot own children, moving {} up",
                    self[id].name,
                    self[id].tag(),
                    orphans.len()
                );
                for (offset, child) in orphans.iter().enumerate() {
                    self[child].parent = None;
                    self.attach(*child, parent, at + offset);
                }
                moved += orphans.len();
                changed = true;
            }
            if !changed {
                break;
            }
        }
        moved
    }

    /// Deep copy of a subtree with fresh ids; the copy is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId, ModelError> {
        self.check(id)?;
        let mut copy = self[id].clone();
        copy.id = crate::data::item::new_id();
        let children = copy.children.clone();
        let new_id = self.insert(copy);
        for child in children {
            let c = self.clone_subtree(child)?;
            let at = self[new_id].children.len();
            self.attach(c, new_id, at);
        }
        Ok(new_id)
    }

    /// Names from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut cur = Some(id);
        while let Some(n) = cur {
            let Some(item) = self.get(n) else {
                break;
            };
            names.push(item.name.as_str());
            cur = item.parent;
        }
        names.reverse();
        names
    }

    /// Children before their parent, left to right.
    pub fn postorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk_post(start, &mut out);
        out
    }

    fn walk_post(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(item) = self.get(id) else {
            return;
        };
        for child in &item.children {
            self.walk_post(*child, out);
        }
        out.push(id);
    }

    /// Parent before its children, left to right.
    pub fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(item) = self.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(item.children.iter().rev());
        }
        out
    }

    /// Serialize a subtree in the persisted item layout.
    pub fn item_as_json(&self, id: NodeId) -> Value {
        let Some(item) = self.get(id) else {
            return Value::Null;
        };
        let mut obj = item.fields_as_json();
        if !item.children.is_empty() {
            let children = item
                .children
                .iter()
                .map(|c| self.item_as_json(*c))
                .collect();
            obj.insert("children".into(), Value::Array(children));
        }
        Value::Object(obj)
    }

    /// Load a subtree from its JSON form; the result is detached.
    ///
    /// `path` names the location in the document for error messages.
    pub fn item_from_json(&mut self, value: &Value, path: &str) -> Result<NodeId, ModelError> {
        let item = MenuItem::from_json_fields(value, path)?;
        let id = self.insert(item);

        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);
        match obj.get("children") {
            None | Some(Value::Null) => {}
            Some(Value::Array(children)) => {
                for (i, child) in children.iter().enumerate() {
                    let c = self.item_from_json(child, &format!("{path}.children[{i}]"))?;
                    let at = self[id].children.len();
                    self.attach(c, id, at);
                }
            }
            Some(other) => {
                return Err(ModelError::TypeMismatch {
                    path: format!("{path}.children"),
                    expected: "array".into(),
                    actual: format!("{other}"),
                });
            }
        }
        Ok(id)
    }
}

impl Index<NodeId> for MenuTree {
    type Output = MenuItem;

    fn index(&self, id: NodeId) -> &Self::Output {
        match self.get(id) {
            Some(item) => item,
            None => panic!("menu node {id} does not exist"),
        }
    }
}

impl IndexMut<NodeId> for MenuTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        match self.get_mut(id) {
            Some(item) => item,
            None => panic!("menu node {id} does not exist"),
        }
    }
}

impl Index<&NodeId> for MenuTree {
    type Output = MenuItem;

    fn index(&self, id: &NodeId) -> &Self::Output {
        &self[*id]
    }
}

impl IndexMut<&NodeId> for MenuTree {
    fn index_mut(&mut self, id: &NodeId) -> &mut Self::Output {
        &mut self[*id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ItemKindTag;

    fn item(name: &str, tag: ItemKindTag) -> MenuItem {
        MenuItem::new(name, tag)
    }

    fn names(tree: &MenuTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|i| tree[i].name.clone()).collect()
    }

    #[test]
    fn test_add_item_without_parent() {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, item("Main", ItemKindTag::Normal)).unwrap();
        assert_eq!(tree.root(), Some(root));

        let a = tree.add_item(None, item("A", ItemKindTag::Toggle)).unwrap();
        assert_eq!(tree[a].parent(), Some(root));
    }

    #[test]
    fn test_add_item_redirects_from_leaf_kind() {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, item("Main", ItemKindTag::Normal)).unwrap();
        let led = tree.add_item(Some(root), item("Led", ItemKindTag::Toggle)).unwrap();
        let fan = tree.add_item(Some(led), item("Fan", ItemKindTag::Toggle)).unwrap();
        assert_eq!(tree[fan].parent(), Some(root));
        assert!(tree[led].children().is_empty());
    }

    #[test]
    fn test_detach_and_drop() {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, item("Main", ItemKindTag::Normal)).unwrap();
        let sub = tree.add_item(Some(root), item("Sub", ItemKindTag::Normal)).unwrap();
        let leaf = tree.add_item(Some(sub), item("Leaf", ItemKindTag::Application)).unwrap();

        tree.detach(sub).unwrap();
        assert!(tree[root].children().is_empty());
        assert_eq!(tree[leaf].parent(), Some(sub));

        assert_eq!(tree.drop_subtree(sub).unwrap(), 2);
        assert!(!tree.contains(leaf));
        assert_eq!(tree.len(), 1);
        assert!(matches!(tree.detach(leaf), Err(ModelError::NoSuchNode(_))));
    }

    #[test]
    fn test_move_up_down() {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, item("Main", ItemKindTag::Normal)).unwrap();
        let a = tree.add_item(Some(root), item("A", ItemKindTag::Normal)).unwrap();
        let b = tree.add_item(Some(root), item("B", ItemKindTag::Normal)).unwrap();

        assert!(!tree.move_up(a).unwrap());
        assert!(tree.move_up(b).unwrap());
        assert_eq!(names(&tree, tree[root].children()), ["B", "A"]);
        assert!(!tree.move_down(a).unwrap());
        assert!(tree.move_down(b).unwrap());
        assert_eq!(names(&tree, tree[root].children()), ["A", "B"]);
        assert!(!tree.move_up(root).unwrap());
    }

    #[test]
    fn test_move_item_repairs_leaf_parent() {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, item("Main", ItemKindTag::Normal)).unwrap();
        let led = tree.add_item(Some(root), item("Led", ItemKindTag::Toggle)).unwrap();
        let tail = tree.add_item(Some(root), item("Tail", ItemKindTag::Normal)).unwrap();
        let x = tree.add_item(Some(tail), item("X", ItemKindTag::Normal)).unwrap();
        let y = tree.add_item(Some(tail), item("Y", ItemKindTag::Normal)).unwrap();

        tree.move_item(x, led, 0).unwrap();
        tree.move_item(y, led, 1).unwrap();
        assert_eq!(names(&tree, tree[root].children()), ["Led", "Y", "X", "Tail"]);
        assert!(tree[led].children().is_empty());
        assert_eq!(tree[y].parent(), Some(root));
    }

    #[test]
    fn test_move_item_rejects_cycle() {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, item("Main", ItemKindTag::Normal)).unwrap();
        let sub = tree.add_item(Some(root), item("Sub", ItemKindTag::Normal)).unwrap();
        let inner = tree.add_item(Some(sub), item("Inner", ItemKindTag::Normal)).unwrap();
        let err = tree.move_item(sub, inner, 0).unwrap_err();
        assert!(matches!(err, ModelError::WouldCycle { .. }));
        assert_eq!(tree[sub].parent(), Some(root));
    }

    #[test]
    fn test_repair_nested_leaf_chains() {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, item("Main", ItemKindTag::Normal)).unwrap();
        let a = tree.insert(item("A", ItemKindTag::Toggle));
        let b = tree.insert(item("B", ItemKindTag::Exhibition));
        let c = tree.insert(item("C", ItemKindTag::Normal));
        tree.attach(a, root, 0);
        tree.attach(b, a, 0);
        tree.attach(c, b, 0);

        assert_eq!(tree.repair_structure(), 2);
        assert_eq!(names(&tree, tree[root].children()), ["A", "B", "C"]);
        assert_eq!(tree.repair_structure(), 0);
    }

    #[test]
    fn test_orders_and_path() {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, item("Main", ItemKindTag::Normal)).unwrap();
        let s = tree.add_item(Some(root), item("Settings", ItemKindTag::Normal)).unwrap();
        let v = tree.add_item(Some(s), item("Volume", ItemKindTag::Changeable)).unwrap();
        tree.add_item(Some(root), item("About", ItemKindTag::Exhibition)).unwrap();

        assert_eq!(
            names(&tree, &tree.postorder(root)),
            ["Volume", "Settings", "About", "Main"]
        );
        assert_eq!(
            names(&tree, &tree.preorder(root)),
            ["Main", "Settings", "Volume", "About"]
        );
        assert_eq!(tree.path(v), ["Main", "Settings", "Volume"]);
    }

    #[test]
    fn test_clone_subtree_fresh_ids() {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, item("Main", ItemKindTag::Normal)).unwrap();
        let s = tree.add_item(Some(root), item("Settings", ItemKindTag::Normal)).unwrap();
        let v = tree.add_item(Some(s), item("Volume", ItemKindTag::Changeable)).unwrap();

        let copy = tree.clone_subtree(s).unwrap();
        assert_eq!(tree[copy].parent(), None);
        assert_ne!(tree[copy].id, tree[s].id);
        let cv = tree[copy].children()[0];
        assert_eq!(tree[cv].kind, tree[v].kind);
        assert_ne!(tree[cv].id, tree[v].id);
        assert_eq!(tree[cv].parent(), Some(copy));
    }

    #[test]
    fn test_json_subtree() {
        let mut tree = MenuTree::new();
        let root = tree.add_item(None, item("Main", ItemKindTag::Normal)).unwrap();
        tree.add_item(Some(root), item("Led", ItemKindTag::Toggle)).unwrap();
        let json = tree.item_as_json(root);

        let mut other = MenuTree::new();
        let loaded = other.item_from_json(&json, "root_item").unwrap();
        assert_eq!(other.item_as_json(loaded), json);
        assert!(other[loaded].parent().is_none());
    }
}
