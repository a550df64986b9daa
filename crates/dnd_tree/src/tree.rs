use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BuildError, IntegrityError, MoveError};
use crate::position::DropPosition;

/// Anything usable as a node identifier.
pub trait NodeKey: Clone + Eq + Hash + fmt::Debug {}

impl<T> NodeKey for T where T: Clone + Eq + Hash + fmt::Debug {}

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Process-unique stamp of one forest value.
///
/// Cloning a [`Forest`] keeps its revision; building one or producing one from a
/// move allocates a new revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Revision(u64);

impl Revision {
    fn next() -> Self {
        Self(NEXT_REVISION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A tree node with an id, the id of its parent and ordered children.
///
/// Children are reference counted so that forests produced by a move share every
/// subtree the move did not touch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "K: Deserialize<'de>, D: Deserialize<'de>"))]
pub struct Node<K, D = ()> {
    pub(crate) id: K,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) pid: Option<K>,
    #[serde(flatten)]
    pub(crate) data: D,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) children: Vec<Arc<Node<K, D>>>,
}

impl<K, D> Node<K, D> {
    pub fn new(id: K, data: D) -> Self {
        Self {
            id,
            pid: None,
            data,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Node<K, D>) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node<K, D>>) -> Self {
        self.children.extend(children.into_iter().map(Arc::new));
        self
    }

    #[inline]
    pub fn id(&self) -> &K {
        &self.id
    }

    /// The parent id, `None` for roots.
    #[inline]
    pub fn pid(&self) -> Option<&K> {
        self.pid.as_ref()
    }

    #[inline]
    pub fn data(&self) -> &D {
        &self.data
    }

    #[inline]
    pub fn children(&self) -> &[Arc<Node<K, D>>] {
        &self.children
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl<K, D: Default> Node<K, D> {
    /// A node with a default payload.
    pub fn leaf(id: K) -> Self {
        Self::new(id, D::default())
    }
}

/// One `id`/`pid` record of a flat list, see [`Forest::from_flat`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "K: Deserialize<'de>, D: Deserialize<'de>"))]
pub struct FlatRecord<K, D = ()> {
    pub id: K,
    #[serde(default)]
    pub pid: Option<K>,
    #[serde(flatten)]
    pub data: D,
}

impl<K, D> FlatRecord<K, D> {
    pub fn new(id: K, pid: Option<K>, data: D) -> Self {
        Self { id, pid, data }
    }
}

/// Where a node sits: its parent (`None` for the root sequence) and its index there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location<K> {
    pub parent_id: Option<K>,
    pub index: usize,
}

/// A flat representation of a node with its depth, in display order.
#[derive(Clone, Debug)]
pub struct TreeEntry<K, D = ()> {
    node: Arc<Node<K, D>>,
    depth: usize,
}

impl<K, D> TreeEntry<K, D> {
    #[inline]
    pub fn node(&self) -> &Node<K, D> {
        &self.node
    }

    #[inline]
    pub fn id(&self) -> &K {
        &self.node.id
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn parent_id(&self) -> Option<&K> {
        self.node.pid.as_ref()
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.node.has_children()
    }
}

/// An ordered sequence of root nodes.
///
/// A `Forest` is immutable: moves return a new value and leave the original
/// untouched. Every constructor checks the structural invariants, so a live
/// `Forest` always has unique ids and consistent parent ids.
#[derive(Clone)]
pub struct Forest<K, D = ()> {
    roots: Vec<Arc<Node<K, D>>>,
    revision: Revision,
}

impl<K: fmt::Debug, D: fmt::Debug> fmt::Debug for Forest<K, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forest")
            .field("revision", &self.revision)
            .field("roots", &self.roots)
            .finish()
    }
}

impl<K: PartialEq, D: PartialEq> PartialEq for Forest<K, D> {
    fn eq(&self, other: &Self) -> bool {
        self.roots == other.roots
    }
}

impl<K, D> Forest<K, D> {
    pub fn empty() -> Self {
        Self {
            roots: Vec::new(),
            revision: Revision::next(),
        }
    }

    pub(crate) fn from_roots(roots: Vec<Arc<Node<K, D>>>) -> Self {
        Self {
            roots,
            revision: Revision::next(),
        }
    }

    #[inline]
    pub fn roots(&self) -> &[Arc<Node<K, D>>] {
        &self.roots
    }

    #[inline]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        fn count<K, D>(items: &[Arc<Node<K, D>>]) -> usize {
            items
                .iter()
                .map(|node| 1 + count(&node.children))
                .sum()
        }
        count(&self.roots)
    }

    /// Flatten the forest depth-first, parents before their children.
    pub fn entries(&self) -> Vec<TreeEntry<K, D>> {
        fn add_entries<K, D>(
            items: &[Arc<Node<K, D>>],
            depth: usize,
            out: &mut Vec<TreeEntry<K, D>>,
        ) {
            for node in items {
                out.push(TreeEntry {
                    node: Arc::clone(node),
                    depth,
                });
                add_entries(&node.children, depth + 1, out);
            }
        }

        let mut entries = Vec::new();
        add_entries(&self.roots, 0, &mut entries);
        entries
    }

    /// Indented outline, one node per line, labelled by `label`.
    pub fn outline_with(&self, label: impl Fn(&Node<K, D>) -> String) -> String {
        let mut out = String::new();
        for entry in self.entries() {
            out.push_str(&"  ".repeat(entry.depth));
            out.push_str(&label(&entry.node));
            out.push('\n');
        }
        out
    }
}

impl<K: NodeKey, D: Clone> Forest<K, D> {
    /// Build a forest from nested nodes. Parent ids are taken from the structure.
    pub fn new(roots: impl IntoIterator<Item = Node<K, D>>) -> Result<Self, IntegrityError<K>> {
        let roots = roots
            .into_iter()
            .map(|mut node| {
                stamp_parent(&mut node, None);
                Arc::new(node)
            })
            .collect();
        let forest = Self::from_roots(roots);
        forest.validate()?;
        Ok(forest)
    }

    /// Build a forest from a flat `id`/`pid` list.
    ///
    /// Records whose `pid` is missing or names an id that is not in the list become
    /// roots. Siblings keep the order they have in `records`.
    pub fn from_flat(
        records: impl IntoIterator<Item = FlatRecord<K, D>>,
    ) -> Result<Self, BuildError<K>> {
        let records: Vec<FlatRecord<K, D>> = records.into_iter().collect();

        let mut index = HashMap::with_capacity(records.len());
        for (ix, record) in records.iter().enumerate() {
            if index.insert(record.id.clone(), ix).is_some() {
                return Err(BuildError::DuplicateId(record.id.clone()));
            }
        }

        let mut children = vec![Vec::new(); records.len()];
        let mut root_ixs = Vec::new();
        for (ix, record) in records.iter().enumerate() {
            match record.pid.as_ref().and_then(|pid| index.get(pid)) {
                Some(&parent_ix) if parent_ix == ix => {
                    return Err(BuildError::Cycle(record.id.clone()));
                }
                Some(&parent_ix) => children[parent_ix].push(ix),
                None => root_ixs.push(ix),
            }
        }

        let mut slots: Vec<Option<FlatRecord<K, D>>> = records.into_iter().map(Some).collect();
        let roots = root_ixs
            .into_iter()
            .filter_map(|ix| build_from_slots(ix, None, &mut slots, &children))
            .map(Arc::new)
            .collect();

        // Anything left over never reached a root, so its parent chain loops.
        if let Some(record) = slots.into_iter().flatten().next() {
            return Err(BuildError::Cycle(record.id));
        }

        Ok(Self::from_roots(roots))
    }

    pub fn contains(&self, id: &K) -> bool {
        self.find(id).is_some()
    }

    pub fn find(&self, id: &K) -> Option<&Node<K, D>> {
        self.locate(id).ok().flatten().map(|(node, _)| node)
    }

    /// The parent id and sibling index of `id`.
    pub fn location(&self, id: &K) -> Option<Location<K>> {
        let (node, path) = self.locate(id).ok().flatten()?;
        let index = *path.last()?;
        Some(Location {
            parent_id: node.pid.clone(),
            index,
        })
    }

    /// Check that ids are unique and that every node's `pid` names the node it
    /// sits under.
    pub fn validate(&self) -> Result<(), IntegrityError<K>> {
        fn check<'a, K: NodeKey, D>(
            items: &'a [Arc<Node<K, D>>],
            parent: Option<&'a K>,
            seen: &mut HashSet<&'a K>,
        ) -> Result<(), IntegrityError<K>> {
            for node in items {
                if !seen.insert(&node.id) {
                    return Err(IntegrityError::DuplicateId(node.id.clone()));
                }
                if node.pid.as_ref() != parent {
                    return Err(IntegrityError::ParentMismatch {
                        id: node.id.clone(),
                        recorded: node.pid.clone(),
                        actual: parent.cloned(),
                    });
                }
                check(&node.children, Some(&node.id), seen)?;
            }
            Ok(())
        }

        check(&self.roots, None, &mut HashSet::new())
    }

    /// See [`move_node`](crate::move_node).
    pub fn move_node(
        &self,
        dragged_id: &K,
        target_id: &K,
        position: DropPosition,
    ) -> Result<Self, MoveError<K>> {
        crate::mutate::move_node(self, dragged_id, target_id, position)
    }

    /// Depth-first lookup returning the node and its index path from the roots.
    pub(crate) fn locate(
        &self,
        id: &K,
    ) -> Result<Option<(&Node<K, D>, Vec<usize>)>, IntegrityError<K>> {
        let mut path = Vec::new();
        let found = locate_in(&self.roots, id, &mut path, &mut HashSet::new())?;
        Ok(found.map(|node| (node, path)))
    }
}

impl<K, D> Forest<K, D>
where
    K: NodeKey + Serialize,
    D: Clone + Serialize,
{
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<K, D> Forest<K, D>
where
    K: NodeKey + DeserializeOwned,
    D: Clone + DeserializeOwned,
{
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl<K: Serialize, D: Serialize> Serialize for Forest<K, D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.roots.serialize(serializer)
    }
}

impl<'de, K, D> Deserialize<'de> for Forest<K, D>
where
    K: NodeKey + Deserialize<'de>,
    D: Clone + Deserialize<'de>,
{
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let roots = Vec::<Node<K, D>>::deserialize(deserializer)?;
        Forest::new(roots).map_err(De::Error::custom)
    }
}

fn stamp_parent<K: Clone, D: Clone>(node: &mut Node<K, D>, pid: Option<K>) {
    node.pid = pid;
    let id = node.id.clone();
    for child in node.children.iter_mut() {
        stamp_parent(Arc::make_mut(child), Some(id.clone()));
    }
}

fn build_from_slots<K: Clone, D>(
    ix: usize,
    pid: Option<&K>,
    slots: &mut [Option<FlatRecord<K, D>>],
    children: &[Vec<usize>],
) -> Option<Node<K, D>> {
    let record = slots[ix].take()?;
    let mut node = Node {
        id: record.id,
        pid: pid.cloned(),
        data: record.data,
        children: Vec::with_capacity(children[ix].len()),
    };
    for &child_ix in &children[ix] {
        if let Some(child) = build_from_slots(child_ix, Some(&node.id), slots, children) {
            node.children.push(Arc::new(child));
        }
    }
    Some(node)
}

pub(crate) fn locate_in<'a, K: NodeKey, D>(
    items: &'a [Arc<Node<K, D>>],
    id: &K,
    path: &mut Vec<usize>,
    seen: &mut HashSet<&'a K>,
) -> Result<Option<&'a Node<K, D>>, IntegrityError<K>> {
    for (index, node) in items.iter().enumerate() {
        if !seen.insert(&node.id) {
            return Err(IntegrityError::DuplicateId(node.id.clone()));
        }
        path.push(index);
        if node.id == *id {
            return Ok(Some(node));
        }
        if let Some(found) = locate_in(&node.children, id, path, seen)? {
            return Ok(Some(found));
        }
        path.pop();
    }
    Ok(None)
}
