//! Element tree the coordinator hit-tests against
//!
//! The coordinator never looks at widgets directly. It asks a [`Surface`]
//! which element is under the pointer and walks that element's ancestry to
//! find zone and area markers. [`ElementTree`] is a rectangle-based surface
//! usable by hosts that lay out their own rows, by the CLI, and by tests.

use std::collections::BTreeMap;

use super::types::{ElementId, Point, Rect};

/// Hit-testing and ancestry queries
pub trait Surface: Send {
    /// Topmost element under `point`
    fn element_at(&self, point: Point) -> Option<ElementId>;

    /// Containment parent of `element`
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// Bounds of `element`
    fn bounds(&self, element: ElementId) -> Option<Rect>;

    /// Returns true if `element` exists
    fn has_element(&self, element: ElementId) -> bool {
        self.bounds(element).is_some()
    }

    /// Removes a transient element (drag previews)
    fn detach(&mut self, element: ElementId);

    /// Returns true if `element` is `ancestor` or one of its descendants
    fn is_within(&self, ancestor: ElementId, element: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(el) = current {
            if el == ancestor {
                return true;
            }
            current = self.parent(el);
        }
        false
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<ElementId>,
    bounds: Rect,
    children: Vec<ElementId>,
}

/// Rectangle-based element tree
///
/// Later siblings paint over earlier ones, and children over their parent.
/// Hit-testing only descends into elements whose bounds contain the point.
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    nodes: BTreeMap<ElementId, Node>,
    roots: Vec<ElementId>,
    next_id: u64,
}

impl ElementTree {
    /// Creates an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element and returns its id
    ///
    /// An unknown `parent` makes the element a root.
    pub fn insert(&mut self, parent: Option<ElementId>, bounds: Rect) -> ElementId {
        self.next_id += 1;
        let id = ElementId(self.next_id);
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        match parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.nodes.insert(
            id,
            Node {
                parent,
                bounds,
                children: Vec::new(),
            },
        );
        id
    }

    /// Removes an element and its whole subtree
    pub fn remove(&mut self, element: ElementId) {
        let Some(node) = self.nodes.remove(&element) else {
            return;
        };
        match node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent) => parent.children.retain(|c| *c != element),
            None => self.roots.retain(|r| *r != element),
        }
        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                stack.extend(removed.children);
            }
        }
    }

    /// Moves/resizes an element
    pub fn set_bounds(&mut self, element: ElementId, bounds: Rect) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.bounds = bounds;
        }
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn hit(&self, candidates: &[ElementId], point: Point) -> Option<ElementId> {
        for id in candidates.iter().rev() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if node.bounds.contains(point) {
                return Some(self.hit(&node.children, point).unwrap_or(*id));
            }
        }
        None
    }
}

impl Surface for ElementTree {
    fn element_at(&self, point: Point) -> Option<ElementId> {
        self.hit(&self.roots, point)
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(&element).and_then(|n| n.parent)
    }

    fn bounds(&self, element: ElementId) -> Option<Rect> {
        self.nodes.get(&element).map(|n| n.bounds)
    }

    fn detach(&mut self, element: ElementId) {
        self.remove(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> (ElementTree, ElementId, ElementId, ElementId) {
        let mut tree = ElementTree::new();
        let root = tree.insert(None, Rect::new(0.0, 0.0, 100.0, 100.0));
        let outer = tree.insert(Some(root), Rect::new(10.0, 10.0, 80.0, 80.0));
        let inner = tree.insert(Some(outer), Rect::new(20.0, 20.0, 20.0, 20.0));
        (tree, root, outer, inner)
    }

    #[test]
    fn test_hit_test_returns_deepest() {
        let (tree, root, outer, inner) = nested();
        assert_eq!(tree.element_at(Point::new(25.0, 25.0)), Some(inner));
        assert_eq!(tree.element_at(Point::new(60.0, 60.0)), Some(outer));
        assert_eq!(tree.element_at(Point::new(5.0, 5.0)), Some(root));
        assert_eq!(tree.element_at(Point::new(150.0, 5.0)), None);
    }

    #[test]
    fn test_later_siblings_are_on_top() {
        let mut tree = ElementTree::new();
        let first = tree.insert(None, Rect::new(0.0, 0.0, 50.0, 50.0));
        let second = tree.insert(None, Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_ne!(first, second);
        assert_eq!(tree.element_at(Point::new(1.0, 1.0)), Some(second));
    }

    #[test]
    fn test_ancestry() {
        let (tree, root, outer, inner) = nested();
        assert!(tree.is_within(outer, inner));
        assert!(tree.is_within(root, inner));
        assert!(tree.is_within(inner, inner));
        assert!(!tree.is_within(inner, outer));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let (mut tree, root, outer, inner) = nested();
        tree.remove(outer);
        assert_eq!(tree.len(), 1);
        assert!(!tree.has_element(inner));
        assert_eq!(tree.element_at(Point::new(25.0, 25.0)), Some(root));
    }
}
