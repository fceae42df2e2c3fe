//! R-tree over axis-aligned boxes.
//!
//! Used twice by the [`StrokeStore`](crate::store::StrokeStore): once with
//! degenerate boxes for street points and once with stroke bounding boxes.
//! Query hits are sorted by handle so nearest-item ties always resolve the
//! same way and generation stays reproducible.

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use crate::geometry::Rect;

type Entry<T> = GeomWithData<Rectangle<[f32; 2]>, T>;

fn corners(rect: Rect) -> ([f32; 2], [f32; 2]) {
    (rect.min.to_array(), rect.max.to_array())
}

fn entry<T>(item: T, rect: Rect) -> Entry<T> {
    let (min, max) = corners(rect);
    GeomWithData::new(Rectangle::from_corners(min, max), item)
}

/// Box index keyed by small copyable handles.
#[derive(Debug, Clone)]
pub struct BoxTree<T> {
    bounds: Rect,
    tree: RTree<Entry<T>>,
}

impl<T: Copy + Ord> BoxTree<T> {
    /// Empty tree for items expected inside `bounds`. Items outside are still accepted.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            tree: RTree::new(),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Insert `item` covering `rect`. Duplicates are not detected.
    pub fn insert(&mut self, item: T, rect: Rect) {
        self.tree.insert(entry(item, rect));
    }

    /// Remove `item` previously inserted with `rect`. Returns whether it was found.
    pub fn remove(&mut self, item: T, rect: Rect) -> bool {
        self.tree.remove(&entry(item, rect)).is_some()
    }

    /// Whether `item` is stored under `rect`.
    pub fn contains(&self, item: T, rect: Rect) -> bool {
        self.tree.contains(&entry(item, rect))
    }

    /// All items whose boxes intersect `query`, in ascending handle order.
    pub fn query(&self, query: Rect) -> Vec<T> {
        let (min, max) = corners(query);
        let mut hits: Vec<T> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_corners(min, max))
            .map(|e| e.data)
            .collect();
        hits.sort_unstable();
        hits
    }
}
