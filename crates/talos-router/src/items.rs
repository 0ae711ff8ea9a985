//! Captured path items.
//!
//! Wildcard trie levels capture the segment they consumed; the captures are
//! bound positionally to item parameters, so order is everything. Storage
//! uses a small-vector optimization to avoid heap allocation for the common
//! shallow cases.

use smallvec::SmallVec;

/// Captures stored inline before spilling to the heap.
const INLINE_ITEMS: usize = 4;

/// The ordered list of path segments captured by wildcard levels during a
/// route lookup.
///
/// # Example
///
/// ```rust
/// use talos_router::Items;
///
/// let mut items = Items::new();
/// items.push("7");
/// items.push("cover");
/// assert_eq!(items.get(0), Some("7"));
/// assert_eq!(items.get(1), Some("cover"));
/// assert_eq!(items.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Items {
    inner: SmallVec<[String; INLINE_ITEMS]>,
}

impl Items {
    /// Creates an empty capture list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured segment.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.inner.push(segment.into());
    }

    /// Returns the capture at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.inner.get(index).map(String::as_str)
    }

    /// Returns the number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over the captures in capture order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(String::as_str)
    }
}

impl FromIterator<String> for Items {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_order_preserved() {
        let mut items = Items::new();
        items.push("a");
        items.push("b");
        items.push("c");

        let collected: Vec<_> = items.iter().collect();
        assert_eq!(collected, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_items_get_out_of_range() {
        let items = Items::new();
        assert_eq!(items.get(0), None);
        assert!(items.is_empty());
    }

    #[test]
    fn test_items_spill_past_inline() {
        let items: Items = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(items.len(), 10);
        assert_eq!(items.get(9), Some("9"));
    }
}
