//! Bounded, deduplicated tag list attached to an event.

/// Default upper bound on tags per event.
pub const DEFAULT_MAX_TAGS: usize = 4;

/// Ordered set of tags with a fixed capacity.
///
/// Adding past the capacity, or adding a tag already present, leaves the
/// list unchanged. Tags are trimmed and a leading `#` is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagList {
    tags: Vec<String>,
    capacity: usize,
}

impl TagList {
    pub fn new(capacity: usize) -> Self {
        Self {
            tags: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a list by adding each candidate in order; rejected candidates are skipped.
    pub fn collect<I, S>(capacity: usize, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new(capacity);
        for tag in candidates {
            list.add(tag.as_ref());
        }
        list
    }

    /// Returns `true` when the tag was appended.
    pub fn add(&mut self, raw: &str) -> bool {
        let tag = raw.trim().trim_start_matches('#').trim();
        if tag.is_empty() || self.is_full() || self.contains(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_full(&self) -> bool {
        self.tags.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tags
    }
}

impl Default for TagList {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TAGS)
    }
}
