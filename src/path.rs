//! The scope path key: a tiny, fixed-size, lossy tag sequence optimized for
//! use as a map key. Copying a path is a trivial shallow copy and comparing
//! one never touches the tag strings themselves.

use std::cmp::Ordering;
use std::fmt;

/// Maximum number of tags a [`ScopePath`] actually stores. Deeper nesting is
/// still counted, but the tags beyond this depth are dropped.
pub const MAX_DEPTH: usize = 15;

/// A scope marker. Wraps a `&'static str` but compares by *identity*
/// (pointer and length), not by content, so pushing and comparing tags stays
/// a couple of integer compares.
///
/// The usefulness of this depends on the compiler putting identical string
/// literals under the same pointer, which tends to happen in practice but is
/// not guaranteed. Two distinct allocations of the same text count as two
/// different tags; interning is the caller's responsibility.
#[derive(Clone, Copy)]
pub struct Tag(&'static str);

impl Tag {
    pub fn new(name: &'static str) -> Self {
        Tag(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    fn key(&self) -> (usize, usize) {
        (self.0.as_ptr() as usize, self.0.len())
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Tag {}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:?})", self.0)
    }
}

impl From<&'static str> for Tag {
    fn from(name: &'static str) -> Self {
        Tag::new(name)
    }
}

/// An ordered sequence of nested scope tags, with a fixed storage capacity of
/// [`MAX_DEPTH`] and a *logical* size that keeps counting past it.
///
/// `stored` is the number of tags actually held (`<= MAX_DEPTH`); `logical`
/// is the true pushed depth. Invariant: `stored == min(logical, MAX_DEPTH)`.
/// Pushing past capacity silently drops the tag while the logical size keeps
/// growing; popping back below capacity restores normal operation.
///
/// Equality and ordering look at the logical size and the stored prefix only:
/// two paths that overflowed differently but share their first `MAX_DEPTH`
/// tags and their logical size are indistinguishable as map keys. That is a
/// deliberate precision/cost trade-off, not something to silently correct —
/// the reporter flags truncated paths instead.
#[derive(Clone, Copy)]
pub struct ScopePath {
    tags: [Tag; MAX_DEPTH],
    stored: u16,
    logical: u16,
}

impl ScopePath {
    pub fn new() -> Self {
        ScopePath {
            tags: [Tag(""); MAX_DEPTH],
            stored: 0,
            logical: 0,
        }
    }

    /// True pushed depth, including dropped tags.
    pub fn len(&self) -> usize {
        self.logical as usize
    }

    pub fn is_empty(&self) -> bool {
        self.logical == 0
    }

    /// Number of tags actually stored.
    pub fn depth(&self) -> usize {
        self.stored as usize
    }

    /// How many tags were dropped to overflow.
    pub fn truncated(&self) -> usize {
        (self.logical - self.stored) as usize
    }

    /// The stored prefix.
    pub fn tags(&self) -> &[Tag] {
        &self.tags[..self.stored as usize]
    }

    pub fn push(&mut self, tag: Tag) {
        self.logical += 1;
        if (self.stored as usize) < MAX_DEPTH {
            self.tags[self.stored as usize] = tag;
            self.stored += 1;
        }
    }

    pub fn pop(&mut self) {
        debug_assert!(self.logical > 0, "pop() on an empty scope path");
        if self.logical == 0 {
            return;
        }
        self.logical -= 1;
        if (self.logical as usize) < MAX_DEPTH {
            self.stored -= 1;
        }
    }
}

impl Default for ScopePath {
    fn default() -> Self {
        ScopePath::new()
    }
}

impl PartialEq for ScopePath {
    fn eq(&self, other: &Self) -> bool {
        self.logical == other.logical && self.tags() == other.tags()
    }
}

impl Eq for ScopePath {}

impl PartialOrd for ScopePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScopePath {
    fn cmp(&self, other: &Self) -> Ordering {
        // Shorter paths sort first; equal logical sizes imply equal stored
        // counts, so the prefix comparison is over slices of the same length.
        self.logical
            .cmp(&other.logical)
            .then_with(|| self.tags().cmp(other.tags()))
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, tag) in self.tags().iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(tag.as_str())?;
        }
        if self.truncated() > 0 {
            write!(f, "/...({})", self.truncated())?;
        }
        Ok(())
    }
}

impl fmt::Debug for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ScopePath({}, len={})", self, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAGS: [&str; 20] = [
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r",
        "s", "t",
    ];

    fn path_of(tags: &[&'static str]) -> ScopePath {
        let mut path = ScopePath::new();
        for tag in tags {
            path.push(Tag::new(tag));
        }
        path
    }

    #[test]
    fn push_and_pop_track_depth() {
        let mut path = ScopePath::new();
        assert!(path.is_empty());
        path.push(Tag::new("main"));
        path.push(Tag::new("calc"));
        assert_eq!(path.len(), 2);
        assert_eq!(path.depth(), 2);
        path.pop();
        assert_eq!(path.len(), 1);
        assert_eq!(path.tags()[0].as_str(), "main");
    }

    #[test]
    fn overflow_is_lossy_but_counted() {
        let mut path = ScopePath::new();
        for tag in TAGS.iter() {
            path.push(Tag::new(tag));
        }
        assert_eq!(path.len(), 20);
        assert_eq!(path.depth(), MAX_DEPTH);
        assert_eq!(path.truncated(), 20 - MAX_DEPTH);
    }

    #[test]
    fn overflow_and_restore() {
        // Pushing MAX_DEPTH + k tags then popping k yields a path equal to
        // one that never overflowed, given the same first MAX_DEPTH tags.
        let mut overflowed = path_of(&TAGS);
        for _ in MAX_DEPTH..TAGS.len() {
            overflowed.pop();
        }
        let plain = path_of(&TAGS[..MAX_DEPTH]);
        assert_eq!(overflowed, plain);
        assert_eq!(overflowed.truncated(), 0);
    }

    #[test]
    fn equality_ignores_tags_beyond_capacity() {
        let mut a = path_of(&TAGS[..MAX_DEPTH]);
        let mut b = path_of(&TAGS[..MAX_DEPTH]);
        a.push(Tag::new("dropped-one"));
        b.push(Tag::new("dropped-two"));
        // Same logical size, same stored prefix: indistinguishable keys.
        assert_eq!(a, b);

        b.push(Tag::new("dropped-three"));
        assert_ne!(a, b);
    }

    #[test]
    fn ordering_is_by_size_then_prefix() {
        let short = path_of(&["x", "y"]);
        let long = path_of(&["x", "y", "z"]);
        assert!(short < long);

        let a = path_of(&["x", "y"]);
        assert_eq!(short.cmp(&a), Ordering::Equal);
    }

    #[test]
    fn tags_compare_by_identity() {
        let one = Tag::new("same");
        let two = one;
        assert_eq!(one, two);
        // Content comparison is explicitly out; only identity matters.
        assert_eq!(one.as_str(), "same");
    }

    #[test]
    fn display_marks_truncation() {
        let mut path = path_of(&TAGS[..MAX_DEPTH]);
        assert!(!format!("{}", path).contains("..."));
        path.push(Tag::new("u"));
        path.push(Tag::new("v"));
        assert!(format!("{}", path).ends_with("/...(2)"));
    }
}
