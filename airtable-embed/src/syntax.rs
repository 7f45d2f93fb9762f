//! Locating embed tags in page source.

/// Opens an embed tag.
pub const ENTRY_MARKER: &str = "{{airtable>";

/// Closes an embed tag.
pub const EXIT_MARKER: &str = "}}";

/// An embed tag found in page source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'s> {
    /// Byte offset of the entry marker.
    pub start: usize,
    /// Byte offset just past the exit marker.
    pub end: usize,
    /// The query string between the markers.
    pub body: &'s str,
}

/// Returns an iterator over the embed tags in the given source, in order.
///
/// Tags cannot be nested. An entry marker without a matching exit marker ends
/// the iteration and is left alone.
pub fn tags(source: &str) -> Tags<'_> {
    Tags { source, pos: 0 }
}

/// Iterator over the embed tags in a page. See [`tags`].
#[derive(Debug, Clone)]
pub struct Tags<'s> {
    source: &'s str,
    pos: usize,
}

impl<'s> Iterator for Tags<'s> {
    type Item = Tag<'s>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos + self.source[self.pos..].find(ENTRY_MARKER)?;
        let body_start = start + ENTRY_MARKER.len();
        let body_end = body_start + self.source[body_start..].find(EXIT_MARKER)?;
        let end = body_end + EXIT_MARKER.len();
        self.pos = end;
        Some(Tag {
            start,
            end,
            body: &self.source[body_start..body_end],
        })
    }
}
