//! Reusable candidate buffer for range queries.

use crate::error::{Result, SpatialError};

/// Caller-owned output of [`SpatialHash::query`](crate::SpatialHash::query).
///
/// Holds the candidate list of the last query, plus per-bucket generation
/// stamps so a query scans each bucket at most once. Reuse one buffer per
/// thread across queries to avoid allocating every call.
///
/// An unbounded buffer grows as needed. A buffer created with
/// [`with_limit`](Self::with_limit) never holds more than its limit: a query
/// that would exceed it keeps the first `limit` candidates and returns
/// [`SpatialError::CapacityExceeded`].
#[derive(Clone, Debug, Default)]
pub struct QueryBuffer {
    candidates: Vec<u32>,
    stamps: Vec<u32>,
    generation: u32,
    limit: Option<usize>,
    required: usize,
}

impl QueryBuffer {
    /// Create an unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unbounded buffer with room for `capacity` candidates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Create a buffer that holds at most `limit` candidates.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(limit),
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Candidates found by the last query.
    #[inline]
    pub fn candidates(&self) -> &[u32] {
        &self.candidates
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate cap, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Drop the candidates of the last query.
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.required = 0;
    }

    /// Start a query over a table of `table_size` buckets.
    pub(crate) fn begin(&mut self, table_size: u32) {
        self.clear();
        if self.stamps.len() != table_size as usize {
            self.stamps.clear();
            self.stamps.resize(table_size as usize, 0);
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamps.fill(0);
            self.generation = 1;
        }
    }

    /// Mark `bucket` as scanned. Returns `false` if it already was during
    /// this query.
    #[inline]
    pub(crate) fn visit(&mut self, bucket: u32) -> bool {
        let stamp = &mut self.stamps[bucket as usize];
        if *stamp == self.generation {
            return false;
        }
        *stamp = self.generation;
        true
    }

    /// Append candidates, truncating at the limit.
    #[inline]
    pub(crate) fn push_slice(&mut self, ids: &[u32]) {
        self.required += ids.len();
        let room = match self.limit {
            Some(limit) => limit.saturating_sub(self.candidates.len()).min(ids.len()),
            None => ids.len(),
        };
        self.candidates.extend_from_slice(&ids[..room]);
    }

    /// Candidates the current query produced, including any truncated ones.
    #[inline]
    pub(crate) fn required(&self) -> usize {
        self.required
    }

    /// Report truncation.
    pub(crate) fn finish(&self) -> Result<()> {
        match self.limit {
            Some(limit) if self.required > limit => Err(SpatialError::CapacityExceeded {
                limit,
                required: self.required,
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(u32) -> bool) {
        self.candidates.retain(|&index| keep(index));
    }
}

impl<'a> IntoIterator for &'a QueryBuffer {
    type Item = &'a u32;
    type IntoIter = std::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_once_per_query() {
        let mut buffer = QueryBuffer::new();
        buffer.begin(4);
        assert!(buffer.visit(2));
        assert!(!buffer.visit(2));
        assert!(buffer.visit(3));

        buffer.begin(4);
        assert!(buffer.visit(2));
    }

    #[test]
    fn test_table_resize_resets_stamps() {
        let mut buffer = QueryBuffer::new();
        buffer.begin(4);
        assert!(buffer.visit(1));
        buffer.begin(8);
        assert!(buffer.visit(1));
        assert!(buffer.visit(7));
    }

    #[test]
    fn test_generation_wraps() {
        let mut buffer = QueryBuffer::new();
        buffer.begin(2);
        buffer.visit(0);
        buffer.generation = u32::MAX;
        buffer.stamps[1] = u32::MAX;
        buffer.begin(2);
        assert_eq!(buffer.generation, 1);
        assert!(buffer.visit(0));
        assert!(buffer.visit(1));
    }

    #[test]
    fn test_unbounded_grows() {
        let mut buffer = QueryBuffer::with_capacity(1);
        buffer.begin(1);
        buffer.push_slice(&[1, 2, 3]);
        buffer.push_slice(&[4]);
        assert_eq!(buffer.candidates(), &[1, 2, 3, 4]);
        assert!(buffer.finish().is_ok());
    }

    #[test]
    fn test_limit_truncates() {
        let mut buffer = QueryBuffer::with_limit(3);
        buffer.begin(1);
        buffer.push_slice(&[1, 2]);
        buffer.push_slice(&[3, 4, 5]);
        assert_eq!(buffer.candidates(), &[1, 2, 3]);
        assert_eq!(
            buffer.finish(),
            Err(SpatialError::CapacityExceeded { limit: 3, required: 5 })
        );

        buffer.begin(1);
        assert!(buffer.is_empty());
        buffer.push_slice(&[9]);
        assert!(buffer.finish().is_ok());
    }

    #[test]
    fn test_retain_and_iter() {
        let mut buffer = QueryBuffer::new();
        buffer.begin(1);
        buffer.push_slice(&[1, 2, 3, 4]);
        buffer.retain(|i| i % 2 == 0);
        let collected: Vec<u32> = (&buffer).into_iter().copied().collect();
        assert_eq!(collected, vec![2, 4]);
    }
}
