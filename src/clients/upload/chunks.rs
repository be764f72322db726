//! Chunk planning and reply inspection for video uploads.
//!
//! A video is always sent as [`CHUNK_COUNT`] contiguous byte ranges of
//! `ceil(total / CHUNK_COUNT)` bytes each, the last one absorbing the
//! remainder. Ranges are inclusive on both ends, as in `Content-Range`.

use std::fmt;

/// Number of chunks a video is split into.
pub const CHUNK_COUNT: u64 = 4;

/// One inclusive byte range of the source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkRange {
    /// Zero-based position of the chunk in the plan.
    pub index: usize,
    /// First byte.
    pub start: u64,
    /// Last byte.
    pub end: u64,
}

impl ChunkRange {
    /// Returns the number of bytes in the range.
    ///
    /// Planned ranges always hold at least one byte.
    #[allow(clippy::len_without_is_empty)]
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Formats the `Content-Range` header value.
    #[must_use]
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// The byte ranges for one upload attempt.
///
/// # Example
///
/// ```rust
/// use appwire::clients::upload::ChunkPlan;
///
/// let plan = ChunkPlan::new(10);
/// let sizes: Vec<u64> = plan.ranges().iter().map(|r| r.len()).collect();
/// assert_eq!(sizes, vec![3, 3, 3, 1]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkPlan {
    total: u64,
    ranges: Vec<ChunkRange>,
}

impl ChunkPlan {
    /// Plans the chunks for a file of `total` bytes.
    ///
    /// Chunks that would hold no bytes are left out, so files shorter than
    /// [`CHUNK_COUNT`] bytes get fewer chunks and an empty file gets none.
    #[must_use]
    pub fn new(total: u64) -> Self {
        let chunk_size = (total + CHUNK_COUNT - 1) / CHUNK_COUNT;
        let mut ranges = Vec::new();

        if chunk_size > 0 {
            let mut start = 0;
            while start < total {
                let end = (start + chunk_size).min(total) - 1;
                ranges.push(ChunkRange {
                    index: ranges.len(),
                    start,
                    end,
                });
                start = end + 1;
            }
        }

        Self { total, ranges }
    }

    /// Returns the file size the plan covers.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Returns the planned ranges in upload order.
    #[must_use]
    pub fn ranges(&self) -> &[ChunkRange] {
        &self.ranges
    }

    /// Returns the number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns `true` if there is nothing to upload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns `true` if `range` is the final chunk of the plan.
    #[must_use]
    pub fn is_last(&self, range: &ChunkRange) -> bool {
        range.index + 1 == self.ranges.len()
    }
}

/// Returns `true` if a chunk acknowledgment shows the server still holds
/// every byte from offset zero.
///
/// Intermediate acknowledgments look like `0-<received>/<total>`. Any other
/// start means earlier chunks were dropped.
#[must_use]
pub fn server_kept_prior_chunks(reply: &[u8]) -> bool {
    reply.starts_with(b"0-")
}

/// Returns `true` if a terminal chunk reply is a JSON object.
///
/// A server that lost its chunk state answers the final chunk with another
/// range string instead.
#[must_use]
pub fn is_json_object_reply(reply: &[u8]) -> bool {
    reply.first() == Some(&b'{')
}

/// Progress of one upload attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadState {
    /// File opened, nothing sent.
    Init,
    /// Chunk `n` (zero-based) is in flight.
    SendingChunk(usize),
    /// Chunk `n` was answered.
    ChunkAcked(usize),
    /// Every chunk was sent.
    Completed,
    /// Remaining chunks were skipped after a bad acknowledgment.
    Aborted,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::SendingChunk(n) => write!(f, "sending chunk {}", n + 1),
            Self::ChunkAcked(n) => write!(f, "chunk {} acked", n + 1),
            Self::Completed => f.write_str("completed"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}
