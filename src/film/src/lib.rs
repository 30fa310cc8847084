//! # spartan-film
//!
//! Decoder for Halo Infinite "film" replay archives.
//!
//! A film archive is a fixed set of 34 binary chunks, each optionally
//! zlib-compressed (RFC 1950):
//! - Chunk 0: initial entity/component state
//! - Chunks 1-32: per-tick delta frames
//! - Chunk 33: match summary
//!
//! The wire format has no public specification. Everything this crate
//! recovers comes from heuristic pattern scanning over raw bytes, bounded
//! by plausibility checks (value ranges, alignment, proximity). Extraction
//! is best-effort: an empty result means "not found by this heuristic",
//! never proof of absence.
//!
//! ## Example
//!
//! ```no_run
//! use spartan_film::{FilmReader, Roster};
//!
//! # fn main() -> spartan_film::Result<()> {
//! let reader = FilmReader::open("films/match-1234");
//! let roster = Roster {
//!     gamertags: vec!["Player1".into(), "Player2".into()],
//!     xuids: vec!["2533274823456789".into()],
//! };
//!
//! let summary = reader.parse(&roster)?;
//! println!("{} component types", summary.components.len());
//! println!("{} events", summary.events.len());
//!
//! for info in reader.chunk_info()? {
//!     println!("chunk {}: {} bytes compressed", info.index, info.compressed_size);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod components;
pub mod cursor;
pub mod events;
pub mod film;
pub mod players;
pub mod positions;
pub mod scan;

// Re-export main types
pub use chunk::{
    compress, decompress, is_compressed, ChunkReader, ChunkSource, DirectorySource,
    FilmChunkInfo, CHUNK_COUNT, INITIAL_STATE_CHUNK, SUMMARY_CHUNK,
};
pub use components::{parse_component_definitions, ComponentDefinition};
pub use cursor::ByteCursor;
pub use events::{event_type_name, parse_events, FilmEvent};
pub use film::{FilmReader, FilmSummary, Roster};
pub use players::{correlate_xuids, find_gamertags, find_xuid_offsets, PlayerInfo};
pub use positions::{
    correlate_event_positions, scan_coarse, scan_dense, PositionSample, PositionedEvent,
    COARSE_STRIDE,
};

/// Errors produced while loading or decoding film chunks.
///
/// Heuristic extractors never appear here: absence of a pattern yields an
/// empty collection, not an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Chunk payload is too short or does not start with a zlib header.
    #[error("corrupt chunk: missing or invalid zlib header")]
    CorruptChunk,

    /// The zlib header was present but inflate failed on the stream.
    #[error("zlib decompression failed: {0}")]
    DecompressionFailed(#[source] std::io::Error),

    /// A typed read ran past the end of the buffer.
    #[error("out of bounds: need {needed} bytes at offset {offset}, buffer is {len}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// Chunk 0 or 33 could not be loaded during a full parse.
    #[error("required chunk {0} is missing from the archive")]
    MissingRequiredChunk(usize),

    /// No source (compressed or cached) exists for the chunk index.
    #[error("chunk {0} not found")]
    ChunkNotFound(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
