//! Film archive aggregation: one parse, one summary.
//!
//! Runs the component catalog over chunk 0 and the identity/event/position
//! extractors over chunk 33, then assembles a single immutable
//! [`FilmSummary`]. Each parse is a pure function of (chunk bytes, roster):
//! no state is carried across calls.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::{
    ChunkReader, ChunkSource, DirectorySource, FilmChunkInfo, INITIAL_STATE_CHUNK, SUMMARY_CHUNK,
};
use crate::components::{parse_component_definitions, ComponentDefinition};
use crate::events::{parse_events, FilmEvent};
use crate::players::{correlate_xuids, find_gamertags, find_xuid_offsets, PlayerInfo};
use crate::positions::{scan_coarse, PositionSample, COARSE_STRIDE};
use crate::{Error, Result};

/// Known player identities for one match, from an external roster lookup.
///
/// Absent entries simply yield no matches; an empty roster is never an
/// error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    pub gamertags: Vec<String>,
    pub xuids: Vec<String>,
}

/// Everything one parse recovers from a film archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmSummary {
    pub components: Vec<ComponentDefinition>,
    pub players: Vec<PlayerInfo>,
    pub events: Vec<FilmEvent>,
    pub positions: Vec<PositionSample>,
}

/// Orchestrates chunk loading and the heuristic extractors.
pub struct FilmReader<S: ChunkSource> {
    chunks: ChunkReader<S>,
}

impl FilmReader<DirectorySource> {
    /// Reader over a film directory of `filmChunk{N}` / `filmChunk{N}_dec`
    /// files.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self::new(DirectorySource::new(dir.as_ref()))
    }
}

impl<S: ChunkSource> FilmReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            chunks: ChunkReader::new(source),
        }
    }

    /// Load and decompress one chunk by index.
    pub fn load_chunk(&self, index: usize) -> Result<Vec<u8>> {
        self.chunks.load(index)
    }

    fn load_required(&self, index: usize) -> Result<Vec<u8>> {
        self.chunks.load(index).map_err(|e| match e {
            Error::ChunkNotFound(i) => Error::MissingRequiredChunk(i),
            other => other,
        })
    }

    /// Run the full extraction and assemble a summary.
    ///
    /// Fails with [`Error::MissingRequiredChunk`] when chunk 0 or 33 cannot
    /// be loaded; heuristic misses never fail, they produce empty
    /// collections.
    pub fn parse(&self, roster: &Roster) -> Result<FilmSummary> {
        let initial_state = self.load_required(INITIAL_STATE_CHUNK)?;
        let components = parse_component_definitions(&initial_state);

        let summary_chunk = self.load_required(SUMMARY_CHUNK)?;

        let mut players = find_gamertags(&summary_chunk, &roster.gamertags);
        let xuid_offsets = find_xuid_offsets(&summary_chunk, &roster.xuids);
        correlate_xuids(&mut players, &xuid_offsets);

        let events = parse_events(&summary_chunk, &roster.gamertags);
        let positions = scan_coarse(&summary_chunk, COARSE_STRIDE);

        debug!(
            components = components.len(),
            players = players.len(),
            events = events.len(),
            positions = positions.len(),
            "film parsed"
        );

        Ok(FilmSummary {
            components,
            players,
            events,
            positions,
        })
    }

    /// Per-chunk diagnostic report; independent of [`FilmReader::parse`]
    /// and never fails on missing optional chunks.
    pub fn chunk_info(&self) -> Result<Vec<FilmChunkInfo>> {
        self.chunks.chunk_info()
    }
}
