//! Film chunk loading and zlib decompression.
//!
//! A film archive is 34 chunks with fixed roles:
//! - Chunk 0: initial entity/component state
//! - Chunks 1-32: per-tick delta frames
//! - Chunk 33: match summary
//!
//! Each chunk is stored as a zlib stream (RFC 1950) named `filmChunk{N}`,
//! optionally alongside a pre-decompressed cache named `filmChunk{N}_dec`.
//! The loader prefers the cache when present. No archive-level header is
//! parsed; chunks are resolved independently by index.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Number of chunks in a film archive.
pub const CHUNK_COUNT: usize = 34;

/// Chunk holding the initial entity/component state.
pub const INITIAL_STATE_CHUNK: usize = 0;

/// Chunk holding the match summary.
pub const SUMMARY_CHUNK: usize = 33;

/// First byte of every RFC 1950 zlib stream (deflate, 32K window).
pub const ZLIB_HEADER_BYTE: u8 = 0x78;

/// Second-byte values observed across the compression levels films use.
pub const ZLIB_FLAG_BYTES: [u8; 4] = [0x5e, 0x9c, 0xda, 0x01];

/// Check whether a buffer starts with a zlib header this format produces.
///
/// False for any 0- or 1-byte input.
pub fn is_compressed(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == ZLIB_HEADER_BYTE && ZLIB_FLAG_BYTES.contains(&data[1])
}

/// Inflate a zlib-compressed chunk payload.
///
/// Fails with [`Error::CorruptChunk`] when the header is missing and
/// [`Error::DecompressionFailed`] when inflate rejects the stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 2 || data[0] != ZLIB_HEADER_BYTE {
        return Err(Error::CorruptChunk);
    }

    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(Error::DecompressionFailed)?;
    Ok(out)
}

/// Deflate a payload into a zlib stream, as the game writes chunks.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Per-chunk diagnostic record reported by [`ChunkReader::chunk_info`].
///
/// Sizes are 0 when the corresponding source is absent. `chunk_type` is the
/// first 4 little-endian bytes of the cached decompressed payload and is
/// informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmChunkInfo {
    pub index: usize,
    pub chunk_type: u32,
    pub compressed_size: usize,
    pub decompressed_size: usize,
    /// Whether the compressed source carried a recognized zlib header.
    pub is_zlib: bool,
}

/// Storage seam for chunk bytes.
///
/// Implementations resolve a chunk index to raw bytes from two possible
/// sources; `Ok(None)` means the source does not exist, which is never an
/// error at this layer.
pub trait ChunkSource {
    /// The pre-decompressed cached form, if present.
    fn read_cached(&self, index: usize) -> Result<Option<Vec<u8>>>;

    /// The compressed original, if present.
    fn read_compressed(&self, index: usize) -> Result<Option<Vec<u8>>>;
}

/// Chunk storage backed by a film directory on disk.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn compressed_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("filmChunk{index}"))
    }

    fn cached_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("filmChunk{index}_dec"))
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

impl ChunkSource for DirectorySource {
    fn read_cached(&self, index: usize) -> Result<Option<Vec<u8>>> {
        read_optional(&self.cached_path(index))
    }

    fn read_compressed(&self, index: usize) -> Result<Option<Vec<u8>>> {
        read_optional(&self.compressed_path(index))
    }
}

/// Resolves chunk indices to decompressed bytes over a [`ChunkSource`].
pub struct ChunkReader<S: ChunkSource> {
    source: S,
}

impl<S: ChunkSource> ChunkReader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Load a chunk, decompressing when the bytes carry a zlib header.
    ///
    /// The cached source wins when both exist. Fails with
    /// [`Error::ChunkNotFound`] when neither source exists.
    pub fn load(&self, index: usize) -> Result<Vec<u8>> {
        let bytes = match self.source.read_cached(index)? {
            Some(bytes) => bytes,
            None => self
                .source
                .read_compressed(index)?
                .ok_or(Error::ChunkNotFound(index))?,
        };

        let out = if is_compressed(&bytes) {
            decompress(&bytes)?
        } else {
            bytes
        };
        debug!(chunk = index, bytes = out.len(), "loaded chunk");
        Ok(out)
    }

    /// Diagnostic report over all 34 chunk indices.
    ///
    /// Indices with neither source are omitted, never errored; missing
    /// optional chunks are the normal case for partial downloads.
    pub fn chunk_info(&self) -> Result<Vec<FilmChunkInfo>> {
        let mut report = Vec::new();

        for index in 0..CHUNK_COUNT {
            let compressed = self.source.read_compressed(index)?;
            let cached = self.source.read_cached(index)?;
            if compressed.is_none() && cached.is_none() {
                continue;
            }

            let chunk_type = cached
                .as_deref()
                .and_then(|bytes| crate::ByteCursor::new(bytes).peek_u32().ok())
                .unwrap_or(0);

            report.push(FilmChunkInfo {
                index,
                chunk_type,
                compressed_size: compressed.as_ref().map_or(0, Vec::len),
                decompressed_size: cached.as_ref().map_or(0, Vec::len),
                is_zlib: compressed.as_deref().is_some_and(is_compressed),
            });
        }

        Ok(report)
    }
}
