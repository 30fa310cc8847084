//! Sampled 3D position extraction from the chunk-33 match summary.
//!
//! The buffer is treated as a dense array of little-endian float triplets
//! read at a stride; a triplet survives only if it lands inside plausible
//! gameplay coordinate bounds. All passes are pure reads over the same
//! immutable buffer and can run in any order.

use serde::{Deserialize, Serialize};

use crate::events::{probe_events, FilmEvent, CORRELATED_MAX_TIMESTAMP_MS};

/// Stride used by the aggregator's coarse scan.
pub const COARSE_STRIDE: usize = 50;

/// Stride of the dense map scan and the event-window search.
pub const DENSE_STRIDE: usize = 4;

/// Coarse scan: every component must be within +/- this bound.
pub const COARSE_BOUND: f32 = 600.0;

/// Coarse scan: at least one component must exceed this magnitude.
pub const COARSE_NOISE_FLOOR: f32 = 0.1;

/// Dense scan: x and y must be strictly inside +/- this bound.
pub const DENSE_XY_BOUND: f32 = 300.0;

/// Dense scan: z must be strictly inside this range.
pub const DENSE_Z_MIN: f32 = -20.0;
pub const DENSE_Z_MAX: f32 = 80.0;

/// Dense scan: |x| or |y| must exceed this to look like in-bounds play.
pub const DENSE_XY_FOOTPRINT: f32 = 30.0;

/// Event correlation window, in bytes around the gamertag offset.
pub const EVENT_WINDOW_BACK: usize = 200;
pub const EVENT_WINDOW_FORWARD: usize = 300;

const TRIPLET_LEN: usize = 12;

/// One plausible (x, y, z) sample recovered from chunk 33.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Byte offset of the triplet in chunk 33.
    pub offset: usize,
}

/// An extracted event with the nearest plausible position, when one exists
/// inside the search window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedEvent {
    pub event: FilmEvent,
    pub position: Option<PositionSample>,
}

fn read_triplet(data: &[u8], offset: usize) -> Option<(f32, f32, f32)> {
    let bytes = data.get(offset..offset + TRIPLET_LEN)?;
    let x = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let y = f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let z = f32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    Some((x, y, z))
}

fn coarse_plausible(x: f32, y: f32, z: f32) -> bool {
    let finite = x.is_finite() && y.is_finite() && z.is_finite();
    finite
        && x.abs() <= COARSE_BOUND
        && y.abs() <= COARSE_BOUND
        && z.abs() <= COARSE_BOUND
        && (x.abs() > COARSE_NOISE_FLOOR || y.abs() > COARSE_NOISE_FLOOR || z.abs() > COARSE_NOISE_FLOOR)
}

fn dense_plausible(x: f32, y: f32, z: f32) -> bool {
    let finite = x.is_finite() && y.is_finite() && z.is_finite();
    finite
        && x.abs() < DENSE_XY_BOUND
        && y.abs() < DENSE_XY_BOUND
        && z > DENSE_Z_MIN
        && z < DENSE_Z_MAX
        && (x.abs() > DENSE_XY_FOOTPRINT || y.abs() > DENSE_XY_FOOTPRINT)
}

/// Sample float triplets at a configurable stride with loose bounds.
///
/// Accepts triplets whose components are all finite within +/-600 with at
/// least one above the noise floor. Never fails; buffers with no plausible
/// triplets yield an empty vector.
pub fn scan_coarse(data: &[u8], stride: usize) -> Vec<PositionSample> {
    let stride = stride.max(1);
    let mut samples = Vec::new();
    let mut offset = 0;

    while offset + TRIPLET_LEN <= data.len() {
        if let Some((x, y, z)) = read_triplet(data, offset) {
            if coarse_plausible(x, y, z) {
                samples.push(PositionSample { x, y, z, offset });
            }
        }
        offset += stride;
    }

    samples
}

/// Sample float triplets at a 4-byte stride with the in-map footprint
/// bounds: x,y strictly inside (-300, 300), z inside (-20, 80), and |x| or
/// |y| above 30.
pub fn scan_dense(data: &[u8]) -> Vec<PositionSample> {
    let mut samples = Vec::new();
    let mut offset = 0;

    while offset + TRIPLET_LEN <= data.len() {
        if let Some((x, y, z)) = read_triplet(data, offset) {
            if dense_plausible(x, y, z) {
                samples.push(PositionSample { x, y, z, offset });
            }
        }
        offset += DENSE_STRIDE;
    }

    samples
}

/// Search the window around a gamertag occurrence for the first triplet
/// passing the dense bounds with both |x|>30 and |y|>30.
fn find_window_position(data: &[u8], gamertag_offset: usize) -> Option<PositionSample> {
    if data.len() < TRIPLET_LEN {
        return None;
    }
    let start = gamertag_offset.saturating_sub(EVENT_WINDOW_BACK);
    let end = (data.len() - TRIPLET_LEN).min(gamertag_offset + EVENT_WINDOW_FORWARD);

    let mut offset = start;
    while offset <= end {
        if let Some((x, y, z)) = read_triplet(data, offset) {
            if dense_plausible(x, y, z)
                && x.abs() > DENSE_XY_FOOTPRINT
                && y.abs() > DENSE_XY_FOOTPRINT
            {
                return Some(PositionSample { x, y, z, offset });
            }
        }
        offset += DENSE_STRIDE;
    }
    None
}

/// Extract events (at the tighter 700s timestamp ceiling) and attach the
/// first plausible position found near each event's gamertag occurrence.
///
/// Events keep the ordering guarantees of the general extractor: sorted
/// ascending by timestamp, adjacent duplicates removed.
pub fn correlate_event_positions(data: &[u8], gamertags: &[String]) -> Vec<PositionedEvent> {
    let mut probed = probe_events(data, gamertags, CORRELATED_MAX_TIMESTAMP_MS);

    // Sort/dedup on the events while the gamertag offsets are still
    // attached, so the surviving record keeps its own window match.
    probed.sort_by_key(|(event, _)| event.timestamp);
    probed.dedup_by(|(a, _), (b, _)| {
        a.timestamp == b.timestamp && a.event_type == b.event_type && a.gamertag == b.gamertag
    });

    probed
        .into_iter()
        .map(|(event, offset)| PositionedEvent {
            position: find_window_position(data, offset),
            event,
        })
        .collect()
}
