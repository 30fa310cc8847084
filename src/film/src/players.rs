//! Player identity extraction from the chunk-33 match summary.
//!
//! Gamertags are located by scanning for their UTF-16LE encoding; the
//! surrounding bytes carry per-player fields we only partially understand.
//! The team id at +36 and the 100-byte XUID proximity window are
//! reverse-engineered constants with no confirmed structural justification;
//! treat them as empirical, not as schema.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cursor::ByteCursor;
use crate::scan;

/// Offset of the little-endian u32 team id, relative to the gamertag start.
pub const TEAM_ID_OFFSET: usize = 36;

/// Largest value accepted as a real team id.
pub const MAX_TEAM_ID: u32 = 7;

/// Team id reported when the probe is out of bounds or implausible.
pub const UNKNOWN_TEAM: i32 = -1;

/// A XUID offset within this many bytes of a gamertag offset is treated as
/// belonging to that player.
pub const XUID_PROXIMITY_BYTES: usize = 100;

/// One player identity recovered from chunk 33.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Correlated XUID, or empty when no XUID landed near the gamertag.
    pub xuid: String,
    pub gamertag: String,
    /// Film-local team id in [0,7], or -1 when unknown.
    pub film_team_id: i32,
    /// Byte offset of the UTF-16LE gamertag in chunk 33.
    pub offset: usize,
}

/// Encode a string the way films store gamertags.
pub fn encode_utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Find every occurrence of the known gamertags in a chunk-33 buffer.
///
/// Produces at most one [`PlayerInfo`] per distinct byte offset, so
/// re-scanning is idempotent. XUIDs start empty; see [`correlate_xuids`].
pub fn find_gamertags(data: &[u8], gamertags: &[String]) -> Vec<PlayerInfo> {
    let mut players: Vec<PlayerInfo> = Vec::new();
    let mut seen_offsets: HashSet<usize> = HashSet::new();

    for tag in gamertags {
        let needle = encode_utf16le(tag);
        if needle.is_empty() {
            continue;
        }

        for offset in scan::find_all(data, &needle) {
            if !seen_offsets.insert(offset) {
                continue;
            }
            players.push(PlayerInfo {
                xuid: String::new(),
                gamertag: tag.clone(),
                film_team_id: read_team_id(data, offset),
                offset,
            });
        }
    }

    debug!(count = players.len(), "gamertag occurrences located");
    players
}

fn read_team_id(data: &[u8], gamertag_offset: usize) -> i32 {
    let mut cursor = ByteCursor::new(data);
    let value = match cursor
        .seek(gamertag_offset.saturating_add(TEAM_ID_OFFSET))
        .and_then(|()| cursor.read_u32())
    {
        Ok(value) => value,
        Err(_) => return UNKNOWN_TEAM,
    };
    if value <= MAX_TEAM_ID {
        value as i32
    } else {
        UNKNOWN_TEAM
    }
}

/// Locate every plausible occurrence of the known XUIDs in chunk 33.
///
/// Each XUID is searched in two encodings: as a little-endian u64, and as
/// an ASCII decimal string bounded on both sides by non-digit bytes or the
/// buffer edges (so `2533274` never matches inside a longer number).
/// Returns `(xuid, offsets)` pairs in roster order.
pub fn find_xuid_offsets(data: &[u8], xuids: &[String]) -> Vec<(String, Vec<usize>)> {
    let mut results = Vec::with_capacity(xuids.len());

    for xuid in xuids {
        let mut offsets: Vec<usize> = Vec::new();

        if let Ok(value) = xuid.parse::<u64>() {
            offsets.extend(scan::find_all(data, &value.to_le_bytes()));
        }

        if !xuid.is_empty() {
            for hit in scan::find_all(data, xuid.as_bytes()) {
                let before_ok = hit == 0 || !data[hit - 1].is_ascii_digit();
                let end = hit + xuid.len();
                let after_ok = end >= data.len() || !data[end].is_ascii_digit();
                if before_ok && after_ok {
                    offsets.push(hit);
                }
            }
        }

        results.push((xuid.clone(), offsets));
    }

    results
}

/// Assign XUIDs to players by byte proximity.
///
/// For each player, the first XUID (in roster iteration order) with any
/// occurrence within [`XUID_PROXIMITY_BYTES`] of the gamertag offset wins.
/// Players with no nearby XUID keep an empty string.
pub fn correlate_xuids(players: &mut [PlayerInfo], xuid_offsets: &[(String, Vec<usize>)]) {
    for player in players.iter_mut() {
        for (xuid, offsets) in xuid_offsets {
            let near = offsets
                .iter()
                .any(|&o| o.abs_diff(player.offset) <= XUID_PROXIMITY_BYTES);
            if near {
                player.xuid = xuid.clone();
                break;
            }
        }
    }
}
