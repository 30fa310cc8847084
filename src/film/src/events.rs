//! Event timeline extraction from the chunk-33 match summary.
//!
//! Events are recovered by probing a fixed +48 offset from each gamertag
//! occurrence and accepting only type/timestamp pairs that pass plausibility
//! gates. The +48 offset is empirical; it matched the sampled films and has
//! no confirmed structural justification.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::players::encode_utf16le;
use crate::scan;

/// Probe offset from the gamertag start to the event record.
pub const EVENT_PROBE_OFFSET: usize = 48;

/// Event type codes are multiples of this step.
pub const EVENT_TYPE_STEP: u16 = 0x100;

/// Largest known event type code.
pub const MAX_EVENT_TYPE: u16 = 0x900;

/// Timestamps at or above this are rejected as noise (one hour of play).
pub const MAX_TIMESTAMP_MS: u32 = 3_600_000;

/// Tighter ceiling used by the position-correlated extraction.
pub const CORRELATED_MAX_TIMESTAMP_MS: u32 = 700_000;

/// Opaque payload length captured with each accepted event.
pub const EVENT_PAYLOAD_LEN: usize = 16;

/// A timestamped event recovered from chunk 33.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmEvent {
    /// Milliseconds from match start.
    pub timestamp: u32,
    /// Raw type code, a multiple of 0x100 in 0..=0x900.
    pub event_type: u16,
    pub event_type_name: String,
    pub gamertag: Option<String>,
    /// The 16 bytes at the probe offset, zero-padded at the buffer tail.
    pub payload: [u8; EVENT_PAYLOAD_LEN],
}

/// Human-readable name for an event type code.
pub fn event_type_name(event_type: u16) -> String {
    let name = match event_type {
        0x000 => "spawn/join",
        0x100 => "kill",
        0x200 => "death",
        0x300 => "assist",
        0x400 => "medal_tier1",
        0x500 => "medal_tier2/ctf_action",
        0x600 => "flag_event",
        0x700 => "multi_kill",
        0x800 => "special_event",
        0x900 => "end_of_match",
        other => return format!("unknown_0x{other:x}"),
    };
    name.to_string()
}

/// Probe every gamertag occurrence for an event record.
///
/// Returns accepted events paired with the gamertag occurrence offset they
/// were probed from, unsorted. Shared by the general extraction and the
/// position-correlated variant, which differ only in `max_timestamp`.
pub(crate) fn probe_events(
    data: &[u8],
    gamertags: &[String],
    max_timestamp: u32,
) -> Vec<(FilmEvent, usize)> {
    let mut found = Vec::new();

    for tag in gamertags {
        let needle = encode_utf16le(tag);
        if needle.is_empty() {
            continue;
        }

        for offset in scan::find_all(data, &needle) {
            let probe = offset + EVENT_PROBE_OFFSET;
            if probe + 8 > data.len() {
                continue;
            }

            let event_type = u16::from_le_bytes([data[probe], data[probe + 1]]);
            let timestamp = u32::from_le_bytes([
                data[probe + 2],
                data[probe + 3],
                data[probe + 4],
                data[probe + 5],
            ]);

            if event_type % EVENT_TYPE_STEP != 0
                || event_type > MAX_EVENT_TYPE
                || timestamp >= max_timestamp
            {
                continue;
            }

            let mut payload = [0u8; EVENT_PAYLOAD_LEN];
            let avail = (data.len() - probe).min(EVENT_PAYLOAD_LEN);
            payload[..avail].copy_from_slice(&data[probe..probe + avail]);

            found.push((
                FilmEvent {
                    timestamp,
                    event_type,
                    event_type_name: event_type_name(event_type),
                    gamertag: Some(tag.clone()),
                    payload,
                },
                offset,
            ));
        }
    }

    found
}

/// Stable sort by timestamp, then drop adjacent duplicates.
///
/// Only index-adjacent `(timestamp, event_type, gamertag)` duplicates are
/// removed. This is a de-noising pass over repeated probe hits, not a full
/// set dedup.
pub(crate) fn sort_and_dedup(events: &mut Vec<FilmEvent>) {
    events.sort_by_key(|e| e.timestamp);
    events.dedup_by(|a, b| {
        a.timestamp == b.timestamp && a.event_type == b.event_type && a.gamertag == b.gamertag
    });
}

/// Extract the timestamped event timeline for the known gamertags.
///
/// Output is sorted ascending by timestamp with adjacent duplicates
/// removed. Never fails; buffers with no recognizable events yield an
/// empty timeline.
pub fn parse_events(data: &[u8], gamertags: &[String]) -> Vec<FilmEvent> {
    let mut events: Vec<FilmEvent> = probe_events(data, gamertags, MAX_TIMESTAMP_MS)
        .into_iter()
        .map(|(event, _)| event)
        .collect();
    sort_and_dedup(&mut events);
    debug!(count = events.len(), "events extracted");
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn place_gamertag(buf: &mut [u8], name: &str, offset: usize) {
        let encoded = encode_utf16le(name);
        buf[offset..offset + encoded.len()].copy_from_slice(&encoded);
    }

    fn place_event(buf: &mut [u8], gamertag_offset: usize, event_type: u16, timestamp: u32) {
        let probe = gamertag_offset + EVENT_PROBE_OFFSET;
        buf[probe..probe + 2].copy_from_slice(&event_type.to_le_bytes());
        buf[probe + 2..probe + 6].copy_from_slice(&timestamp.to_le_bytes());
    }

    #[test]
    fn test_kill_event_at_probe_offset() {
        let mut buf = vec![0u8; 256];
        place_gamertag(&mut buf, "Player1", 100);
        place_event(&mut buf, 100, 0x100, 5000);

        let events = parse_events(&buf, &tags(&["Player1"]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, 5000);
        assert_eq!(events[0].event_type, 0x100);
        assert_eq!(events[0].event_type_name, "kill");
        assert_eq!(events[0].gamertag.as_deref(), Some("Player1"));
    }

    #[test]
    fn test_payload_captures_probe_bytes() {
        let mut buf = vec![0u8; 256];
        place_gamertag(&mut buf, "Player1", 100);
        place_event(&mut buf, 100, 0x200, 1234);
        let probe = 100 + EVENT_PROBE_OFFSET;
        buf[probe + 6..probe + 16].copy_from_slice(&[0xaa; 10]);

        let events = parse_events(&buf, &tags(&["Player1"]));
        assert_eq!(&events[0].payload[..2], &0x200u16.to_le_bytes());
        assert_eq!(&events[0].payload[6..], &[0xaa; 10]);
    }

    #[test]
    fn test_rejects_implausible_probes() {
        let mut buf = vec![0u8; 512];
        place_gamertag(&mut buf, "A1", 0);
        place_event(&mut buf, 0, 0x101, 5000); // not a multiple of 0x100
        place_gamertag(&mut buf, "A2", 100);
        place_event(&mut buf, 100, 0xa00, 5000); // above 0x900
        place_gamertag(&mut buf, "A3", 200);
        place_event(&mut buf, 200, 0x100, 4_000_000); // past the ceiling

        assert!(parse_events(&buf, &tags(&["A1", "A2", "A3"])).is_empty());
    }

    #[test]
    fn test_payload_zero_padded_at_buffer_tail() {
        // Probe leaves 10 bytes: enough for the 8-byte record, short of
        // the full 16-byte payload.
        let mut buf = vec![0u8; 58];
        place_gamertag(&mut buf, "T1", 0);
        place_event(&mut buf, 0, 0x100, 42_000);
        let probe = EVENT_PROBE_OFFSET;
        buf[probe + 6..probe + 10].copy_from_slice(&[0xcc; 4]);

        let events = parse_events(&buf, &tags(&["T1"]));
        assert_eq!(events.len(), 1);
        assert_eq!(&events[0].payload[..2], &0x100u16.to_le_bytes());
        assert_eq!(&events[0].payload[6..10], &[0xcc; 4]);
        assert_eq!(&events[0].payload[10..], &[0u8; 6]);
    }

    #[test]
    fn test_probe_near_buffer_end_skipped() {
        let mut buf = vec![0u8; 60];
        place_gamertag(&mut buf, "Tail", 8);
        // probe = 56, needs 8 bytes, buffer is 60: skipped.
        assert!(parse_events(&buf, &tags(&["Tail"])).is_empty());
    }

    #[test]
    fn test_sorted_with_adjacent_dedup() {
        let mut buf = vec![0u8; 1024];
        place_gamertag(&mut buf, "P1", 0);
        place_event(&mut buf, 0, 0x200, 9000);
        place_gamertag(&mut buf, "P1", 200);
        place_event(&mut buf, 200, 0x100, 3000);
        // Duplicate of the first hit at a different offset.
        place_gamertag(&mut buf, "P1", 400);
        place_event(&mut buf, 400, 0x200, 9000);

        let events = parse_events(&buf, &tags(&["P1"]));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp, 3000);
        assert_eq!(events[1].timestamp, 9000);
        for pair in events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
            assert!(
                pair[0].timestamp != pair[1].timestamp
                    || pair[0].event_type != pair[1].event_type
                    || pair[0].gamertag != pair[1].gamertag
            );
        }
    }

    #[test]
    fn test_unknown_event_type_name() {
        assert_eq!(event_type_name(0x900), "end_of_match");
        assert_eq!(event_type_name(0x000), "spawn/join");
        assert_eq!(event_type_name(0xb00), "unknown_0xb00");
    }
}
