//! Component catalog extraction from chunk 0.
//!
//! Chunk 0 embeds the names of entity-component types as null-terminated
//! ASCII strings ending in `-component` (e.g. `weapon-component`). There is
//! no table of contents; the catalog is recovered by scanning for the
//! suffix and walking backward to the start of each name. The heuristic
//! misses names with other suffixes and cannot tell a real catalog entry
//! from an incidental byte sequence that happens to match.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scan;

/// Suffix every catalogued component name ends with, including the
/// null terminator.
pub const COMPONENT_SUFFIX: &[u8] = b"-component\0";

/// Candidate names at or below this length are truncated matches.
const MIN_NAME_LEN: usize = 3;

/// A named component type recovered from chunk 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    /// Sequential index in discovery order.
    pub index: usize,
    /// ASCII name ending in `-component`.
    pub name: String,
    /// Byte offset of the name start in chunk 0.
    pub offset: usize,
}

/// Scan a decompressed chunk-0 buffer for component type names.
///
/// Names are deduplicated by exact equality, first occurrence wins, and
/// indexed 0..N-1 in discovery order. Never fails; an unrecognizable
/// buffer yields an empty catalog.
pub fn parse_component_definitions(data: &[u8]) -> Vec<ComponentDefinition> {
    let mut defs: Vec<ComponentDefinition> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for hit in scan::find_all(data, COMPONENT_SUFFIX) {
        // Exclusive end of the name: the null terminator.
        let end = hit + COMPONENT_SUFFIX.len() - 1;

        // Walk backward over printable ASCII to the name start.
        let mut start = hit;
        while start > 0 {
            let b = data[start - 1];
            if !(0x20..=0x7e).contains(&b) {
                break;
            }
            start -= 1;
        }

        let candidate = &data[start..end];
        if candidate.len() <= MIN_NAME_LEN || !candidate.contains(&b'-') {
            continue;
        }

        let name = String::from_utf8_lossy(candidate).into_owned();
        if seen.insert(name.clone()) {
            defs.push(ComponentDefinition {
                index: defs.len(),
                name,
                offset: start,
            });
        }
    }

    debug!(count = defs.len(), "component catalog extracted");
    defs
}
