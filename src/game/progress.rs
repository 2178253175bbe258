//! Compact codec for the per-player zone-progress mapping.
//!
//! The stored form is a sequence of interleaved little-endian u16 pairs:
//! for each entry, two bytes of zone id followed by two bytes of progress,
//! with no separators. Blob length is therefore always `4 * entries`.
//! Encode and decode use the same pairing convention and are exact inverses
//! for any well-formed mapping.

use crate::game::errors::GameError;
use crate::game::types::{ZoneId, ZoneProgress};

const ENTRY_WIDTH: usize = 4;

/// Encode a progress mapping into its stored byte form.
pub fn encode(progress: &ZoneProgress) -> Vec<u8> {
    let mut out = Vec::with_capacity(progress.len() * ENTRY_WIDTH);
    for (zone, furthest) in progress.iter() {
        out.extend_from_slice(&zone.to_le_bytes());
        out.extend_from_slice(&furthest.to_le_bytes());
    }
    out
}

/// Decode a stored blob back into a progress mapping.
///
/// An empty slice decodes to the empty mapping. Any length that is not a
/// multiple of 4 cannot be paired into (zone id, progress) tuples and fails
/// with [`GameError::MalformedProgress`]; no partial mapping is returned.
pub fn decode(data: &[u8]) -> Result<ZoneProgress, GameError> {
    if data.is_empty() {
        return Ok(ZoneProgress::new());
    }
    if data.len() % ENTRY_WIDTH != 0 {
        return Err(GameError::MalformedProgress { len: data.len() });
    }
    let progress = data
        .chunks_exact(ENTRY_WIDTH)
        .map(|chunk| {
            let zone = ZoneId::from_le_bytes([chunk[0], chunk[1]]);
            let furthest = u16::from_le_bytes([chunk[2], chunk[3]]);
            (zone, furthest)
        })
        .collect();
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_any_well_formed_mapping() {
        let cases: Vec<ZoneProgress> = vec![
            ZoneProgress::new(),
            [(1u16, 1u16)].into_iter().collect(),
            [(1u16, 7u16), (2, 0), (9, 300)].into_iter().collect(),
            (0u16..40).map(|z| (z, z * 3)).collect(),
            [(u16::MAX, u16::MAX)].into_iter().collect(),
        ];
        for progress in cases {
            let blob = encode(&progress);
            assert_eq!(blob.len(), progress.len() * 4);
            let decoded = decode(&blob).expect("decode");
            assert_eq!(decoded, progress);
        }
    }

    #[test]
    fn empty_blob_decodes_to_empty_mapping() {
        let decoded = decode(&[]).expect("decode empty");
        assert!(decoded.is_empty());
    }

    #[test]
    fn pairs_are_interleaved_not_split_in_halves() {
        // Three entries: a halves-based layout would mis-pair these.
        let progress: ZoneProgress = [(1u16, 10u16), (2, 20), (3, 30)].into_iter().collect();
        let blob = encode(&progress);
        assert_eq!(
            blob,
            vec![1, 0, 10, 0, 2, 0, 20, 0, 3, 0, 30, 0],
            "each entry must be (zone id, progress) back to back"
        );
        assert_eq!(decode(&blob).expect("decode"), progress);
    }

    #[test]
    fn unpaired_lengths_fail_fast() {
        for len in [1usize, 2, 3, 5, 6, 7, 9, 11] {
            let blob = vec![0u8; len];
            match decode(&blob) {
                Err(GameError::MalformedProgress { len: reported }) => {
                    assert_eq!(reported, len);
                }
                other => panic!("expected MalformedProgress for len {len}, got {other:?}"),
            }
        }
    }
}
