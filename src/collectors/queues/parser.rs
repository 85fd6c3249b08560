//! Counter name parsing
//!
//! Turns the flat, driver-specific list of ethtool statistic names into
//! `(position, queue, slot)` entries. Names that are not per-queue counters
//! (link state, driver internals, interface totals) are skipped.

use log::trace;
use regex::Captures;
use serde::Serialize;

use crate::collectors::queues::registry::{DriverPattern, Fallback, RoleSource};
use crate::collectors::queues::stats::{CounterKind, Direction, Slot};

/// Highest queue number a counter name may carry
///
/// Larger numbers are treated as non-matches; they would otherwise size the
/// per-queue table from untrusted driver text.
pub const MAX_QUEUE: usize = u16::MAX as usize;

/// A counter name that decoded to a queue and slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParsedEntry {
    /// Position of the name in the source's counter list
    pub source_index: usize,
    pub queue: usize,
    pub slot: Slot,
}

/// Decodes every name in `names` with `pattern`, keeping source order
pub fn parse<S: AsRef<str>>(pattern: &DriverPattern, names: &[S]) -> Vec<ParsedEntry> {
    names
        .iter()
        .enumerate()
        .filter_map(|(source_index, name)| {
            let name = name.as_ref();
            let decoded = decode_name(pattern, name);
            match decoded {
                Some((queue, slot)) => trace!(
                    "Counter #{} '{}' -> queue {} {:?}",
                    source_index, name, queue, slot
                ),
                None => trace!("Counter #{} '{}' is not a queue counter", source_index, name),
            }
            decoded.map(|(queue, slot)| ParsedEntry {
                source_index,
                queue,
                slot,
            })
        })
        .collect()
}

/// Decodes a single counter name, applying the pattern's fallback on a miss
pub fn decode_name(pattern: &DriverPattern, name: &str) -> Option<(usize, Slot)> {
    let primary = pattern
        .matcher()
        .and_then(|matcher| matcher.captures(name))
        .and_then(|captures| decode_captures(pattern, &captures));

    match (primary, pattern.fallback()) {
        (Some(decoded), _) => Some(decoded),
        (None, Fallback::NoMatch) => None,
        (None, Fallback::Prefixed) => decode_prefixed(name),
    }
}

fn decode_captures(pattern: &DriverPattern, captures: &Captures<'_>) -> Option<(usize, Slot)> {
    let roles = pattern.roles();

    let queue = parse_queue_number(captures.get(roles.queue)?.as_str())?;

    let direction = match roles.direction {
        RoleSource::Fixed(direction) => direction,
        RoleSource::Group(group) => Direction::from_literal(captures.get(group)?.as_str())?,
    };

    let kind = match roles.kind {
        RoleSource::Fixed(kind) => kind,
        RoleSource::Group(group) => CounterKind::from_literal(captures.get(group)?.as_str()),
    };

    Some((queue, Slot::new(direction, kind)))
}

/// Parses a queue number that must consist of decimal digits only
///
/// A capture like `2x` means the pattern's literal text did not delimit the
/// number, so the name is treated as a non-match rather than as queue 2.
/// Numbers above [`MAX_QUEUE`] are rejected the same way.
pub fn parse_queue_number(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().filter(|queue| *queue <= MAX_QUEUE)
}

/// Hand-written decoder for the `rx-2.rx_bytes` / `tx-0.tx_packets` layout
///
/// The direction comes from the prefix, the queue number is everything between
/// the prefix and the first `.`, and the kind is the text after the first `_`
/// that follows the dot. Only `packets` and `bytes` are accepted there, since
/// these drivers also expose `rx-0.rx_csum_bad` style counters that would
/// otherwise collide with the packet counters.
pub fn decode_prefixed(name: &str) -> Option<(usize, Slot)> {
    let (direction, rest) = if let Some(rest) = name.strip_prefix("rx-") {
        (Direction::Rx, rest)
    } else if let Some(rest) = name.strip_prefix("tx-") {
        (Direction::Tx, rest)
    } else {
        return None;
    };

    let (number, suffix) = rest.split_once('.')?;
    let queue = parse_queue_number(number)?;

    let kind = match suffix.split_once('_')?.1 {
        "packets" => CounterKind::Packets,
        "bytes" => CounterKind::Bytes,
        _ => return None,
    };

    Some((queue, Slot::new(direction, kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::queues::registry::CaptureRoles;

    fn sfc_pattern() -> DriverPattern {
        DriverPattern::new(
            "sfc",
            r"^(rx|tx)-(\d+)\.(rx|tx)_(bytes|packets)$",
            CaptureRoles::groups(1, 4, 2),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_two_queues() {
        let names = [
            "rx-0.rx_packets",
            "rx-0.rx_bytes",
            "tx-0.tx_packets",
            "tx-0.tx_bytes",
            "rx-1.rx_packets",
            "rx-1.rx_bytes",
            "tx-1.tx_packets",
            "tx-1.tx_bytes",
        ];
        let entries = parse(&sfc_pattern(), &names);

        assert_eq!(entries.len(), 8);
        assert_eq!(
            entries[0],
            ParsedEntry {
                source_index: 0,
                queue: 0,
                slot: Slot::RxPackets
            }
        );
        assert_eq!(entries[3].slot, Slot::TxBytes);
        assert_eq!(entries[3].queue, 0);
        assert_eq!(entries[7].queue, 1);
        assert_eq!(entries[7].slot, Slot::TxBytes);

        // Source order is preserved
        let indices: Vec<usize> = entries.iter().map(|e| e.source_index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_skips_non_queue_counters() {
        let names = ["link_down_events", "rx-0.rx_bytes", "rx_noskb_drops", "tx-3.tx_packets"];
        let entries = parse(&sfc_pattern(), &names);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source_index, 1);
        assert_eq!(entries[1].source_index, 3);
        assert_eq!(entries[1].queue, 3);
        assert_eq!(entries[1].slot, Slot::TxPackets);
    }

    #[test]
    fn test_trailing_garbage_in_queue_number_is_rejected() {
        assert_eq!(decode_name(&sfc_pattern(), "rx-2x.rx_bytes"), None);

        // A loose pattern that captures more than digits still rejects it
        let loose = DriverPattern::new(
            "loose",
            r"^(rx|tx)-([^.]+)\.(bytes|packets)$",
            CaptureRoles::groups(1, 3, 2),
        )
        .unwrap();
        assert_eq!(decode_name(&loose, "rx-2x.bytes"), None);
        assert_eq!(decode_name(&loose, "rx-+2.bytes"), None);
        assert_eq!(decode_name(&loose, "rx-2.bytes"), Some((2, Slot::RxBytes)));
    }

    #[test]
    fn test_queue_number_parsing() {
        assert_eq!(parse_queue_number("0"), Some(0));
        assert_eq!(parse_queue_number("17"), Some(17));
        assert_eq!(parse_queue_number("007"), Some(7));
        assert_eq!(parse_queue_number(""), None);
        assert_eq!(parse_queue_number("-1"), None);
        assert_eq!(parse_queue_number("1 "), None);
        assert_eq!(parse_queue_number("99999999999999999999999999"), None);
    }

    #[test]
    fn test_oversized_queue_number_is_rejected() {
        assert_eq!(parse_queue_number("65535"), Some(MAX_QUEUE));
        assert_eq!(parse_queue_number("65536"), None);
        assert_eq!(parse_queue_number("4000000000"), None);
        assert_eq!(parse_queue_number("18446744073709551615"), None);

        let names = [
            "rx-0.rx_bytes",
            "rx-1.rx_packets",
            "rx-18446744073709551615.rx_packets",
            "tx-4000000000.tx_bytes",
        ];
        let entries = parse(&sfc_pattern(), &names);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry.queue <= 1));
        assert_eq!(decode_prefixed("rx-65536.rx_bytes"), None);
    }

    #[test]
    fn test_unknown_direction_text_is_rejected() {
        let pattern = DriverPattern::new(
            "upper",
            r"^(RX|TX|rx|tx)(\d+)_(bytes|packets)$",
            CaptureRoles::groups(1, 3, 2),
        )
        .unwrap();
        assert_eq!(decode_name(&pattern, "RX0_bytes"), None);
        assert_eq!(decode_name(&pattern, "rx0_bytes"), Some((0, Slot::RxBytes)));
    }

    #[test]
    fn test_non_bytes_kind_uses_packets_lane() {
        let pattern = DriverPattern::new(
            "ena",
            r"^queue_(\d+)_(rx|tx)_(cnt|bytes)$",
            CaptureRoles::groups(2, 3, 1),
        )
        .unwrap();
        assert_eq!(decode_name(&pattern, "queue_3_tx_cnt"), Some((3, Slot::TxPackets)));
        assert_eq!(decode_name(&pattern, "queue_3_rx_bytes"), Some((3, Slot::RxBytes)));
    }

    #[test]
    fn test_fixed_roles() {
        let pattern = DriverPattern::new(
            "fixed",
            r"^rx_queue(\d+)_bytes$",
            CaptureRoles {
                direction: RoleSource::Fixed(Direction::Rx),
                kind: RoleSource::Fixed(CounterKind::Bytes),
                queue: 1,
            },
        )
        .unwrap();
        assert_eq!(decode_name(&pattern, "rx_queue12_bytes"), Some((12, Slot::RxBytes)));
    }

    #[test]
    fn test_prefixed_decoder() {
        assert_eq!(decode_prefixed("tx-2.tx_packets"), Some((2, Slot::TxPackets)));
        assert_eq!(decode_prefixed("rx-0.rx_bytes"), Some((0, Slot::RxBytes)));
        assert_eq!(decode_prefixed("rx-0.rx_csum_bad"), None);
        assert_eq!(decode_prefixed("rx-2x.rx_bytes"), None);
        assert_eq!(decode_prefixed("rx-1.bytes"), None);
        assert_eq!(decode_prefixed("rx-1"), None);
        assert_eq!(decode_prefixed("port.rx_bytes"), None);
    }

    #[test]
    fn test_prefixed_fallback_only_on_primary_miss() {
        let primary = DriverPattern::new(
            "iavf",
            r"^(rx|tx)-(\d+)\.(bytes|packets)$",
            CaptureRoles::groups(1, 3, 2),
        )
        .unwrap();
        assert_eq!(decode_name(&primary, "tx-1.tx_bytes"), None);

        let with_fallback = primary.with_fallback(Fallback::Prefixed);
        assert_eq!(decode_name(&with_fallback, "tx-1.bytes"), Some((1, Slot::TxBytes)));
        assert_eq!(decode_name(&with_fallback, "tx-1.tx_bytes"), Some((1, Slot::TxBytes)));
        assert_eq!(decode_name(&with_fallback, "link_down_events"), None);
    }

    #[test]
    fn test_null_pattern_matches_nothing() {
        let null = DriverPattern::null("unsupported");
        let names = ["rx-0.rx_packets", "tx-0.tx_bytes"];
        assert!(parse(&null, &names).is_empty());
    }

    #[test]
    fn test_parse_is_pure() {
        let names = vec!["rx-0.rx_packets".to_string(), "junk".to_string()];
        let before = names.clone();
        let pattern = sfc_pattern();

        let first = parse(&pattern, &names);
        let second = parse(&pattern, &names);
        assert_eq!(first, second);
        assert_eq!(names, before);
    }
}
