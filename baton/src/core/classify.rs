//! Deterministic classification of a state snapshot.

use std::fmt;

/// How the current turn runs, decided from the persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// No usable prior state: run the simulation's bootstrap entry point.
    Fresh,
    /// Prior state present: feed it to the simulation on stdin.
    Continuing,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::Fresh => f.write_str("fresh"),
            RunKind::Continuing => f.write_str("continuing"),
        }
    }
}

/// Classify a snapshot of the persisted state into `Fresh` vs `Continuing`.
///
/// - `Fresh` if the snapshot is empty or all ASCII whitespace (a slot holding
///   a stray trailing newline is still uninitialized).
/// - `Continuing` as soon as any other byte is present. The content is
///   otherwise opaque and never inspected.
pub fn classify(snapshot: &[u8]) -> RunKind {
    if snapshot.iter().all(u8::is_ascii_whitespace) {
        RunKind::Fresh
    } else {
        RunKind::Continuing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_empty_is_fresh() {
        assert_eq!(classify(b""), RunKind::Fresh);
    }

    #[test]
    fn classify_whitespace_only_is_fresh() {
        assert_eq!(classify(b" \t\r\n"), RunKind::Fresh);
    }

    #[test]
    fn classify_payload_is_continuing() {
        assert_eq!(classify(b"WORLD#0"), RunKind::Continuing);
    }

    #[test]
    fn classify_padded_payload_is_continuing() {
        assert_eq!(classify(b"\n  WORLD#0\n"), RunKind::Continuing);
    }

    #[test]
    fn classify_single_byte_is_continuing() {
        assert_eq!(classify(b"0"), RunKind::Continuing);
    }

    #[test]
    fn classify_non_utf8_payload_is_continuing() {
        assert_eq!(classify(&[0xff, 0x00, 0x9c]), RunKind::Continuing);
    }
}
