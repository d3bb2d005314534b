//! Stateful scanner for station identification and beacon packets.
//!
//! An `ID` or `BEACON` header is followed by hex-dump lines, each carrying
//! a 4-digit hex offset:
//!
//! ```text
//! 12:34:56.120 ax0: fm KA1ABC to ID ctl UI^ pid=F0(Text) len 22
//! 0000  KA1ABC/R KA1ABC-1/B
//! 0010  KA1ABC-4/N
//! ```
//!
//! The scanner stitches the trailing content of those lines into one
//! payload string. The first line that is not a payload line closes the
//! packet and is itself examined for a new header.

use serde::{Deserialize, Serialize};

use crate::analyzer::log_parser::{fm_headers, is_boundary, keyword_at, normalize_callsign, skip_whitespace, take_token};

/// Timestamp recorded when a header line carries none.
pub const UNKNOWN_TIMESTAMP: &str = "unknown";

/// Kind of identification packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PacketType {
    Id,
    Beacon,
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketType::Id => write!(f, "ID"),
            PacketType::Beacon => write!(f, "BEACON"),
        }
    }
}

/// A fully stitched identification packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedPacket {
    pub callsign: String,
    pub packet_type: PacketType,
    pub timestamp: String,
    pub payload: String,
}

/// Header seen, payload lines still being collected.
#[derive(Debug)]
struct PendingPacket {
    callsign: String,
    packet_type: PacketType,
    timestamp: String,
    fragments: Vec<String>,
}

impl PendingPacket {
    fn finish(self) -> ScannedPacket {
        ScannedPacket {
            callsign: self.callsign,
            packet_type: self.packet_type,
            timestamp: self.timestamp,
            payload: self.fragments.join(" "),
        }
    }
}

/// Line-at-a-time identification packet scanner.
#[derive(Debug, Default)]
pub struct RecordScanner {
    keep_ssid: bool,
    pending: Option<PendingPacket>,
}

impl RecordScanner {
    pub fn new(keep_ssid: bool) -> Self {
        Self {
            keep_ssid,
            pending: None,
        }
    }

    /// Handle a single decoded log line.
    ///
    /// Returns a completed packet when this line closes the payload of the
    /// previous header.
    pub fn handle_line(&mut self, line: &str) -> Option<ScannedPacket> {
        if let Some(pending) = self.pending.as_mut() {
            if let Some(fragment) = parse_payload_line(line) {
                pending.fragments.push(fragment.to_string());
                return None;
            }
        }

        let finished = self.pending.take().map(PendingPacket::finish);
        if let Some((callsign, packet_type)) = parse_header(line, self.keep_ssid) {
            self.pending = Some(PendingPacket {
                callsign,
                packet_type,
                timestamp: find_timestamp(line).unwrap_or(UNKNOWN_TIMESTAMP).to_string(),
                fragments: Vec::new(),
            });
        }
        finished
    }

    /// Flush a packet still collecting payload at end of input.
    pub fn finish(&mut self) -> Option<ScannedPacket> {
        self.pending.take().map(PendingPacket::finish)
    }
}

/// Scan a complete sequence of lines.
pub fn scan_records<I, S>(lines: I, keep_ssid: bool) -> Vec<ScannedPacket>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanner = RecordScanner::new(keep_ssid);
    let mut packets: Vec<ScannedPacket> = lines
        .into_iter()
        .filter_map(|line| scanner.handle_line(line.as_ref()))
        .collect();
    packets.extend(scanner.finish());
    packets
}

/// Match `fm <CALL> to ID` or `fm <CALL> to BEACON`.
fn parse_header(line: &str, keep_ssid: bool) -> Option<(String, PacketType)> {
    fm_headers(line).find_map(|(source, destination)| {
        let packet_type = if keyword_at(destination, 0, "id") && is_boundary(destination, 2) {
            PacketType::Id
        } else if keyword_at(destination, 0, "beacon") && is_boundary(destination, 6) {
            PacketType::Beacon
        } else {
            return None;
        };

        let callsign = normalize_callsign(source, keep_ssid);
        if callsign.is_empty() {
            None
        } else {
            Some((callsign.to_string(), packet_type))
        }
    })
}

/// Return the trailing content of a hex-dump line.
///
/// The offset token is 4 hex digits, optionally followed by `:`, anywhere
/// on the line, so timestamp and port prefixes are allowed. The first such
/// token with non-empty content after it wins. Header lines never qualify.
fn parse_payload_line(line: &str) -> Option<&str> {
    if fm_headers(line).next().is_some() {
        return None;
    }

    let mut idx = skip_whitespace(line, 0);
    while let Some((token, end)) = take_token(line, idx) {
        let offset = token.strip_suffix(':').unwrap_or(token);
        if offset.len() == 4 && offset.bytes().all(|b| b.is_ascii_hexdigit()) {
            let rest = line[end..].trim();
            if !rest.is_empty() {
                return Some(rest);
            }
        }
        idx = skip_whitespace(line, end);
    }
    None
}

/// Find the first `HH:MM:SS` with optional fractional seconds.
fn find_timestamp(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    (0..bytes.len()).find_map(|start| {
        let window = bytes.get(start..start + 8)?;
        let shaped = window
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 2 || i == 5 { *b == b':' } else { b.is_ascii_digit() });
        if !shaped {
            return None;
        }

        let mut end = start + 8;
        if bytes.get(end) == Some(&b'.') {
            let digits = bytes[end + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > 0 {
                end += 1 + digits;
            }
        }
        Some(&line[start..end])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stitches_payload() {
        let packets = scan_records(
            [
                "12:34:56 ax0: fm KA1ABC to ID ctl UI^ len 10",
                "0000 HELLO",
                "0010 WORLD",
                "12:35:00 ax0: fm N0CALL to APRS ctl UI^",
            ],
            false,
        );

        assert_eq!(
            packets,
            vec![ScannedPacket {
                callsign: "KA1ABC".to_string(),
                packet_type: PacketType::Id,
                timestamp: "12:34:56".to_string(),
                payload: "HELLO WORLD".to_string(),
            }]
        );
    }

    #[test]
    fn test_flushes_at_end_of_input() {
        let packets = scan_records(["fm W1AW-2 to beacon", "0000: de W1AW  "], false);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].callsign, "W1AW");
        assert_eq!(packets[0].packet_type, PacketType::Beacon);
        assert_eq!(packets[0].timestamp, UNKNOWN_TIMESTAMP);
        assert_eq!(packets[0].payload, "de W1AW");
    }

    #[test]
    fn test_back_to_back_headers() {
        let packets = scan_records(
            [
                "10:00:00 fm A to ID",
                "0000 first",
                "10:00:05 fm B to BEACON",
                "0000 second",
                "0010 part",
            ],
            false,
        );
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].payload, "first");
        assert_eq!(packets[1].callsign, "B");
        assert_eq!(packets[1].payload, "second part");
    }

    #[test]
    fn test_header_without_payload() {
        let packets = scan_records(["fm A to ID", "some other line", "0000 stray"], false);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].payload, "");
    }

    #[test]
    fn test_header_matching() {
        assert_eq!(parse_header("FM KA1ABC-3 TO Id", true), Some(("KA1ABC-3".to_string(), PacketType::Id)));
        assert_eq!(parse_header("fm A to IDENT", false), None);
        assert_eq!(parse_header("fm A to APRS", false), None);
        assert_eq!(parse_header("fm A to APRS fm B to ID", false), Some(("B".to_string(), PacketType::Id)));
    }

    #[test]
    fn test_payload_lines() {
        assert_eq!(parse_payload_line("0000 HELLO"), Some("HELLO"));
        assert_eq!(parse_payload_line("  00a0:  4b 41  KA"), Some("4b 41  KA"));
        assert_eq!(parse_payload_line("gw listen: 0010 WORLD"), Some("WORLD"));
        assert_eq!(parse_payload_line("0000"), None);
        assert_eq!(parse_payload_line("Oct 19 booted"), None);
        assert_eq!(parse_payload_line("ax0 0000"), None);
        assert_eq!(parse_payload_line("12:00:00 fm A to B 0000 x"), None);
    }

    #[test]
    fn test_prefixed_dump_lines() {
        assert_eq!(parse_payload_line("12:34:57 0000 HELLO"), Some("HELLO"));
        assert_eq!(parse_payload_line("ax0 0010 WORLD"), Some("WORLD"));

        let packets = scan_records(
            ["12:34:56 fm KA1ABC to ID", "12:34:57 0000 HELLO", "ax0 0010 WORLD", "end"],
            false,
        );
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].payload, "HELLO WORLD");
        assert_eq!(packets[0].timestamp, "12:34:56");
    }

    #[test]
    fn test_find_timestamp() {
        assert_eq!(find_timestamp("at 12:34:56.789 fm"), Some("12:34:56.789"));
        assert_eq!(find_timestamp("12:34:56. fm"), Some("12:34:56"));
        assert_eq!(find_timestamp("1:2:3 fm"), None);
        assert_eq!(find_timestamp("Oct 19 08:00:01"), Some("08:00:01"));
    }
}
