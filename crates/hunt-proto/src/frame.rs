// ABOUTME: Response framing - zero or more payload lines followed by an EOT marker line
// ABOUTME: Payload lines that would collide with the marker are space-escaped

/// End-of-response marker (EOT) as a full line, without the trailing newline.
pub const MARKER_LINE: &str = "\u{0004}";

/// Encode a response payload as wire lines: each payload line escaped,
/// then the marker line. Every line carries a trailing `\n`.
///
/// An empty payload still produces the marker line, so "no output" is a
/// valid, observable response.
pub fn encode_frame(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len() + 8);
    if !payload.is_empty() {
        for line in payload.split('\n') {
            out.push_str(&escape_line(line));
            out.push('\n');
        }
    }
    out.push_str(MARKER_LINE);
    out.push('\n');
    out
}

// A payload line that is the marker (or an already-escaped marker) gets one
// more leading space; unescaping strips exactly one. Anything else passes
// through untouched, so the escaping is fully reversible.
fn escape_line(line: &str) -> String {
    if is_escapable(line) {
        format!(" {line}")
    } else {
        line.to_string()
    }
}

fn unescape_line(line: &str) -> &str {
    if line.starts_with(' ') && is_escapable(&line[1..]) {
        &line[1..]
    } else {
        line
    }
}

fn is_escapable(line: &str) -> bool {
    line.trim_start_matches(' ') == MARKER_LINE
}

/// Incremental frame decoder. Feed it complete lines (newline already
/// stripped); it returns a finished payload whenever the marker arrives.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    lines: Vec<String>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one wire line. Returns `Some(payload)` when the line is the
    /// end-of-response marker, `None` while the frame is still open.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if line == MARKER_LINE {
            return Some(std::mem::take(&mut self.lines).join("\n"));
        }
        self.lines.push(unescape_line(line).to_string());
        None
    }

    /// True if a frame is partially assembled (payload lines seen, no marker yet).
    pub fn in_progress(&self) -> bool {
        !self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(payload: &str) -> String {
        let wire = encode_frame(payload);
        let mut asm = FrameAssembler::new();
        let mut done = None;
        for line in wire.lines() {
            if let Some(p) = asm.push_line(line) {
                done = Some(p);
                break;
            }
        }
        done.expect("frame should complete")
    }

    #[test]
    fn empty_payload_is_just_the_marker() {
        assert_eq!(encode_frame(""), "\u{0004}\n");
        assert_eq!(round_trip(""), "");
    }

    #[test]
    fn multi_line_payload_round_trips() {
        let payload = "Hunt: alpine (3 treasures)\nHunt: coastal (1 treasures)";
        assert_eq!(round_trip(payload), payload);
    }

    #[test]
    fn marker_lines_in_payload_are_escaped() {
        let payload = "before\n\u{0004}\n \u{0004}\nafter";
        let wire = encode_frame(payload);
        // Only the final line of the wire form is a bare marker.
        let marker_lines = wire.lines().filter(|l| *l == MARKER_LINE).count();
        assert_eq!(marker_lines, 1);
        assert_eq!(round_trip(payload), payload);
    }

    #[test]
    fn assembler_spans_multiple_frames() {
        let mut asm = FrameAssembler::new();
        assert_eq!(asm.push_line("first"), None);
        assert!(asm.in_progress());
        assert_eq!(asm.push_line(MARKER_LINE), Some("first".to_string()));

        // The same assembler starts fresh on the next frame.
        assert!(!asm.in_progress());
        assert_eq!(asm.push_line("second"), None);
        assert_eq!(asm.push_line(MARKER_LINE), Some("second".to_string()));
    }
}
