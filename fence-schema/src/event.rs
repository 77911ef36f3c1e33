//! Decoded file-open event.

use serde::{Deserialize, Serialize};

/// Size of the kernel `comm` buffer, including the terminating NUL.
pub const COMM_LEN: usize = 16;

/// Size of the captured filename buffer, including the terminating NUL.
pub const PATH_LEN: usize = 256;

/// Process identity as reported by the kernel (tgid).
pub type ActorId = u32;

/// One observed open attempt.
///
/// `uid` and `flags` are carried for display and journaling only; the
/// decision engine never looks at them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub pid: ActorId,
    pub uid: u32,
    pub comm: String,
    pub path: String,
    #[serde(default)]
    pub flags: i32,
}

impl Event {
    /// Build an event from string fields, applying the same bounds the
    /// capture program does: cut at the first NUL and at the buffer size.
    pub fn new(pid: ActorId, uid: u32, comm: &str, path: &str) -> Self {
        Self {
            pid,
            uid,
            comm: bounded(comm, COMM_LEN),
            path: bounded(path, PATH_LEN),
            flags: 0,
        }
    }

    /// Set the open flags.
    pub fn with_flags(mut self, flags: i32) -> Self {
        self.flags = flags;
        self
    }

    /// Build an event from the fixed-width buffers of a raw record.
    pub fn from_raw_parts(
        pid: ActorId,
        uid: u32,
        comm: &[u8],
        path: &[u8],
        flags: i32,
    ) -> Self {
        Self {
            pid,
            uid,
            comm: trim_nul(&comm[..comm.len().min(COMM_LEN)]),
            path: trim_nul(&path[..path.len().min(PATH_LEN)]),
            flags,
        }
    }
}

/// Decode a C string buffer: everything before the first NUL, lossily
/// converted to UTF-8.
pub fn trim_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn bounded(s: &str, max: usize) -> String {
    let s = s.split('\0').next().unwrap_or_default();
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_new_keeps_short_fields() {
        let e = Event::new(1234, 1000, "cat", "/etc/passwd");
        assert_eq!(e.pid, 1234);
        assert_eq!(e.uid, 1000);
        assert_eq!(e.comm, "cat");
        assert_eq!(e.path, "/etc/passwd");
        assert_eq!(e.flags, 0);
    }

    #[test]
    fn test_event_new_cuts_at_nul() {
        let e = Event::new(1, 0, "cat\0garbage", "/etc/passwd\0\0\0");
        assert_eq!(e.comm, "cat");
        assert_eq!(e.path, "/etc/passwd");
    }

    #[test]
    fn test_event_new_bounds_comm() {
        let e = Event::new(1, 0, "a-very-long-process-name", "/x");
        assert_eq!(e.comm.len(), COMM_LEN);
        assert_eq!(e.comm, "a-very-long-proc");
    }

    #[test]
    fn test_event_new_bounds_path() {
        let long = format!("/{}", "d".repeat(400));
        let e = Event::new(1, 0, "sh", &long);
        assert_eq!(e.path.len(), PATH_LEN);
    }

    #[test]
    fn test_event_new_bounds_on_char_boundary() {
        // 15 ASCII bytes followed by a two-byte char straddling the limit
        let comm = format!("{}é", "x".repeat(15));
        let e = Event::new(1, 0, &comm, "/x");
        assert_eq!(e.comm, "x".repeat(15));
    }

    #[test]
    fn test_with_flags() {
        let e = Event::new(1, 0, "sh", "/x").with_flags(0o100);
        assert_eq!(e.flags, 0o100);
    }

    #[test]
    fn test_trim_nul() {
        assert_eq!(trim_nul(b"bash\0\0\0\0"), "bash");
        assert_eq!(trim_nul(b"\0bash"), "");
        assert_eq!(trim_nul(b"no-terminator"), "no-terminator");
        assert_eq!(trim_nul(b""), "");
    }

    #[test]
    fn test_trim_nul_invalid_utf8_is_lossy() {
        assert_eq!(trim_nul(&[b'a', 0xff, b'b', 0]), "a\u{fffd}b");
    }

    #[test]
    fn test_from_raw_parts() {
        let mut comm = [0u8; COMM_LEN];
        comm[..4].copy_from_slice(b"less");
        let mut path = [0u8; PATH_LEN];
        path[..11].copy_from_slice(b"/etc/shadow");

        let e = Event::from_raw_parts(42, 7, &comm, &path, -1);
        assert_eq!(e.pid, 42);
        assert_eq!(e.uid, 7);
        assert_eq!(e.comm, "less");
        assert_eq!(e.path, "/etc/shadow");
        assert_eq!(e.flags, -1);
    }

    #[test]
    fn test_event_json_flags_default() {
        let json = r#"{"pid":5,"uid":0,"comm":"cat","path":"/etc/passwd"}"#;
        let e: Event = serde_json::from_str(json).expect("parse");
        assert_eq!(e, Event::new(5, 0, "cat", "/etc/passwd"));
    }
}
