//! Playlist file codec: M3U in, M3U/PLS out.
//!
//! These formats interoperate with external players byte for byte, so the
//! writers build the text by hand instead of going through a serializer.

use crate::model::{file_label, Playable};

/// One parsed playlist line pair: the path, plus the `#EXTINF` label when
/// the file carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub path: String,
    pub label: Option<String>,
}

impl Playable for PlaylistEntry {
    fn path(&self) -> &str {
        &self.path
    }

    fn title(&self) -> String {
        match self.label.as_ref().filter(|label| !label.is_empty()) {
            Some(label) => label.clone(),
            None => file_label(&self.path),
        }
    }
}

/// Parse M3U text, plain or extended.
///
/// An optional `#EXTM3U` first line switches on extended mode, in which a
/// `#EXTINF:<duration>,<label>` line annotates the path line that follows
/// it. Bare path lines are accepted in both modes, blank lines are skipped,
/// and other `#` lines are comments.
///
/// The contract is all-or-nothing: any structural violation (malformed
/// `#EXTINF`, metadata with no following path, `#EXTINF` in a file that
/// never announced the extended header) returns `None` and discards every
/// entry parsed so far. `Some(vec![])` is a well-formed empty playlist,
/// distinct from a parse failure.
pub fn parse_m3u(input: &str) -> Option<Vec<PlaylistEntry>> {
    let mut lines = input.lines().map(str::trim).peekable();

    let extended = lines.peek() == Some(&"#EXTM3U");
    if extended {
        lines.next();
    }

    let mut entries = Vec::new();
    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }

        if let Some(metadata) = line.strip_prefix("#EXTINF:") {
            if !extended {
                return None;
            }
            let (duration, label) = metadata.split_once(',')?;
            duration.trim().parse::<i64>().ok()?;

            let mut path = None;
            for candidate in lines.by_ref() {
                if candidate.is_empty() {
                    continue;
                }
                if candidate.starts_with('#') {
                    // Another directive where the annotated path belongs.
                    return None;
                }
                path = Some(candidate);
                break;
            }
            entries.push(PlaylistEntry {
                path: path?.to_string(),
                label: Some(label.trim().to_string()),
            });
        } else if line.starts_with('#') {
            continue;
        } else {
            entries.push(PlaylistEntry {
                path: line.to_string(),
                label: None,
            });
        }
    }

    Some(entries)
}

/// Serialize playables as extended M3U (LF endings). An empty input yields
/// `None` rather than a header-only file, so "nothing to save" stays
/// distinguishable from a real write.
pub fn write_m3u(items: &[&dyn Playable]) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let mut out = String::from("#EXTM3U\n");
    for item in items {
        let duration = item.duration_secs().unwrap_or(-1);
        out.push_str(&format!("#EXTINF:{duration},{}\n", item.title()));
        out.push_str(item.path());
        out.push('\n');
    }
    Some(out)
}

/// Serialize playables in the PLS layout external players expect, CRLF
/// endings, entries 1-indexed. Same empty-input contract as [`write_m3u`].
pub fn write_pls(items: &[&dyn Playable]) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let mut out = String::from("[playlist]\r\n");
    out.push_str(&format!("NumberOfEntries={}\r\n", items.len()));
    for (index, item) in items.iter().enumerate() {
        let number = index + 1;
        out.push_str(&format!("File{number}={}\r\n", item.path()));
        out.push_str(&format!("Title{number}={}\r\n", item.title()));
    }
    out.push_str("Version=2\r\n");
    Some(out)
}
