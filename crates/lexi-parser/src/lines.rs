const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Reassembles lines from arbitrarily split byte chunks.
///
/// The partial last line of every chunk stays in `leftover` as raw bytes until
/// its newline arrives, so splits inside a multi-byte character are harmless.
#[derive(Debug, Default)]
pub struct LineBuffer {
    leftover: Vec<u8>,
    bom_checked: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.leftover.extend_from_slice(chunk);
        self.strip_bom();

        let Some(last_newline) = self.leftover.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let complete: Vec<u8> = self.leftover.drain(..=last_newline).collect();
        complete[..complete.len() - 1]
            .split(|b| *b == b'\n')
            .map(decode_line)
            .collect()
    }

    /// Flush the final unterminated line, if any
    pub fn finish(&mut self) -> Option<String> {
        self.bom_checked = true;
        if self.leftover.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.leftover);
        let line = decode_line(&rest);
        (!line.trim().is_empty()).then_some(line)
    }

    fn strip_bom(&mut self) {
        if self.bom_checked {
            return;
        }
        if self.leftover.starts_with(UTF8_BOM) {
            self.leftover.drain(..UTF8_BOM.len());
            self.bom_checked = true;
        } else if !UTF8_BOM.starts_with(&self.leftover) {
            self.bom_checked = true;
        }
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
