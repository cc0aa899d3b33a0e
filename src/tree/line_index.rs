//! Byte offset to line/column mapping

use super::Position;

/// Line start table over one buffer
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Index a buffer. Only `\n` starts a new line; a `\r\n` pair counts once.
    pub fn new(source: &[u8]) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Position of a byte offset (offsets past the end clamp to the end)
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        Position {
            line: line as u32 + 1,
            column: (offset - self.line_starts[line]) as u32,
        }
    }

    /// Number of lines in the buffer
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions() {
        let index = LineIndex::new(b"ab\ncd\n\nx");
        assert_eq!(index.position(0), Position { line: 1, column: 0 });
        assert_eq!(index.position(2), Position { line: 1, column: 2 });
        assert_eq!(index.position(3), Position { line: 2, column: 0 });
        assert_eq!(index.position(6), Position { line: 3, column: 0 });
        assert_eq!(index.position(7), Position { line: 4, column: 0 });
        assert_eq!(index.position(100), Position { line: 4, column: 1 });
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_empty_buffer() {
        let index = LineIndex::new(b"");
        assert_eq!(index.position(0), Position { line: 1, column: 0 });
    }
}
