use anyhow::Result;
use copyfile::read_chunk;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Read};

/// Bytes requested from the input per read.
const READ_CHUNK: usize = 1024;

/// Anything the shell loop can pull input lines from.
pub trait LineSource {
    /// Returns the next line without its terminator, or `None` once the input
    /// is exhausted. `prompt` is shown by sources attached to a terminal.
    fn next_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Newline-delimited reader over a raw byte stream.
///
/// Reads in small chunks and keeps whatever follows the first newline for
/// the next call.
pub struct LineReader<R> {
    reader: R,
    pending: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::new(),
        }
    }

    /// Reads the next line. A line made only of whitespace comes back as an
    /// empty string; a final line without a newline is still returned.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(pos) = self.pending.iter().position(|&byte| byte == b'\n') {
                let rest = self.pending.split_off(pos + 1);
                let mut line = std::mem::replace(&mut self.pending, rest);
                line.truncate(pos);
                return Ok(Some(into_line(&line)));
            }

            let chunk = read_chunk(&mut self.reader, READ_CHUNK)?;
            if chunk.is_empty() {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.pending);
                return Ok(Some(into_line(&line)));
            }
            self.pending.extend_from_slice(&chunk);
        }
    }
}

impl<R: Read> LineSource for LineReader<R> {
    fn next_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.read_line()?)
    }
}

fn into_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    if line.trim().is_empty() {
        String::new()
    } else {
        line.into_owned()
    }
}

/// Line editing with history for interactive terminals.
pub struct Terminal {
    editor: DefaultEditor,
}

impl Terminal {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for Terminal {
    fn next_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out the input in fixed-size pieces to exercise buffering.
    struct Dribble {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Dribble {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let end = (self.pos + self.step).min(self.data.len());
            let n = (end - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }
    }

    fn reader(input: &str) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(input.as_bytes().to_vec()))
    }

    #[test]
    fn test_reads_lines_in_order() {
        let mut lines = reader("echo one\necho two\n");
        assert_eq!(lines.read_line().unwrap().as_deref(), Some("echo one"));
        assert_eq!(lines.read_line().unwrap().as_deref(), Some("echo two"));
        assert_eq!(lines.read_line().unwrap(), None);
    }

    #[test]
    fn test_returns_partial_last_line() {
        let mut lines = reader("first\nno newline");
        assert_eq!(lines.read_line().unwrap().as_deref(), Some("first"));
        assert_eq!(lines.read_line().unwrap().as_deref(), Some("no newline"));
        assert_eq!(lines.read_line().unwrap(), None);
    }

    #[test]
    fn test_whitespace_only_line_is_empty() {
        let mut lines = reader("   \n\t \nx\n\n");
        assert_eq!(lines.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(lines.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(lines.read_line().unwrap().as_deref(), Some("x"));
        assert_eq!(lines.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(lines.read_line().unwrap(), None);
    }

    #[test]
    fn test_lines_split_across_reads() {
        let mut lines = LineReader::new(Dribble {
            data: b"cd /tmp\necho done\n".to_vec(),
            pos: 0,
            step: 3,
        });
        assert_eq!(lines.read_line().unwrap().as_deref(), Some("cd /tmp"));
        assert_eq!(lines.read_line().unwrap().as_deref(), Some("echo done"));
        assert_eq!(lines.read_line().unwrap(), None);
    }

    #[test]
    fn test_line_longer_than_one_chunk() {
        let long = "x".repeat(READ_CHUNK * 3 + 17);
        let mut lines = reader(&format!("{long}\nnext\n"));
        assert_eq!(lines.read_line().unwrap(), Some(long));
        assert_eq!(lines.read_line().unwrap().as_deref(), Some("next"));
    }

    #[test]
    fn test_read_error_is_reported() {
        let mut lines = LineReader::new(Broken);
        assert!(lines.read_line().is_err());
    }
}
