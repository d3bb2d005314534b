//! Line-oriented log reading for both one-shot passes and followed files.
//!
//! Input is consumed as a byte stream, one line at a time, and every line
//! goes through a lossy decode step so a stray invalid byte never aborts a
//! pass.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::types::DecodeMode;

/// Buffer size for reading log files (8KB).
const BUFFER_SIZE: usize = 8 * 1024;

/// Where log lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    Stdin,
    File(PathBuf),
}

impl LogSource {
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => LogSource::File(path),
            None => LogSource::Stdin,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            LogSource::Stdin => "<stdin>".to_string(),
            LogSource::File(path) => path.display().to_string(),
        }
    }
}

/// Streaming log reader with lossy line decoding.
pub struct LogLoader {
    reader: Box<dyn BufRead>,
    decode: DecodeMode,
    line_buffer: Vec<u8>,
    lines_read: usize,
    eof_reached: bool,
}

impl LogLoader {
    /// Open a log source.
    ///
    /// # Parameters
    ///
    /// * `source` - File path or stdin
    /// * `decode` - How invalid UTF-8 is recovered
    ///
    /// # Returns
    ///
    /// `Ok(LogLoader)` if the source opens successfully, `Err` otherwise.
    pub fn open(source: &LogSource, decode: DecodeMode) -> Result<Self, io::Error> {
        let reader: Box<dyn BufRead> = match source {
            LogSource::Stdin => Box::new(BufReader::with_capacity(BUFFER_SIZE, io::stdin())),
            LogSource::File(path) => Box::new(BufReader::with_capacity(BUFFER_SIZE, File::open(path)?)),
        };
        Ok(Self::from_reader(reader, decode))
    }

    /// Wrap any buffered reader.
    pub fn from_reader(reader: Box<dyn BufRead>, decode: DecodeMode) -> Self {
        Self {
            reader,
            decode,
            line_buffer: Vec::with_capacity(512),
            lines_read: 0,
            eof_reached: false,
        }
    }

    /// Read the next decoded line, without its terminator.
    ///
    /// Empty lines are returned as empty strings. A read error is logged and
    /// treated as end of input.
    pub fn next_line(&mut self) -> Option<String> {
        if self.eof_reached {
            return None;
        }
        self.line_buffer.clear();

        match self.reader.read_until(b'\n', &mut self.line_buffer) {
            Ok(0) => {
                self.eof_reached = true;
                None
            }
            Ok(_) => {
                let mut bytes = self.line_buffer.as_slice();
                if let Some(stripped) = bytes.strip_suffix(b"\n") {
                    bytes = stripped;
                }
                if let Some(stripped) = bytes.strip_suffix(b"\r") {
                    bytes = stripped;
                }
                self.lines_read += 1;
                Some(decode_line(bytes, self.decode))
            }
            Err(e) => {
                log::warn!("Error reading log input after {} lines: {}", self.lines_read, e);
                self.eof_reached = true;
                None
            }
        }
    }

    /// Number of lines returned so far.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    pub fn is_eof(&self) -> bool {
        self.eof_reached
    }
}

impl Iterator for LogLoader {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_line()
    }
}

/// Decode one line of raw bytes, recovering from invalid UTF-8.
pub fn decode_line(bytes: &[u8], mode: DecodeMode) -> String {
    let mut line = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        line.push_str(chunk.valid());
        if !chunk.invalid().is_empty() && mode == DecodeMode::Replace {
            line.push(char::REPLACEMENT_CHARACTER);
        }
    }
    line
}

/// Cheap change detector for a followed log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    /// Stat the file; `None` if it cannot be read right now.
    pub fn probe(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn loader(bytes: &[u8], decode: DecodeMode) -> LogLoader {
        LogLoader::from_reader(Box::new(Cursor::new(bytes.to_vec())), decode)
    }

    #[test]
    fn test_decode_modes() {
        let bytes = b"fm A\xff\xfe to B";
        assert_eq!(decode_line(bytes, DecodeMode::Strip), "fm A to B");
        assert_eq!(decode_line(bytes, DecodeMode::Replace), "fm A\u{fffd}\u{fffd} to B");
        assert_eq!(decode_line("ÄÖ".as_bytes(), DecodeMode::Strip), "ÄÖ");
    }

    #[test]
    fn test_reads_lines_without_terminators() {
        let lines: Vec<String> = loader(b"one\r\ntwo\n\nthree", DecodeMode::Strip).collect();
        assert_eq!(lines, vec!["one", "two", "", "three"]);
    }

    #[test]
    fn test_bad_bytes_do_not_end_the_pass() {
        let mut loader = loader(b"fm A to B\n\x80\x81\nfm C to D\n", DecodeMode::Strip);
        assert_eq!(loader.next_line().as_deref(), Some("fm A to B"));
        assert_eq!(loader.next_line().as_deref(), Some(""));
        assert_eq!(loader.next_line().as_deref(), Some("fm C to D"));
        assert_eq!(loader.next_line(), None);
        assert!(loader.is_eof());
        assert_eq!(loader.lines_read(), 3);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let source = LogSource::File(PathBuf::from("/nonexistent/listen.log"));
        assert!(LogLoader::open(&source, DecodeMode::Strip).is_err());
    }

    #[test]
    fn test_open_file_and_stamp() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fm A to B").unwrap();
        file.flush().unwrap();

        let source = LogSource::File(file.path().to_path_buf());
        let lines: Vec<String> = LogLoader::open(&source, DecodeMode::Strip).unwrap().collect();
        assert_eq!(lines, vec!["fm A to B"]);

        let before = FileStamp::probe(file.path()).unwrap();
        writeln!(file, "fm C to D").unwrap();
        file.flush().unwrap();
        let after = FileStamp::probe(file.path()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_source_description() {
        assert_eq!(LogSource::from_arg(None), LogSource::Stdin);
        assert_eq!(LogSource::Stdin.describe(), "<stdin>");
        assert_eq!(LogSource::from_arg(Some(PathBuf::from("a.log"))).describe(), "a.log");
    }
}
