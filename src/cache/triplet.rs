//! Line-oriented triplet I/O

use crate::error::{CacheError, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines, Write};
use std::path::Path;

/// One stored entry: three consecutive lines of the cache file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triplet {
    /// Source filename
    pub filename: String,
    /// Modification time recorded for the file
    pub mtime: i64,
    /// Serialized entry
    pub blob: String,
}

/// Streaming reader yielding triplets from a cache file
pub(crate) struct TripletReader<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> TripletReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Option<Result<String>> {
        let line = self.lines.next()?;
        self.line_no += 1;
        Some(line.map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => CacheError::MalformedTriplet {
                line: self.line_no,
                reason: "not valid UTF-8".to_string(),
            },
            _ => CacheError::Io(e),
        }))
    }

    fn required_line(&mut self, what: &str) -> Result<String> {
        match self.next_line() {
            Some(line) => line,
            None => Err(CacheError::MalformedTriplet {
                line: self.line_no + 1,
                reason: format!("missing {} line", what),
            }),
        }
    }

    fn read_triplet(&mut self, filename: String) -> Result<Triplet> {
        let mtime_line = self.required_line("mtime")?;
        let mtime_line_no = self.line_no;
        let blob = self.required_line("blob")?;

        let mtime = mtime_line
            .trim()
            .parse::<i64>()
            .map_err(|_| CacheError::MalformedTriplet {
                line: mtime_line_no,
                reason: format!("mtime {:?} is not an integer", mtime_line),
            })?;

        Ok(Triplet {
            filename,
            mtime,
            blob,
        })
    }
}

impl<R: BufRead> Iterator for TripletReader<R> {
    type Item = Result<Triplet>;

    fn next(&mut self) -> Option<Self::Item> {
        let filename = match self.next_line()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };
        Some(self.read_triplet(filename))
    }
}

/// Open a cache file for scanning; `None` when it does not exist
pub(crate) fn open_triplets(path: &Path) -> Result<Option<TripletReader<BufReader<File>>>> {
    match File::open(path) {
        Ok(file) => Ok(Some(TripletReader::new(BufReader::new(file)))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read every triplet of a cache file; empty when the file does not exist
pub fn read_triplets(path: &Path) -> Result<Vec<Triplet>> {
    match open_triplets(path)? {
        Some(reader) => reader.collect(),
        None => Ok(Vec::new()),
    }
}

/// Write triplets in order, three lines each
pub(crate) fn write_triplets<'a, W, I>(writer: &mut W, triplets: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Triplet>,
{
    for triplet in triplets {
        writeln!(writer, "{}", triplet.filename)?;
        writeln!(writer, "{}", triplet.mtime)?;
        writeln!(writer, "{}", triplet.blob)?;
    }
    Ok(())
}
