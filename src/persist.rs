//! Line-oriented file persistence and diagnostic dumps for `HashTable`.
//!
//! The file format is one pair per line: the key as the first whitespace-delimited token, a
//! single space, then the value running to the end of the line. Keys are rendered with `Display`
//! and read back with `FromStr`. A key must render non-empty and without whitespace; a value must
//! render non-empty, without line breaks and without leading or trailing whitespace. Writing a
//! table holding any other pair fails with [`Error::Unrepresentable`].

use std::{
    fmt::Display,
    fs::File,
    hash::{BuildHasher, Hash},
    io::{self, Read, Write},
    path::Path,
    str::FromStr,
};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::{
    HashTable,
    error::{Error, Result},
};

/// Outcome of a successful [`HashTable::try_load`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Pairs added to the table
    pub inserted: usize,
    /// Well-formed lines whose key was already present; the stored value was kept
    pub duplicates: usize,
    /// Non-blank lines that were skipped because they could not be parsed
    pub malformed: usize,
}

/// Splits a line into its key and value text, or `None` if either part is missing
fn split_record(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.trim().split_once(char::is_whitespace)?;
    let value = value.trim();
    (!value.is_empty()).then_some((key, value))
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash + FromStr,
    V: FromStr,
    S: BuildHasher,
{
    /// Reads pairs from `path` and inserts each one.
    ///
    /// The whole file is read before anything is inserted, so an open or read failure leaves the
    /// table unchanged. Blank lines are ignored. Lines that lack a value or whose key or value do
    /// not parse are skipped with a warning and counted in [`LoadSummary::malformed`]; they do not
    /// fail the load. Keys that are already present keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the file cannot be opened and [`Error::Read`] if it cannot be read
    /// as UTF-8 text.
    pub fn try_load<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadSummary> {
        let path = path.as_ref();
        let contents = read_text(path)?;

        let mut summary = LoadSummary::default();
        for (number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let parsed = split_record(line).and_then(|(key, value)| {
                Some((key.parse::<K>().ok()?, value.parse::<V>().ok()?))
            });
            let Some(pair) = parsed else {
                warn!(
                    "{}:{}: skipping malformed line {line:?}",
                    path.display(),
                    number.saturating_add(1)
                );
                summary.malformed = summary.malformed.saturating_add(1);
                continue;
            };

            if self.insert(pair) {
                summary.inserted = summary.inserted.saturating_add(1);
            } else {
                summary.duplicates = summary.duplicates.saturating_add(1);
            }
        }

        debug!(
            "loaded {}: {} inserted, {} duplicate, {} malformed",
            path.display(),
            summary.inserted,
            summary.duplicates,
            summary.malformed
        );
        Ok(summary)
    }

    /// Reads pairs from `path` into the table.
    ///
    /// Returns `false` if the file could not be opened or read, in which case nothing was
    /// inserted. See [`try_load`](Self::try_load) for how individual lines are handled.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> bool {
        match self.try_load(path) {
            Ok(_) => true,
            Err(err) => {
                warn!("{err}");
                false
            }
        }
    }
}

/// Returns why a rendered key cannot be written, if it cannot
fn key_violation(key: &str) -> Option<&'static str> {
    if key.is_empty() {
        Some("key is empty")
    } else if key.contains(char::is_whitespace) {
        Some("key contains whitespace")
    } else {
        None
    }
}

/// Returns why a rendered value cannot be written, if it cannot
fn value_violation(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        Some("value is empty")
    } else if value.contains(['\n', '\r']) {
        Some("value contains a line break")
    } else if value.trim() != value {
        Some("value has leading or trailing whitespace")
    } else {
        None
    }
}

/// Reads a whole file as text, telling open failures apart from read failures
fn read_text(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).map_err(|source| Error::Open { path: path.to_path_buf(), source })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
    Ok(contents)
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Display,
    V: Display,
{
    /// Writes every pair to `path`, one `key value` line per pair, replacing any existing file.
    ///
    /// Pairs are written in iteration order. Every pair is rendered and checked against the line
    /// format before anything touches the disk; the text then goes to a temporary file in the
    /// same directory that is renamed over `path`, so a failed write never leaves a partial file.
    /// Returns the number of pairs written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unrepresentable`] if a key or value cannot be written in the line format,
    /// [`Error::Create`] if the temporary file cannot be created and [`Error::Write`] if writing
    /// it or moving it into place fails.
    pub fn try_write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let (text, written) = self.render_pairs(path)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_error = |source: io::Error| Error::Write { path: path.to_path_buf(), source };

        let mut file = NamedTempFile::new_in(dir)
            .map_err(|source| Error::Create { path: path.to_path_buf(), source })?;
        file.write_all(text.as_bytes()).map_err(write_error)?;
        file.flush().map_err(write_error)?;
        file.persist(path).map_err(|err| write_error(err.error))?;

        debug!("wrote {written} entries to {}", path.display());
        Ok(written)
    }

    /// Writes every pair to `path`. Returns `false` if a pair cannot be represented in the file
    /// format or the file could not be created or written.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> bool {
        match self.try_write_to_file(path) {
            Ok(_) => true,
            Err(err) => {
                warn!("{err}");
                false
            }
        }
    }

    /// Renders one `key value` line per pair, returning the text and the number of pairs
    fn render_pairs(&self, path: &Path) -> Result<(String, usize)> {
        let mut text = String::new();
        let mut written: usize = 0;
        for (key, value) in self {
            let line = written.saturating_add(1);
            let key = key.to_string();
            let value = value.to_string();
            if let Some(reason) = key_violation(&key).or_else(|| value_violation(&value)) {
                return Err(Error::Unrepresentable { path: path.to_path_buf(), line, reason });
            }

            text.push_str(&key);
            text.push(' ');
            text.push_str(&value);
            text.push('\n');
            written = line;
        }
        Ok((text, written))
    }

    /// Writes a listing of every bucket and its chain to `out`.
    ///
    /// Each line holds the bucket index followed by the chain in insertion order, for example
    /// `[   3] 14 => b -> 25 => c`. Meant for humans, not for parsing.
    ///
    /// # Errors
    ///
    /// Returns any error reported by `out`.
    pub fn dump_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let width = self.capacity().to_string().len();
        for (index, chain) in self.chains() {
            write!(out, "[{index:>width$}]")?;
            for (position, (key, value)) in chain.iter().enumerate() {
                let separator = if position == 0 { " " } else { " -> " };
                write!(out, "{separator}{key} => {value}")?;
            }
            writeln!(out)?;
        }
        writeln!(out, "{} entries in {} buckets", self.len(), self.capacity())
    }

    /// Prints the bucket listing of [`dump_to`](Self::dump_to) to standard error.
    pub fn dump(&self) {
        let stderr = io::stderr();
        if let Err(err) = self.dump_to(&mut stderr.lock()) {
            warn!("failed to dump hash table: {err}");
        }
    }
}
