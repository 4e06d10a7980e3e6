// crates/cfdot-cli/src/output.rs - Newline-delimited JSON on stdout
//
// One value per line. The writer sits behind a mutex so concurrent producers
// never interleave partial lines.

use std::io::{self, Write};
use std::sync::Mutex;

use serde::Serialize;
use tracing::error;

pub struct JsonWriter<W: Write> {
    out: Mutex<W>,
}

impl JsonWriter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Write one line; a value that cannot be encoded is logged and skipped
    pub fn emit<T: Serialize + ?Sized>(&self, value: &T) -> io::Result<()> {
        let mut line = match serde_json::to_vec(value) {
            Ok(line) => line,
            Err(err) => {
                error!(error = %err, "failed to encode record");
                return Ok(());
            }
        };
        line.push(b'\n');

        let mut out = self
            .out
            .lock()
            .map_err(|_| io::Error::other("output writer poisoned"))?;
        out.write_all(&line)?;
        out.flush()
    }

    pub fn emit_all<'a, T, I>(&self, values: I) -> io::Result<()>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        values.into_iter().try_for_each(|value| self.emit(value))
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Capture buffer for command tests
#[cfg(test)]
pub fn buffer() -> JsonWriter<Vec<u8>> {
    JsonWriter::new(Vec::new())
}

#[cfg(test)]
pub fn lines(writer: JsonWriter<Vec<u8>>) -> Vec<serde_json::Value> {
    String::from_utf8(writer.into_inner())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
