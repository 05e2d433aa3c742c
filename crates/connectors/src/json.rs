use serde::Serialize;
use std::io::Write;

/// Serializes `value` as a single line terminated by `\n`.
///
/// Raw document bodies are copied verbatim and may have been stored
/// pretty-printed. Line breaks can only appear as whitespace between JSON
/// tokens (they must be escaped inside strings), so dropping them keeps the
/// document intact while guaranteeing one record per line.
pub fn write_json_line<W, T>(out: &mut W, value: &T) -> Result<(), serde_json::Error>
where
    W: Write,
    T: Serialize + ?Sized,
{
    let mut line = serde_json::to_vec(value)?;
    line.retain(|b| *b != b'\n' && *b != b'\r');
    line.push(b'\n');
    out.write_all(&line).map_err(serde_json::Error::io)
}
