use crate::error::ImportError;
use crate::models::EntityRecord;

/// Dumps are one big JSON array with one entity per line, so every record
/// line but the last ends in a comma.
const LIST_SEPARATOR: u8 = b',';

/// Trims whitespace and strips at most one trailing list separator.
pub fn strip_line(line: &[u8]) -> &[u8] {
    let trimmed = line.trim_ascii();
    trimmed.strip_suffix(&[LIST_SEPARATOR]).unwrap_or(trimmed)
}

/// True for lines that carry no record: blank lines and the `[` / `]` that
/// open and close the array. Expects the output of [`strip_line`].
pub fn is_framing_line(stripped: &[u8]) -> bool {
    stripped.len() <= 1
}

/// Decodes one raw line. `Ok(None)` means a framing line; `Err` means the
/// line is not a well-formed entity and should be skipped.
pub fn decode_line(line: &[u8]) -> Result<Option<EntityRecord>, ImportError> {
    let stripped = strip_line(line);
    if is_framing_line(stripped) {
        return Ok(None);
    }
    let record = serde_json::from_slice(stripped)?;
    Ok(Some(record))
}
