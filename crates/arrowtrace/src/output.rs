//! OTLP JSON output

use crate::domain::TracesDocument;
use crate::error::Result;
use std::io::Write;

/// Writes the export tree as JSON, two-space indented when `pretty`
pub fn write_otlp_json<W: Write>(document: &TracesDocument, mut writer: W, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, document)?;
    } else {
        serde_json::to_writer(&mut writer, document)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_otlp_json_string(document: &TracesDocument, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    Ok(json)
}
