use csv::{QuoteStyle, WriterBuilder};
use std::io;
use std::path::Path;
use tracing::info;

use crate::error::{ImportError, Result};
use crate::types::StudentCredential;

pub const CREDENTIAL_HEADER: [&str; 4] = ["student_id", "full_name", "username", "password"];

/// Serializes credentials in the same unquoted format the import parser reads,
/// so the file can be fed back through it with the columns in this order.
pub fn credentials_to_csv(credentials: &[StudentCredential]) -> Result<String> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(Vec::new());
    write_rows(&mut wtr, credentials)?;
    let bytes = wtr.into_inner().map_err(|e| ImportError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Writes the credential export to `path`.
pub fn write_credentials(path: &Path, credentials: &[StudentCredential]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_path(path)?;
    write_rows(&mut wtr, credentials)?;
    wtr.flush()?;
    info!(path = %path.display(), rows = credentials.len(), "credentials exported");
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, credentials: &[StudentCredential]) -> Result<()> {
    wtr.write_record(CREDENTIAL_HEADER)?;
    for c in credentials {
        wtr.write_record([&c.student_id, &c.full_name, &c.username, &c.password])?;
    }
    Ok(())
}
