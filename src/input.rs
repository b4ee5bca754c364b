//! Collecting SMILES from pasted text or an uploaded table.

use std::io::Read;

use log::debug;

use crate::Error;

/// The column read from uploaded files unless configured otherwise.
pub const DEFAULT_COLUMN: &str = "Ligand SMILES";

/// split comma-separated `text` into trimmed, non-empty SMILES
pub fn split_text(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// read the values of `column` from a comma-delimited table whose first line
/// is the header. empty cells are skipped
pub fn read_column<R: Read>(rdr: R, column: &str) -> Result<Vec<String>, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);
    let idx = rdr
        .headers()?
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
        .ok_or_else(|| Error::MissingColumn(column.to_owned()))?;
    let mut ret = Vec::new();
    for record in rdr.records() {
        let record = record?;
        match record.get(idx) {
            Some(s) if !s.is_empty() => ret.push(s.to_owned()),
            _ => {}
        }
    }
    Ok(ret)
}

/// gather the SMILES for one request. pasted `text` takes precedence over an
/// `upload`; blank text or an empty upload count as absent
pub fn collect(
    text: Option<&str>,
    upload: Option<&[u8]>,
    column: &str,
) -> Result<Vec<String>, Error> {
    let smiles = match (text, upload) {
        (Some(text), _) if !text.trim().is_empty() => {
            debug!("reading SMILES from text input");
            split_text(text)
        }
        (_, Some(bytes)) if !bytes.is_empty() => {
            debug!("reading SMILES from {} uploaded bytes", bytes.len());
            read_column(bytes, column)?
        }
        _ => return Err(Error::NoInput),
    };
    if smiles.is_empty() {
        return Err(Error::NoInput);
    }
    Ok(smiles)
}
