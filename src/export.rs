//! Writing results as CSV.

use std::io::Write;

use crate::{pipeline::Prediction, table::FeatureTable, Error};

/// The prediction column header when the model does not name its target.
pub const DEFAULT_LABEL: &str = "Prediction";

/// write one `smiles,value` row per prediction under a `column,label` header
pub fn write_predictions<W: Write>(
    w: W,
    column: &str,
    label: &str,
    predictions: &[Prediction],
) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record([column, label])?;
    for p in predictions {
        let value = p.value.to_string();
        wtr.write_record([p.smiles.as_str(), value.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn predictions_to_string(
    column: &str,
    label: &str,
    predictions: &[Prediction],
) -> Result<String, Error> {
    let mut buf = Vec::new();
    write_predictions(&mut buf, column, label, predictions)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// write the SMILES column followed by every descriptor column of `table`
pub fn write_descriptors<W: Write>(
    w: W,
    column: &str,
    table: &FeatureTable,
) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(
        std::iter::once(column).chain(table.columns().iter().map(String::as_str)),
    )?;
    for (i, smiles) in table.smiles().iter().enumerate() {
        let mut record = vec![smiles.clone()];
        record.extend(table.row(i).iter().map(f64::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
