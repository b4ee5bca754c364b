use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use retpredict::{input::DEFAULT_COLUMN, Error};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// The address to listen on.
    pub(crate) address: String,

    /// The JSON model file used for every prediction.
    pub(crate) model: PathBuf,

    /// The column of uploaded files holding the SMILES, also used as the
    /// first column of the results.
    pub(crate) smiles_column: String,

    /// The file name offered for downloading the results.
    pub(crate) output_file: String,

    /// The number of threads to use. Defaults to the number of logical CPUs as
    /// detected by rayon.
    pub(crate) threads: usize,

    /// The largest request body accepted, uploads included.
    pub(crate) max_upload_bytes: usize,

    /// The heading shown on the form page.
    pub(crate) title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_owned(),
            model: PathBuf::from("model.json"),
            smiles_column: DEFAULT_COLUMN.to_owned(),
            output_file: "processed_results.csv".to_owned(),
            threads: 0,
            max_upload_bytes: 10 * 1024 * 1024,
            title: "RET-BioPredictor".to_owned(),
        }
    }
}

impl Config {
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(toml::from_str(&read_to_string(path)?)?)
    }
}
