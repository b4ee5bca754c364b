use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse model file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Descriptors(#[from] crate::descriptors::DescriptorError),

    #[error("column `{0}` not found in uploaded file")]
    MissingColumn(String),

    #[error(
        "Please paste SMILES strings or upload a CSV or TXT file before \
         submitting."
    )]
    NoInput,

    #[error("none of the submitted SMILES could be parsed")]
    NoValidMolecules,

    #[error("model expects feature `{0}`, which is not a known descriptor")]
    MissingFeature(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),
}

impl Error {
    /// whether the error was caused by what the user submitted rather than by
    /// the model or the environment
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::Csv(_)
                | Error::MissingColumn(_)
                | Error::NoInput
                | Error::NoValidMolecules
        )
    }
}
