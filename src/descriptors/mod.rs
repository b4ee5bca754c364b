//! The descriptor battery computed for every molecule. RDKit does the
//! chemistry; models are trained on a subset of its columns, selected by name.

use thiserror::Error;

mod engine;

/// Reasons a SMILES string yields no descriptors.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DescriptorError {
    #[error("empty SMILES")]
    Empty,

    #[error("RDKit could not parse the SMILES")]
    Unparseable,

    #[error("atom {atom} carries {count} hydrogens")]
    TooManyHydrogens { atom: usize, count: u32 },

    #[error("atom {atom} has formal charge {charge}")]
    ChargeOutOfRange { atom: usize, charge: i64 },

    /// Python or RDKit itself failed. Unlike the other variants this says
    /// nothing about the input.
    #[error("descriptor engine failed: {0}")]
    Engine(String),
}

/// Every RDKit descriptor name, in the order they are stored in
/// [Descriptors] and written by `retpredict describe`.
pub fn names() -> Result<&'static [String], DescriptorError> {
    engine::names()
}

/// One molecule's descriptor values, indexed like [names]. The first column
/// holds the molecular weight regardless of its name, which is what models
/// trained for this service have always seen.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptors {
    names: &'static [String],
    values: Vec<f64>,
}

impl Descriptors {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Parse `smiles` with RDKit and compute its descriptors.
pub fn calculate(smiles: &str) -> Result<Descriptors, DescriptorError> {
    if smiles.trim().is_empty() {
        return Err(DescriptorError::Empty);
    }
    let names = names()?;
    let values = engine::describe(smiles)?;
    if values.len() != names.len() {
        return Err(DescriptorError::Engine(format!(
            "expected {} descriptor values, got {}",
            names.len(),
            values.len()
        )));
    }
    Ok(Descriptors { names, values })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn names_are_unique() {
        let names = names().unwrap();
        assert!(names.len() > 100);
        for (i, name) in names.iter().enumerate() {
            assert_eq!(names.iter().position(|n| n == name), Some(i));
        }
        for needed in ["MolWt", "MolLogP", "TPSA", "NumHDonors"] {
            assert!(names.iter().any(|n| n == needed), "{needed}");
        }
    }

    #[test]
    fn aspirin() {
        let d = calculate("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        assert_abs_diff_eq!(d.values()[0], 180.159, epsilon = 1e-3);
        assert_abs_diff_eq!(d.get("MolWt").unwrap(), 180.159, epsilon = 1e-3);
        assert_abs_diff_eq!(d.get("MolLogP").unwrap(), 1.3101, epsilon = 1e-3);
        assert_abs_diff_eq!(d.get("TPSA").unwrap(), 63.6, epsilon = 1e-6);
        assert_eq!(d.get("HeavyAtomCount"), Some(13.0));
        assert_eq!(d.get("NumHDonors"), Some(1.0));
        assert_eq!(d.get("RingCount"), Some(1.0));
        assert_eq!(d.get("NumAromaticRings"), Some(1.0));
        assert_eq!(d.get("NumAromaticCarbocycles"), Some(1.0));
        assert_eq!(d.get("NumAliphaticRings"), Some(0.0));
        assert!(d.get("Unknown").is_none());
    }

    #[test]
    fn caffeine_logp() {
        let d = calculate("CN1C=NC2=C1C(=O)N(C(=O)N2C)C").unwrap();
        assert_abs_diff_eq!(d.get("MolLogP").unwrap(), -1.0293, epsilon = 1e-3);
    }

    #[test]
    fn ring_classes() {
        // indoline: a benzene fused to a saturated five-membered ring
        let d = calculate("C1Cc2ccccc2N1").unwrap();
        assert_eq!(d.get("RingCount"), Some(2.0));
        assert_eq!(d.get("NumAromaticRings"), Some(1.0));
        assert_eq!(d.get("NumAliphaticRings"), Some(1.0));

        let d = calculate("C1CCCCC1").unwrap();
        assert_eq!(d.get("NumSaturatedRings"), Some(1.0));

        let d = calculate("c1ccncc1").unwrap();
        assert_eq!(d.get("NumAromaticHeterocycles"), Some(1.0));
        assert_eq!(d.get("NumAromaticCarbocycles"), Some(0.0));
    }

    #[test]
    fn salts_and_metals() {
        for smiles in ["[Na+].[Cl-]", "[Pt](Cl)(Cl)(N)N", "C12C3C4C1C5C2C3C45"] {
            let d = calculate(smiles).unwrap();
            assert_eq!(d.values().len(), names().unwrap().len(), "{smiles}");
            assert!(d.values()[0].is_finite(), "{smiles}");
        }
    }

    #[test]
    fn invalid_smiles() {
        assert_eq!(calculate(""), Err(DescriptorError::Empty));
        assert_eq!(calculate("   "), Err(DescriptorError::Empty));
        for smiles in ["C1CC", "C(", "Xx", "not-a-smiles", "c1cccc1"] {
            assert_eq!(calculate(smiles), Err(DescriptorError::Unparseable));
        }
    }

    #[test]
    fn extreme_hydrogen_counts() {
        for smiles in ["C[CH255]", "[CH256]", "[CH9]"] {
            let err = calculate(smiles).unwrap_err();
            assert!(
                matches!(
                    err,
                    DescriptorError::Unparseable
                        | DescriptorError::TooManyHydrogens { .. }
                ),
                "{smiles}: {err:?}"
            );
        }
    }

    #[test]
    fn extreme_charges() {
        for smiles in ["[C-128]", "[C+16]", "[Fe+127]"] {
            let err = calculate(smiles).unwrap_err();
            assert!(
                matches!(
                    err,
                    DescriptorError::Unparseable
                        | DescriptorError::ChargeOutOfRange { .. }
                ),
                "{smiles}: {err:?}"
            );
        }
    }
}
