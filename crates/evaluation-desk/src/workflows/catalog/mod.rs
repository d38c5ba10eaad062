//! Bulk SKU reference data loaded from a CSV catalog export.
//!
//! Expected headers: `SKU`, `Name`, `Category`, `Product Family`,
//! `Reprocessable`. Rows without a SKU code are skipped; a code that repeats
//! is rejected with both line numbers.

mod parser;

use crate::workflows::evaluations::domain::Sku;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownCategory { line: usize, value: String },
    DuplicateSku {
        line: usize,
        code: String,
        first_line: usize,
    },
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read SKU catalog: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid SKU catalog CSV: {}", err),
            CatalogImportError::UnknownCategory { line, value } => write!(
                f,
                "unknown SKU category '{}' on line {} (expected disposable or capital equipment)",
                value, line
            ),
            CatalogImportError::DuplicateSku {
                line,
                code,
                first_line,
            } => write!(
                f,
                "SKU '{}' on line {} already appears on line {}",
                code, line, first_line
            ),
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::UnknownCategory { .. }
            | CatalogImportError::DuplicateSku { .. } => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct SkuCatalogImporter;

impl SkuCatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Sku>, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Sku>, CatalogImportError> {
        let skus = parser::parse_skus(reader)?;
        tracing::debug!(count = skus.len(), "sku catalog imported");
        Ok(skus)
    }
}
