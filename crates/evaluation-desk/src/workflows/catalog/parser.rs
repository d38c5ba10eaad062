use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::io::Read;

use crate::workflows::evaluations::domain::{Sku, SkuCategory, SkuCode};

use super::CatalogImportError;

pub(crate) fn parse_skus<R: Read>(reader: R) -> Result<Vec<Sku>, CatalogImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut skus = Vec::new();
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    for (index, record) in csv_reader.deserialize::<SkuRow>().enumerate() {
        let row = record?;
        // header is line 1
        let line = index + 2;

        let Some(code) = row.sku else {
            continue;
        };
        if let Some(&first_line) = first_seen.get(&code) {
            return Err(CatalogImportError::DuplicateSku {
                line,
                code,
                first_line,
            });
        }
        first_seen.insert(code.clone(), line);

        let category = parse_category(&row.category).ok_or_else(|| {
            CatalogImportError::UnknownCategory {
                line,
                value: row.category.clone(),
            }
        })?;

        skus.push(Sku {
            name: row.name.unwrap_or_else(|| code.clone()),
            code: SkuCode(code),
            category,
            product_family: row.product_family.unwrap_or_default(),
            reprocessable: row
                .reprocessable
                .as_deref()
                .map(parse_flag)
                .unwrap_or(false),
        });
    }

    Ok(skus)
}

#[derive(Debug, Deserialize)]
struct SkuRow {
    #[serde(rename = "SKU", default, deserialize_with = "empty_string_as_none")]
    sku: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(rename = "Category", default)]
    category: String,
    #[serde(
        rename = "Product Family",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    product_family: Option<String>,
    #[serde(
        rename = "Reprocessable",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    reprocessable: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_category(value: &str) -> Option<SkuCategory> {
    let normalized = value
        .trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_");

    match normalized.as_str() {
        "disposable" | "disposables" => Some(SkuCategory::Disposable),
        "capital" | "capital_equipment" | "equipment" => Some(SkuCategory::CapitalEquipment),
        _ => None,
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    )
}
