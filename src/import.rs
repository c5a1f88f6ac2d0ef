// Company provisioning from CSV
//
// Expected header: company,image
// New companies start with zeroed statistics; names already stored are
// skipped so re-importing a file never resets anybody's record.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::entities::Company;
use crate::store::EntityStore;

#[derive(Debug, Deserialize)]
struct CompanyRow {
    company: String,
    #[serde(default)]
    image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<Company>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    read_companies(file)
}

/// Parse company rows. Blank names are an error (reported with the data row
/// number, 1-based after the header); duplicate names keep the first row.
pub fn read_companies<R: Read>(reader: R) -> Result<Vec<Company>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut seen = HashSet::new();
    let mut companies = Vec::new();

    for (index, result) in rdr.deserialize::<CompanyRow>().enumerate() {
        let row = result.with_context(|| format!("Failed to parse company row {}", index + 1))?;
        if row.company.is_empty() {
            bail!("Row {} has an empty company name", index + 1);
        }
        if seen.insert(row.company.clone()) {
            companies.push(Company::new(row.company, row.image));
        }
    }

    Ok(companies)
}

pub fn import_companies<S>(store: &S, companies: &[Company]) -> Result<ImportSummary>
where
    S: EntityStore + ?Sized,
{
    let mut summary = ImportSummary::default();

    for company in companies {
        if store
            .insert_company(company)
            .with_context(|| format!("Failed to insert company {}", company.name))?
        {
            summary.inserted += 1;
        } else {
            summary.skipped += 1;
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        "company import finished"
    );
    Ok(summary)
}
