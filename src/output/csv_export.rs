//! CSV export of collected listings

use crate::storage::ItemRecord;
use crate::HarvestError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column order of the export
pub const CSV_HEADERS: [&str; 8] = [
    "title",
    "company",
    "location",
    "salary",
    "modality",
    "link",
    "description",
    "source",
];

/// Writes listings as CSV with a header row
pub fn write_csv<W: Write>(items: &[ItemRecord], writer: W) -> Result<(), HarvestError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADERS)?;

    for item in items {
        writer.write_record([
            item.title.as_str(),
            item.organization.as_str(),
            item.locality.as_str(),
            item.compensation.as_str(),
            item.work_mode.as_str(),
            item.identity_key.as_str(),
            item.description.as_str(),
            item.source.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Exports listings to `path`, replacing any previous export
///
/// The file is written next to the target and renamed into place, so
/// readers never see a half-written export.
pub fn export_csv(items: &[ItemRecord], path: &Path) -> Result<usize, HarvestError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("csv.tmp");
    {
        let file = File::create(&tmp)?;
        write_csv(items, file)?;
    }
    std::fs::rename(&tmp, path)?;

    tracing::info!("Exported {} listings to {}", items.len(), path.display());
    Ok(items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item() -> ItemRecord {
        ItemRecord {
            identity_key: "https://www.occ.com.mx/empleos/empleo-1/".to_string(),
            title: "Analista de Nómina".to_string(),
            organization: "Acme".to_string(),
            locality: "Guadalajara, Jalisco".to_string(),
            compensation: "$15,000 Mensual".to_string(),
            work_mode: "N/A".to_string(),
            description: "Cálculo de \"nómina\" quincenal".to_string(),
            source: "OCC".to_string(),
            keyword: "rrhh".to_string(),
        }
    }

    #[test]
    fn test_write_csv_columns_and_quoting() {
        let mut buffer = Vec::new();
        write_csv(&[item()], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("title,company,location,salary,modality,link,description,source")
        );
        assert_eq!(
            lines.next(),
            Some(
                "Analista de Nómina,Acme,\"Guadalajara, Jalisco\",\"$15,000 Mensual\",N/A,\
                 https://www.occ.com.mx/empleos/empleo-1/,\"Cálculo de \"\"nómina\"\" quincenal\",OCC"
            )
        );
    }

    #[test]
    fn test_export_csv_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exports/jobs.csv");

        let written = export_csv(&[item(), item()], &path).unwrap();
        assert_eq!(written, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 2);
        assert!(!path.with_extension("csv.tmp").exists());
    }
}
