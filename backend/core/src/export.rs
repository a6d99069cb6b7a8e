/// CSV export of a record collection.
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use tracing::info;

use crate::types::LeadRecord;

/// Header row. Cells are written bare; data cells are quoted.
pub const CSV_HEADERS: [&str; 6] = ["Company", "Contact", "Designation", "Email", "Phone", "Requirements"];

/// Render records as CSV: one header row, one row per record, `\n`-joined,
/// every data value wrapped in double quotes with embedded quotes doubled.
pub fn render_csv(records: &[LeadRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for r in records {
        let f = &r.fields;
        let row = [
            &f.company_name,
            &f.contact_person,
            &f.designation,
            &f.email_id,
            &f.contact_number,
            &f.inquiry_requirements,
        ]
        .iter()
        .map(|v| quote(v))
        .collect::<Vec<_>>()
        .join(",");
        lines.push(row);
    }
    lines.join("\n")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// `<product>_pipeline_<YYYY-MM-DD>.csv`
pub fn export_file_name(product: &str, date: NaiveDate) -> String {
    format!("{}_pipeline_{}.csv", product, date.format("%Y-%m-%d"))
}

pub struct RecordExporter {
    pub output_dir: PathBuf,
    pub product: String,
}

impl RecordExporter {
    pub fn new(output_dir: impl Into<PathBuf>, product: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            product: product.into(),
        }
    }

    /// Write today's export file and return its path.
    pub async fn export_csv(&self, records: &[LeadRecord]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create export directory: {}", self.output_dir.display()))?;
        let filename = export_file_name(&self.product, Utc::now().date_naive());
        let path = self.output_dir.join(filename);

        let csv = render_csv(records);
        tokio::fs::write(&path, csv.as_bytes())
            .await
            .with_context(|| format!("Failed to write export: {}", path.display()))?;
        info!(records = records.len(), path = %path.display(), "Exported records");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LeadFields;
    use uuid::Uuid;

    fn record(company: &str, requirements: &str) -> LeadRecord {
        LeadRecord::new(
            Uuid::new_v4(),
            LeadFields {
                company_name: company.into(),
                contact_person: "Jane Doe".into(),
                designation: "CTO".into(),
                email_id: "jane@acme.com".into(),
                contact_number: "555-1212".into(),
                inquiry_requirements: requirements.into(),
                ..Default::default()
            },
            0,
        )
    }

    #[test]
    fn renders_header_and_rows() {
        let csv = render_csv(&[record("A&B", "steel"), record("Plain", "")]);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Company,Contact,Designation,Email,Phone,Requirements");
        assert_eq!(
            lines[1],
            r#""A&B","Jane Doe","CTO","jane@acme.com","555-1212","steel""#
        );
        assert_eq!(
            lines[2],
            r#""Plain","Jane Doe","CTO","jane@acme.com","555-1212","""#
        );
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn doubles_embedded_quotes_in_every_column() {
        let csv = render_csv(&[record(r#"Say "Hi""#, r#"need "fast" delivery"#)]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with(r#""Say ""Hi""","#));
        assert!(row.ends_with(r#""need ""fast"" delivery""#));
    }

    #[test]
    fn empty_collection_is_header_only() {
        assert_eq!(render_csv(&[]), "Company,Contact,Designation,Email,Phone,Requirements");
    }

    #[test]
    fn file_name_pattern() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_file_name("leadscan", date), "leadscan_pipeline_2024-03-07.csv");
    }

    #[tokio::test]
    async fn writes_export_file() {
        let dir = std::env::temp_dir().join(format!("leadscan-export-{}", Uuid::new_v4()));
        let exporter = RecordExporter::new(&dir, "leadscan");
        let path = exporter.export_csv(&[record("Acme", "")]).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.starts_with("Company,"));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("leadscan_pipeline_"));
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
