//! Browsing, deleting, and exporting stored records.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{Local, TimeZone};
use leadscan_core::{export_file_name, LeadRecord, RecordExporter};
use leadscan_storage::RecordStore;
use uuid::Uuid;

use crate::context::AppContext;
use crate::terminal_output::{
    confirm, note_info, note_success, render_table, styled, Column, BOLD, DIM,
};

const NOT_PROVIDED: &str = "Not provided";
const NO_REQUIREMENTS: &str = "No specific requirements captured.";

fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

fn local_time(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Find a record by full id or by a unique prefix of its short id.
pub fn resolve_record<'a>(store: &'a RecordStore, query: &str) -> Result<&'a LeadRecord> {
    if let Ok(id) = Uuid::parse_str(query) {
        return match store.get(id) {
            Some(record) => Ok(record),
            None => bail!("No record with id {query}"),
        };
    }
    let query = query.to_ascii_lowercase().replace('-', "");
    if query.is_empty() {
        bail!("Record id is empty");
    }
    let mut matches = store
        .list()
        .iter()
        .filter(|r| r.id.simple().to_string().starts_with(&query));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Ok(record),
        (None, _) => bail!("No record matches '{query}'"),
        (Some(_), Some(_)) => bail!("'{query}' matches more than one record; use more characters"),
    }
}

pub fn render_list(records: &[LeadRecord]) -> String {
    let columns = [
        Column::left("ID"),
        Column::left("Company").max_width(28),
        Column::left("Contact").max_width(24),
        Column::left("Phone"),
        Column::left("Email"),
        Column::left("Scanned"),
    ];
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                short_id(&r.id),
                r.fields.company_name.clone(),
                r.fields.contact_person.clone(),
                r.fields.contact_number.clone(),
                r.fields.email_id.clone(),
                local_time(r.timestamp),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

/// Detail view. Empty contact fields are omitted; addresses and
/// requirements get placeholders.
pub fn render_detail(record: &LeadRecord) -> String {
    let f = &record.fields;
    let mut out = String::new();
    let company = if f.company_name.is_empty() { "Unknown company" } else { &f.company_name };
    out.push_str(&styled(BOLD, company));
    out.push('\n');
    if !f.contact_person.is_empty() {
        out.push_str(&format!("{}\n", f.contact_person));
    }

    for (label, value) in [
        ("Designation", &f.designation),
        ("Mobile Number", &f.contact_number),
        ("Telephone", &f.telephone_number),
        ("Email Address", &f.email_id),
        ("Website", &f.website),
    ] {
        if !value.is_empty() {
            out.push_str(&format!("  {:<18}{}\n", format!("{label}:"), value));
        }
    }
    for (label, value) in [
        ("Corporate Office", &f.corporate_address),
        ("Factory / Works", &f.factory_address),
    ] {
        let value = if value.is_empty() { NOT_PROVIDED } else { value.as_str() };
        out.push_str(&format!("  {:<18}{}\n", format!("{label}:"), value));
    }
    let requirements = if f.inquiry_requirements.is_empty() {
        NO_REQUIREMENTS
    } else {
        &f.inquiry_requirements
    };
    out.push_str(&format!("  {:<18}\"{}\"\n", "Inquiry:", requirements));
    out.push_str(&styled(
        DIM,
        &format!("  Captured on {} ({})", local_time(record.timestamp), record.id),
    ));
    out.push('\n');
    out
}

pub fn list(ctx: &AppContext) -> Result<()> {
    let records = ctx.workspace.records()?;
    if records.is_empty() {
        note_info("No records yet. Scan a business card or inquiry form with `leadscan scan`.");
        return Ok(());
    }
    print!("{}", render_list(records.list()));
    Ok(())
}

pub fn show(ctx: &AppContext, id: &str) -> Result<()> {
    let record = resolve_record(ctx.workspace.records()?, id)?;
    print!("{}", render_detail(record));
    Ok(())
}

pub fn delete(ctx: &mut AppContext, id: &str, yes: bool) -> Result<()> {
    let store = ctx.workspace.records_mut()?;
    let record = resolve_record(store, id)?;
    let (record_id, label) = (record.id, record.to_string());
    if !yes && !confirm(&format!("Delete {label}?"))? {
        return Ok(());
    }
    if store.remove(record_id)?.is_some() {
        note_success(&format!("Deleted {label}"));
    }
    Ok(())
}

pub async fn export(ctx: &AppContext, output: Option<PathBuf>, stdout: bool) -> Result<()> {
    let records = ctx.workspace.records()?;
    if stdout {
        println!("{}", records.export());
        return Ok(());
    }
    if records.is_empty() {
        note_info("Nothing to export");
        return Ok(());
    }
    let path = match output {
        Some(path) => {
            tokio::fs::write(&path, records.export()).await?;
            path
        }
        None => {
            RecordExporter::new(ctx.config.export_dir(), ctx.config.export_product())
                .export_csv(records.list())
                .await?
        }
    };
    note_success(&format!("Exported {} records to {}", records.len(), path.display()));
    Ok(())
}

pub fn stats(ctx: &AppContext) -> Result<()> {
    let stats = ctx.workspace.records()?.stats(Local::now());
    println!("Total records:  {}", stats.total);
    println!("Scanned today:  {}", stats.today);
    println!(
        "Next export:    {}",
        export_file_name(ctx.config.export_product(), chrono::Utc::now().date_naive())
    );
    Ok(())
}
