use crate::app::presenter::{cell_text, GridColumn};
use crate::domain::model::Candidate;
use crate::utils::error::Result;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 6] = [
    "hts_code",
    "description",
    "duty_rate",
    "match_score",
    "restrictions",
    "certifications",
];

/// Writes candidates as CSV, one row each, in the order given.
pub fn export_csv<W: Write>(candidates: &[&Candidate], writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;

    for c in candidates {
        let restrictions = c
            .restrictions
            .iter()
            .map(|r| format!("{}: {}", r.agency, r.description))
            .collect::<Vec<_>>()
            .join("; ");
        wtr.write_record([
            c.code.as_str(),
            c.description.as_str(),
            c.duty_rate.as_deref().unwrap_or(""),
            cell_text(c, GridColumn::Score).as_str(),
            restrictions.as_str(),
            cell_text(c, GridColumn::Certifications).as_str(),
        ])?;
    }

    wtr.flush()?;
    tracing::debug!("Exported {} candidates to CSV", candidates.len());
    Ok(candidates.len())
}

pub fn export_csv_file<P: AsRef<Path>>(candidates: &[&Candidate], path: P) -> Result<usize> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    export_csv(candidates, file)
}
