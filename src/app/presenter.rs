//! Terminal rendering of search results, the duty estimate and the sync outcome.

use crate::app::tree::HierarchyBrowser;
use crate::core::estimator::{DutyEstimate, DISCLAIMER};
use crate::core::rate::RateKind;
use crate::domain::model::{Candidate, SyncReport};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::cmp::Ordering;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const EXTERNAL_ROW_LIMIT: usize = 50;
pub const SYNC_FAILURE_MESSAGE: &str = "Error uploading file";
pub const LOADING_MESSAGE: &str = "Loading...";
pub const EMPTY_TREE_MESSAGE: &str = "No hierarchy available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbabilityBand {
    High,
    Medium,
    Low,
}

impl ProbabilityBand {
    pub fn of(value: f64) -> Self {
        if value > 70.0 {
            ProbabilityBand::High
        } else if value > 40.0 {
            ProbabilityBand::Medium
        } else {
            ProbabilityBand::Low
        }
    }

    fn color(&self) -> Color {
        match self {
            ProbabilityBand::High => Color::Green,
            ProbabilityBand::Medium => Color::DarkYellow,
            ProbabilityBand::Low => Color::Red,
        }
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}

/// Ranked recommendation table. Nothing is rendered for an empty list.
pub fn render_ranked(candidates: &[Candidate]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    let mut table = new_table(&["#", "HTS Code", "Probability", "Description"]);
    for (i, c) in candidates.iter().enumerate() {
        let probability = c.probability_label().unwrap_or_else(|| "N/A".to_string());
        let prob_cell = match c.probability_value() {
            Some(v) => Cell::new(probability).fg(ProbabilityBand::of(v).color()),
            None => Cell::new(probability),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&c.code),
            prob_cell,
            Cell::new(&c.description),
        ]);
    }

    Some(format!(
        "Artificial intelligence recommends {} possible codes:\n{}",
        candidates.len(),
        table
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridColumn {
    Code,
    Description,
    Rate,
    Restrictions,
    Certifications,
    Score,
}

impl FromStr for GridColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "code" | "hts" | "hts_code" => Ok(GridColumn::Code),
            "description" | "desc" => Ok(GridColumn::Description),
            "rate" | "duty" | "duty_rate" => Ok(GridColumn::Rate),
            "restrictions" => Ok(GridColumn::Restrictions),
            "certifications" | "certs" => Ok(GridColumn::Certifications),
            "score" | "match_score" => Ok(GridColumn::Score),
            other => Err(format!("unknown column '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

pub fn cell_text(candidate: &Candidate, column: GridColumn) -> String {
    match column {
        GridColumn::Code => candidate.code.clone(),
        GridColumn::Description => candidate.description.clone(),
        GridColumn::Rate => candidate
            .duty_rate
            .clone()
            .unwrap_or_else(|| "N/A".to_string()),
        GridColumn::Restrictions => {
            if candidate.restrictions.is_empty() {
                "None".to_string()
            } else {
                candidate
                    .restrictions
                    .iter()
                    .map(|r| format!("{}: {}", r.agency, r.description))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        GridColumn::Certifications => candidate
            .certifications
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
        GridColumn::Score => candidate
            .match_score
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

fn compare(a: &Candidate, b: &Candidate, column: GridColumn) -> Ordering {
    match column {
        // unscored rows rank lowest
        GridColumn::Score => match (a.match_score, b.match_score) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        },
        _ => cell_text(a, column)
            .to_lowercase()
            .cmp(&cell_text(b, column).to_lowercase()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridPage<'a> {
    pub rows: Vec<&'a Candidate>,
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}

/// Filter, sort and pagination settings of the detailed data grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    filters: Vec<(GridColumn, String)>,
    sort: (GridColumn, SortDirection),
    page: usize,
    page_size: usize,
}

impl Default for GridView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl GridView {
    pub fn new(page_size: usize) -> Self {
        Self {
            filters: Vec::new(),
            sort: (GridColumn::Score, SortDirection::Descending),
            page: 0,
            page_size: page_size.max(1),
        }
    }

    /// Case-insensitive substring filter; an empty needle removes the filter.
    pub fn set_filter(&mut self, column: GridColumn, needle: &str) {
        self.filters.retain(|(c, _)| *c != column);
        let needle = needle.trim();
        if !needle.is_empty() {
            self.filters.push((column, needle.to_lowercase()));
        }
        self.page = 0;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page = 0;
    }

    pub fn sort_by(&mut self, column: GridColumn, direction: SortDirection) {
        self.sort = (column, direction);
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page;
    }

    pub fn rows<'a>(&self, candidates: &'a [Candidate]) -> Vec<&'a Candidate> {
        let mut rows: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| {
                self.filters
                    .iter()
                    .all(|(col, needle)| cell_text(c, *col).to_lowercase().contains(needle))
            })
            .collect();

        let (column, direction) = self.sort;
        rows.sort_by(|a, b| {
            let ord = compare(a, b, column);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        rows
    }

    /// Current page, with the page index clamped to what exists.
    pub fn page<'a>(&self, candidates: &'a [Candidate]) -> GridPage<'a> {
        let rows = self.rows(candidates);
        let total = rows.len();
        let page_count = total.div_ceil(self.page_size).max(1);
        let page = self.page.min(page_count - 1);
        let rows = rows
            .into_iter()
            .skip(page * self.page_size)
            .take(self.page_size)
            .collect();
        GridPage {
            rows,
            page,
            page_count,
            total,
        }
    }

    pub fn render(&self, candidates: &[Candidate]) -> String {
        let page = self.page(candidates);
        let mut table = new_table(&[
            "HTS Code",
            "Description",
            "Duty Rate",
            "Restrictions",
            "Certifications",
        ]);
        for c in &page.rows {
            table.add_row(vec![
                cell_text(c, GridColumn::Code),
                cell_text(c, GridColumn::Description),
                cell_text(c, GridColumn::Rate),
                cell_text(c, GridColumn::Restrictions),
                cell_text(c, GridColumn::Certifications),
            ]);
        }
        format!(
            "Detailed Data View\n{}\nPage {} of {} ({} rows)",
            table,
            page.page + 1,
            page.page_count,
            page.total
        )
    }
}

/// Table for the live tariff-authority results, truncated to `limit` rows.
pub fn render_external(candidates: &[Candidate], limit: usize, query_issued: bool) -> String {
    if candidates.is_empty() {
        return if query_issued {
            "No results found from USITC API.".to_string()
        } else {
            "Enter a search term to query USITC.".to_string()
        };
    }

    let mut table = new_table(&["#", "HTS #", "Description", "Rate"]);
    for (i, c) in candidates.iter().take(limit).enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            cell_text(c, GridColumn::Code),
            cell_text(c, GridColumn::Description),
            cell_text(c, GridColumn::Rate),
        ]);
    }
    table.to_string()
}

pub fn render_estimate(estimate: &DutyEstimate) -> String {
    let rate_label = estimate.rate_text.as_deref().unwrap_or("N/A");
    let costs = &estimate.costs;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![
        Cell::new(format!("Customs Duty ({})", rate_label)),
        Cell::new(estimate.format_amount(costs.duty_cost)),
    ]);
    table.add_row(vec![
        Cell::new("MPF (0.3464%)"),
        Cell::new(estimate.format_amount(costs.mpf_cost)),
    ]);
    table.add_row(vec![
        Cell::new("HMF (0.125%)"),
        Cell::new(estimate.format_amount(costs.hmf_cost)),
    ]);
    table.add_row(vec![
        Cell::new("TOTAL:").fg(Color::Cyan),
        Cell::new(estimate.format_amount(costs.total_cost)).fg(Color::Cyan),
    ]);

    let mut lines = vec![
        "US Customs Cost Estimator".to_string(),
        format!("Product:  {}", truncate(&estimate.description, 50)),
        format!("HTS Code: {}", estimate.code),
        format!(
            "Price (FOB): {} {}",
            estimate.format_amount(estimate.price),
            estimate.currency
        ),
        table.to_string(),
    ];
    match estimate.rate.kind {
        RateKind::CompoundAdValorem => lines.push(format!(
            "Rate '{}' also has a specific component; only the percentage is included above.",
            rate_label
        )),
        RateKind::Unsupported => lines.push(format!(
            "Rate '{}' is not a percentage of value; no duty is included above.",
            rate_label
        )),
        RateKind::Unspecified | RateKind::Free | RateKind::AdValorem => {}
    }
    lines.push(DISCLAIMER.to_string());
    lines.join("\n")
}

/// `None` means the tree was never fetched; an empty tree is a finished fetch
/// that returned nothing (or failed).
pub fn render_tree(tree: Option<&HierarchyBrowser>) -> String {
    match tree {
        None => LOADING_MESSAGE.to_string(),
        Some(browser) if browser.is_empty() => EMPTY_TREE_MESSAGE.to_string(),
        Some(browser) => browser.render(),
    }
}

pub fn sync_success_message(report: &SyncReport) -> String {
    format!("Sync Complete! Processed {} rows.", report.rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::estimator::Currency;
    use crate::domain::model::Restriction;

    fn candidates() -> Vec<Candidate> {
        let mut with_restriction = Candidate::new("8517.13.00", "Smartphones")
            .with_duty_rate("Free")
            .with_match_score(62.0);
        with_restriction.restrictions.push(Restriction {
            agency: "FCC".to_string(),
            description: "Radio equipment authorization".to_string(),
        });
        with_restriction.certifications.insert("FCC".to_string());

        vec![
            Candidate::new("8471.41.01", "Other data processing machines").with_match_score(45.0),
            with_restriction,
            Candidate::new("8471.30.01", "Laptops and tablets")
                .with_duty_rate("Free")
                .with_match_score(95.0),
            Candidate::new("4202.11.00", "Tablet folders of leather").with_duty_rate("8%"),
        ]
    }

    #[test]
    fn test_probability_bands() {
        assert_eq!(ProbabilityBand::of(90.0), ProbabilityBand::High);
        assert_eq!(ProbabilityBand::of(70.0), ProbabilityBand::Medium);
        assert_eq!(ProbabilityBand::of(41.0), ProbabilityBand::Medium);
        assert_eq!(ProbabilityBand::of(40.0), ProbabilityBand::Low);
    }

    #[test]
    fn test_ranked_table() {
        assert!(render_ranked(&[]).is_none());
        let out = render_ranked(&candidates()).unwrap();
        assert!(out.starts_with("Artificial intelligence recommends 4 possible codes:"));
        assert!(out.contains("8471.30.01"));
    }

    #[test]
    fn test_grid_sorts_by_score_descending_by_default() {
        let data = candidates();
        let view = GridView::default();
        let codes: Vec<&str> = view.rows(&data).iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["8471.30.01", "8517.13.00", "8471.41.01", "4202.11.00"]);
    }

    #[test]
    fn test_grid_filter_and_sort() {
        let data = candidates();
        let mut view = GridView::default();
        view.set_filter(GridColumn::Description, "TABLET");
        view.sort_by(GridColumn::Code, SortDirection::Ascending);
        let codes: Vec<&str> = view.rows(&data).iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["4202.11.00", "8471.30.01"]);

        view.set_filter(GridColumn::Description, "");
        view.set_filter(GridColumn::Restrictions, "fcc");
        assert_eq!(view.rows(&data).len(), 1);
    }

    #[test]
    fn test_grid_pagination() {
        let data: Vec<Candidate> = (0..45)
            .map(|i| Candidate::new(format!("{:04}", i), "Item").with_match_score(i as f64))
            .collect();
        let mut view = GridView::default();
        let first = view.page(&data);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.rows.len(), 20);
        assert_eq!(first.rows[0].code, "0044");

        view.go_to_page(9);
        let last = view.page(&data);
        assert_eq!(last.page, 2);
        assert_eq!(last.rows.len(), 5);
    }

    #[test]
    fn test_cell_text_defaults() {
        let c = Candidate::new("0101.21", "Horses");
        assert_eq!(cell_text(&c, GridColumn::Rate), "N/A");
        assert_eq!(cell_text(&c, GridColumn::Restrictions), "None");
        assert_eq!(cell_text(&c, GridColumn::Certifications), "");
    }

    #[test]
    fn test_external_table_truncates_and_explains_empty() {
        assert_eq!(
            render_external(&[], EXTERNAL_ROW_LIMIT, true),
            "No results found from USITC API."
        );
        assert_eq!(
            render_external(&[], EXTERNAL_ROW_LIMIT, false),
            "Enter a search term to query USITC."
        );

        let data: Vec<Candidate> = (0..60)
            .map(|i| Candidate::new(format!("CODE-{:03}", i), "Row"))
            .collect();
        let out = render_external(&data, EXTERNAL_ROW_LIMIT, true);
        assert!(out.contains("CODE-049"));
        assert!(!out.contains("CODE-050"));
        assert!(out.contains("│ 50 "));
        assert!(!out.contains("│ 51 "));
    }

    #[test]
    fn test_render_estimate() {
        let c = Candidate::new("0402.10", "Milk powder").with_duty_rate("3.3¢/kg");
        let est = DutyEstimate::for_candidate(&c, 1000.0, Currency::Usd);
        let out = render_estimate(&est);
        assert!(out.contains("Customs Duty (3.3¢/kg)"));
        assert!(out.contains("$0.00"));
        assert!(out.contains("$4.71"));
        assert!(out.contains("Rate '3.3¢/kg' is not a percentage of value"));
        assert!(out.ends_with(DISCLAIMER));
    }

    #[test]
    fn test_approximation_line_follows_rate_kind() {
        let note = Candidate::new("9903.88.03", "Surcharge").with_duty_rate("See note 3");
        let out = render_estimate(&DutyEstimate::for_candidate(&note, 1000.0, Currency::Usd));
        assert!(out.contains("Rate 'See note 3' is not a percentage of value"));
        assert!(!out.contains("specific component"));

        let compound = Candidate::new("2402.10", "Cigars").with_duty_rate("52.8¢/kg + 4%");
        let out = render_estimate(&DutyEstimate::for_candidate(&compound, 1000.0, Currency::Usd));
        assert!(out.contains("also has a specific component; only the percentage is included"));
        assert!(out.contains("$40.00"));

        let plain = Candidate::new("8471.30.01", "Laptops").with_duty_rate("2.5%");
        let out = render_estimate(&DutyEstimate::for_candidate(&plain, 1000.0, Currency::Usd));
        assert!(!out.contains("included above"));
    }

    #[test]
    fn test_render_tree_distinguishes_pending_and_empty() {
        assert_eq!(render_tree(None), LOADING_MESSAGE);
        assert_eq!(
            render_tree(Some(&HierarchyBrowser::new(Vec::new()))),
            EMPTY_TREE_MESSAGE
        );
        let tree = HierarchyBrowser::new(vec![crate::domain::model::HierarchyNode::new(
            "Chapter 84",
            Some("84"),
        )]);
        assert_eq!(render_tree(Some(&tree)), "  1  • Chapter 84 (84)");
    }

    #[test]
    fn test_sync_message() {
        let report = SyncReport {
            rows: 3,
            status: None,
        };
        assert_eq!(sync_success_message(&report), "Sync Complete! Processed 3 rows.");
    }
}
