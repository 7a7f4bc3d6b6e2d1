use crate::app::presenter::{GridColumn, GridView, SortDirection};
use crate::core::estimator::Currency;
use crate::domain::model::SearchMode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "hts-tracker", version)]
#[command(about = "Search HTS codes, browse the tariff hierarchy and estimate US customs duty")]
pub struct CliConfig {
    /// Base URL of the classification service, e.g. http://localhost:8000/api
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds (none by default)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON on stderr")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search for candidate classifications
    Search(SearchArgs),
    /// Show the classification hierarchy
    Tree {
        /// Expand every node
        #[arg(long)]
        expand_all: bool,
        /// Expand down to the node with this code
        #[arg(long)]
        find: Option<String>,
    },
    /// Estimate duty and fees for a code or a rate
    Estimate {
        /// HTS code to look up through the local search
        #[arg(long, conflicts_with = "rate")]
        code: Option<String>,
        /// Duty rate text such as "2.5%" or "Free"
        #[arg(long)]
        rate: Option<String>,
        /// Declared (FOB) price; non-numeric input counts as 0
        #[arg(long, allow_hyphen_values = true)]
        price: Option<String>,
        #[arg(long, value_enum)]
        currency: Option<Currency>,
    },
    /// Upload an .xlsx file to the synchronization endpoint
    Sync { file: PathBuf },
    /// Search and write the result grid to CSV
    Export {
        #[command(flatten)]
        search: SearchArgs,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Interactive session mirroring the web client
    Session,
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Search text; several words are joined with spaces
    pub query: Vec<String>,

    #[arg(long, value_enum)]
    pub mode: Option<SearchMode>,

    /// Show the detailed grid instead of the ranked table
    #[arg(long)]
    pub grid: bool,

    /// Grid filter as column=text (columns: code, description, rate, restrictions, certifications)
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(GridColumn, String)>,

    /// Grid sort column (default: score, descending)
    #[arg(long)]
    pub sort: Option<GridColumn>,

    #[arg(long, help = "Sort ascending instead of descending")]
    pub asc: bool,

    /// 1-based grid page
    #[arg(long, default_value = "1")]
    pub page: usize,
}

impl SearchArgs {
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }

    pub fn grid_view(&self, page_size: usize) -> GridView {
        let mut view = GridView::new(page_size);
        for (column, needle) in &self.filters {
            view.set_filter(*column, needle);
        }
        if let Some(column) = self.sort {
            let direction = if self.asc {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            };
            view.sort_by(column, direction);
        }
        view.go_to_page(self.page.saturating_sub(1));
        view
    }
}

fn parse_filter(raw: &str) -> Result<(GridColumn, String), String> {
    let (column, needle) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected column=text, got '{}'", raw))?;
    Ok((column.trim().parse()?, needle.to_string()))
}
