//! Session state and its single transition function.
//!
//! Every user action and every network completion is an [`Event`]. Applying
//! an event mutates [`SessionState`] and returns the [`Command`]s the caller
//! has to run; results come back as further events. Nothing here performs
//! I/O, so every transition can be tested without a terminal or a server.

use crate::app::presenter::{sync_success_message, SYNC_FAILURE_MESSAGE};
use crate::app::tree::{HierarchyBrowser, NodePath};
use crate::core::estimator::{parse_price, Currency, DutyEstimate, DEFAULT_PRICE};
use crate::core::sequencer::{SearchSequencer, Ticket};
use crate::domain::model::{Candidate, HierarchyNode, SearchMode, SyncReport};
use std::path::PathBuf;

pub const SUGGESTED_QUERIES: [&str; 4] = [
    "graphic tablet",
    "tablet folder",
    "Apple iPad",
    "Samsung Galaxy",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Started,
    QueryEdited(String),
    SearchSubmitted(String),
    SuggestionChosen(usize),
    TabSwitched(SearchMode),
    SearchCompleted {
        ticket: Ticket,
        mode: SearchMode,
        results: Vec<Candidate>,
    },
    TreeLoaded(Vec<HierarchyNode>),
    NodeToggled(NodePath),
    CandidateSelected(usize),
    PriceEdited(String),
    CurrencyChanged(Currency),
    EstimatorClosed,
    UploadRequested(PathBuf),
    UploadFinished(std::result::Result<SyncReport, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search {
        ticket: Ticket,
        mode: SearchMode,
        query: String,
    },
    LoadTree,
    Upload {
        path: PathBuf,
    },
}

/// The candidate currently open in the estimator, with its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub candidate: Candidate,
    pub price: f64,
    pub currency: Currency,
}

impl Selection {
    pub fn estimate(&self) -> DutyEstimate {
        DutyEstimate::for_candidate(&self.candidate, self.price, self.currency)
    }
}

/// What the main area should show right now.
#[derive(Debug, Clone, PartialEq)]
pub enum View<'a> {
    Loading,
    Tree(Option<&'a HierarchyBrowser>),
    LocalResults(&'a [Candidate]),
    ExternalResults {
        results: &'a [Candidate],
        query_issued: bool,
    },
}

#[derive(Debug)]
pub struct SessionState {
    mode: SearchMode,
    draft: String,
    query: String,
    local_results: Vec<Candidate>,
    external_results: Vec<Candidate>,
    loading: bool,
    tree: Option<HierarchyBrowser>,
    tree_requested: bool,
    selection: Option<Selection>,
    notice: Option<String>,
    sequencer: SearchSequencer,
    default_price: f64,
    default_currency: Currency,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SearchMode::Local, DEFAULT_PRICE, Currency::Usd)
    }
}

impl SessionState {
    pub fn new(mode: SearchMode, default_price: f64, default_currency: Currency) -> Self {
        Self {
            mode,
            draft: String::new(),
            query: String::new(),
            local_results: Vec::new(),
            external_results: Vec::new(),
            loading: false,
            tree: None,
            tree_requested: false,
            selection: None,
            notice: None,
            sequencer: SearchSequencer::new(),
            default_price,
            default_currency,
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn local_results(&self) -> &[Candidate] {
        &self.local_results
    }

    pub fn external_results(&self) -> &[Candidate] {
        &self.external_results
    }

    /// Results of the active tab.
    pub fn current_results(&self) -> &[Candidate] {
        match self.mode {
            SearchMode::Local => &self.local_results,
            SearchMode::External => &self.external_results,
        }
    }

    pub fn tree(&self) -> Option<&HierarchyBrowser> {
        self.tree.as_ref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Recomputed on every call from the current selection.
    pub fn estimate(&self) -> Option<DutyEstimate> {
        self.selection.as_ref().map(Selection::estimate)
    }

    /// Returns and clears the pending user-visible message.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn view(&self) -> View<'_> {
        if self.loading {
            return View::Loading;
        }
        match self.mode {
            SearchMode::Local if self.query.is_empty() => View::Tree(self.tree.as_ref()),
            SearchMode::Local => View::LocalResults(&self.local_results),
            SearchMode::External => View::ExternalResults {
                results: &self.external_results,
                query_issued: !self.query.is_empty(),
            },
        }
    }

    pub fn apply(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Started => self.issue_search(String::new()),
            Event::QueryEdited(text) => {
                let cleared = text.is_empty();
                self.draft = text;
                if cleared {
                    self.issue_search(String::new())
                } else {
                    Vec::new()
                }
            }
            Event::SearchSubmitted(query) => {
                self.draft = query.clone();
                self.issue_search(query)
            }
            Event::SuggestionChosen(index) => match SUGGESTED_QUERIES.get(index) {
                Some(query) => {
                    self.draft = query.to_string();
                    self.issue_search(query.to_string())
                }
                None => Vec::new(),
            },
            Event::TabSwitched(mode) => {
                if mode == self.mode {
                    return Vec::new();
                }
                self.mode = mode;
                self.selection = None;
                if self.query.is_empty() {
                    self.tree_command().into_iter().collect()
                } else {
                    self.issue_search(self.query.clone())
                }
            }
            Event::SearchCompleted {
                ticket,
                mode,
                results,
            } => {
                if !self.sequencer.is_current(ticket) {
                    tracing::debug!(
                        "Discarding stale {:?} results for ticket {}",
                        mode,
                        ticket.value()
                    );
                    return Vec::new();
                }
                self.loading = false;
                match mode {
                    SearchMode::Local => self.local_results = results,
                    SearchMode::External => self.external_results = results,
                }
                Vec::new()
            }
            Event::TreeLoaded(nodes) => {
                self.tree = Some(HierarchyBrowser::new(nodes));
                Vec::new()
            }
            Event::NodeToggled(path) => {
                if let Some(tree) = self.tree.as_mut() {
                    tree.toggle(&path);
                }
                Vec::new()
            }
            Event::CandidateSelected(index) => {
                if let Some(candidate) = self.current_results().get(index).cloned() {
                    self.selection = Some(Selection {
                        candidate,
                        price: self.default_price,
                        currency: self.default_currency,
                    });
                }
                Vec::new()
            }
            Event::PriceEdited(text) => {
                if let Some(selection) = self.selection.as_mut() {
                    selection.price = parse_price(&text);
                }
                Vec::new()
            }
            Event::CurrencyChanged(currency) => {
                if let Some(selection) = self.selection.as_mut() {
                    selection.currency = currency;
                }
                Vec::new()
            }
            Event::EstimatorClosed => {
                self.selection = None;
                Vec::new()
            }
            Event::UploadRequested(path) => {
                self.loading = true;
                vec![Command::Upload { path }]
            }
            Event::UploadFinished(outcome) => {
                self.loading = false;
                self.notice = Some(match outcome {
                    Ok(report) => sync_success_message(&report),
                    Err(reason) => {
                        tracing::error!("Error uploading: {}", reason);
                        SYNC_FAILURE_MESSAGE.to_string()
                    }
                });
                Vec::new()
            }
        }
    }

    fn issue_search(&mut self, query: String) -> Vec<Command> {
        self.query = query.clone();
        self.loading = true;
        self.selection = None;

        let ticket = self.sequencer.issue();
        let mut commands = vec![Command::Search {
            ticket,
            mode: self.mode,
            query,
        }];
        commands.extend(self.tree_command());
        commands
    }

    /// The tree is fetched once, the first time the local tab needs it.
    fn tree_command(&mut self) -> Option<Command> {
        if self.mode == SearchMode::Local && self.query.is_empty() && !self.tree_requested {
            self.tree_requested = true;
            Some(Command::LoadTree)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_ticket(commands: &[Command]) -> Ticket {
        commands
            .iter()
            .find_map(|c| match c {
                Command::Search { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("a search command")
    }

    fn laptop() -> Candidate {
        Candidate::new("8471.30.01", "Laptops")
            .with_duty_rate("2.5%")
            .with_match_score(90.0)
    }

    #[test]
    fn test_start_searches_empty_and_loads_tree_once() {
        let mut state = SessionState::default();
        let commands = state.apply(Event::Started);
        assert_eq!(commands.len(), 2);
        assert!(matches!(&commands[0], Command::Search { query, mode: SearchMode::Local, .. } if query.is_empty()));
        assert_eq!(commands[1], Command::LoadTree);
        assert_eq!(state.view(), View::Loading);

        let ticket = search_ticket(&commands);
        state.apply(Event::SearchCompleted {
            ticket,
            mode: SearchMode::Local,
            results: vec![laptop()],
        });
        assert_eq!(state.view(), View::Tree(None));

        let again = state.apply(Event::QueryEdited(String::new()));
        assert!(!again.contains(&Command::LoadTree));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut state = SessionState::default();
        let first = search_ticket(&state.apply(Event::SearchSubmitted("tablet".into())));
        let second = search_ticket(&state.apply(Event::SearchSubmitted("laptop".into())));

        state.apply(Event::SearchCompleted {
            ticket: second,
            mode: SearchMode::Local,
            results: vec![laptop()],
        });
        state.apply(Event::SearchCompleted {
            ticket: first,
            mode: SearchMode::Local,
            results: vec![Candidate::new("4202.11", "Tablet folder")],
        });

        assert_eq!(state.local_results().len(), 1);
        assert_eq!(state.local_results()[0].code, "8471.30.01");
        assert_eq!(state.query(), "laptop");
        assert!(matches!(state.view(), View::LocalResults(r) if r.len() == 1));
    }

    #[test]
    fn test_tab_switch_reissues_current_query() {
        let mut state = SessionState::default();
        state.apply(Event::SearchSubmitted("coffee".into()));

        let commands = state.apply(Event::TabSwitched(SearchMode::External));
        assert!(matches!(
            &commands[0],
            Command::Search { mode: SearchMode::External, query, .. } if query == "coffee"
        ));
        assert!(state.apply(Event::TabSwitched(SearchMode::External)).is_empty());
    }

    #[test]
    fn test_tab_switch_without_query_does_not_search() {
        let mut state = SessionState::default();
        let commands = state.apply(Event::TabSwitched(SearchMode::External));
        assert!(commands.is_empty());
        assert_eq!(
            state.view(),
            View::ExternalResults {
                results: &[],
                query_issued: false
            }
        );
    }

    #[test]
    fn test_editing_without_clearing_does_not_search() {
        let mut state = SessionState::default();
        assert!(state.apply(Event::QueryEdited("lap".into())).is_empty());
        assert_eq!(state.draft(), "lap");
        assert_eq!(state.query(), "");
    }

    #[test]
    fn test_suggestion_searches() {
        let mut state = SessionState::default();
        let commands = state.apply(Event::SuggestionChosen(2));
        assert!(matches!(&commands[0], Command::Search { query, .. } if query == "Apple iPad"));
        assert!(state.apply(Event::SuggestionChosen(42)).is_empty());
    }

    #[test]
    fn test_estimator_lifecycle() {
        let mut state = SessionState::default();
        let ticket = search_ticket(&state.apply(Event::SearchSubmitted("laptop".into())));
        state.apply(Event::SearchCompleted {
            ticket,
            mode: SearchMode::Local,
            results: vec![laptop()],
        });

        state.apply(Event::CandidateSelected(0));
        let est = state.estimate().unwrap();
        assert_eq!(est.price, 1000.0);
        assert!((est.costs.total_cost - 29.714).abs() < 1e-9);

        state.apply(Event::PriceEdited("not a number".into()));
        assert_eq!(state.estimate().unwrap().costs.total_cost, 0.0);

        state.apply(Event::PriceEdited("200".into()));
        state.apply(Event::CurrencyChanged(Currency::Eur));
        let est = state.estimate().unwrap();
        assert!((est.costs.duty_cost - 5.0).abs() < 1e-9);
        assert_eq!(est.currency, Currency::Eur);

        state.apply(Event::EstimatorClosed);
        assert!(state.estimate().is_none());
    }

    #[test]
    fn test_new_search_discards_selection() {
        let mut state = SessionState::default();
        let ticket = search_ticket(&state.apply(Event::SearchSubmitted("laptop".into())));
        state.apply(Event::SearchCompleted {
            ticket,
            mode: SearchMode::Local,
            results: vec![laptop()],
        });
        state.apply(Event::CandidateSelected(0));
        assert!(state.selection().is_some());

        state.apply(Event::SearchSubmitted("coffee".into()));
        assert!(state.selection().is_none());
        assert!(state.apply(Event::CandidateSelected(5)).is_empty());
        assert!(state.selection().is_none());
    }

    #[test]
    fn test_tree_toggle_through_events() {
        let mut state = SessionState::default();
        state.apply(Event::TreeLoaded(vec![HierarchyNode::new("Chapter 84", Some("84"))
            .with_children(vec![HierarchyNode::new("Computers", Some("8471"))])]));
        state.apply(Event::NodeToggled(vec![0]));
        assert_eq!(state.tree().unwrap().visible_rows().len(), 2);
    }

    #[test]
    fn test_upload_notices() {
        let mut state = SessionState::default();
        let commands = state.apply(Event::UploadRequested(PathBuf::from("tariffs.xlsx")));
        assert_eq!(
            commands,
            vec![Command::Upload {
                path: PathBuf::from("tariffs.xlsx")
            }]
        );
        assert!(state.is_loading());

        state.apply(Event::UploadFinished(Ok(SyncReport {
            rows: 7,
            status: Some("success".into()),
        })));
        assert!(!state.is_loading());
        assert_eq!(
            state.take_notice().as_deref(),
            Some("Sync Complete! Processed 7 rows.")
        );
        assert!(state.take_notice().is_none());

        state.apply(Event::UploadFinished(Err("connection refused".into())));
        assert_eq!(state.take_notice().as_deref(), Some("Error uploading file"));
    }
}
