//! Line commands of the interactive session.

use crate::app::presenter::{GridColumn, SortDirection};
use crate::app::state::{Event, SessionState};
use crate::core::estimator::Currency;
use crate::domain::model::SearchMode;
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  search <text>        search the active tab (empty text shows the hierarchy)
  clear                clear the search box
  tab local|external   switch between local search and the USITC API
  suggest <1-4>        run a suggested query
  toggle <row>         expand or collapse a hierarchy row
  select <n>           open the duty estimator for result n
  price <amount>       set the estimator price
  currency usd|eur     set the estimator currency
  close                close the estimator
  upload <file.xlsx>   sync a spreadsheet with the backend
  filter <col>=<text>  filter the grid (empty text removes the filter)
  sort <col> [asc]     sort the grid
  page <n>             show grid page n
  grid                 show the detailed grid
  help                 show this help
  quit                 leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Event(Event),
    Filter(GridColumn, String),
    Sort(GridColumn, SortDirection),
    Page(usize),
    ShowGrid,
    Help,
    Quit,
}

pub fn parse_input(line: &str, state: &SessionState) -> Result<Input, String> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((c, r)) => (c, r.trim()),
        None => (line, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "search" | "s" => Ok(Input::Event(Event::SearchSubmitted(rest.to_string()))),
        "clear" => Ok(Input::Event(Event::QueryEdited(String::new()))),
        "tab" => match rest.to_ascii_lowercase().as_str() {
            "local" => Ok(Input::Event(Event::TabSwitched(SearchMode::Local))),
            "external" | "api" | "usitc" => {
                Ok(Input::Event(Event::TabSwitched(SearchMode::External)))
            }
            other => Err(format!("unknown tab '{}'", other)),
        },
        "suggest" => {
            let n = parse_index(rest)?;
            Ok(Input::Event(Event::SuggestionChosen(n - 1)))
        }
        "toggle" | "t" => {
            let row = parse_index(rest)?;
            let path = state
                .tree()
                .and_then(|tree| tree.path_of_row(row))
                .ok_or_else(|| format!("no hierarchy row {}", row))?;
            Ok(Input::Event(Event::NodeToggled(path)))
        }
        "select" => {
            let n = parse_index(rest)?;
            if n > state.current_results().len() {
                return Err(format!("no result {}", n));
            }
            Ok(Input::Event(Event::CandidateSelected(n - 1)))
        }
        "price" => Ok(Input::Event(Event::PriceEdited(rest.to_string()))),
        "currency" => match rest.to_ascii_lowercase().as_str() {
            "usd" => Ok(Input::Event(Event::CurrencyChanged(Currency::Usd))),
            "eur" => Ok(Input::Event(Event::CurrencyChanged(Currency::Eur))),
            other => Err(format!("unknown currency '{}'", other)),
        },
        "close" => Ok(Input::Event(Event::EstimatorClosed)),
        "upload" | "sync" => {
            if rest.is_empty() {
                return Err("upload needs a file path".to_string());
            }
            Ok(Input::Event(Event::UploadRequested(PathBuf::from(rest))))
        }
        "filter" => {
            let (column, needle) = rest
                .split_once('=')
                .ok_or_else(|| "expected <column>=<text>".to_string())?;
            Ok(Input::Filter(column.trim().parse()?, needle.to_string()))
        }
        "sort" => {
            let mut parts = rest.split_whitespace();
            let column: GridColumn = parts
                .next()
                .ok_or_else(|| "sort needs a column".to_string())?
                .parse()?;
            let direction = match parts.next() {
                Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Ascending,
                _ => SortDirection::Descending,
            };
            Ok(Input::Sort(column, direction))
        }
        "page" => Ok(Input::Page(parse_index(rest)?)),
        "grid" => Ok(Input::ShowGrid),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" | "q" => Ok(Input::Quit),
        other => Err(format!("unknown command '{}', type 'help'", other)),
    }
}

fn parse_index(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("expected a number from 1, got '{}'", text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Candidate, HierarchyNode};

    #[test]
    fn test_search_and_tab_commands() {
        let state = SessionState::default();
        assert_eq!(
            parse_input("search  graphic tablet ", &state),
            Ok(Input::Event(Event::SearchSubmitted("graphic tablet".into())))
        );
        assert_eq!(
            parse_input("search", &state),
            Ok(Input::Event(Event::SearchSubmitted(String::new())))
        );
        assert_eq!(
            parse_input("tab usitc", &state),
            Ok(Input::Event(Event::TabSwitched(SearchMode::External)))
        );
        assert!(parse_input("tab moon", &state).is_err());
    }

    #[test]
    fn test_select_checks_range() {
        let mut state = SessionState::default();
        let commands = state.apply(Event::SearchSubmitted("laptop".into()));
        let ticket = match &commands[0] {
            crate::app::state::Command::Search { ticket, .. } => *ticket,
            other => panic!("unexpected command: {:?}", other),
        };
        state.apply(Event::SearchCompleted {
            ticket,
            mode: SearchMode::Local,
            results: vec![Candidate::new("8471.30.01", "Laptops")],
        });

        assert_eq!(
            parse_input("select 1", &state),
            Ok(Input::Event(Event::CandidateSelected(0)))
        );
        assert!(parse_input("select 2", &state).is_err());
        assert!(parse_input("select 0", &state).is_err());
    }

    #[test]
    fn test_toggle_maps_row_to_path() {
        let mut state = SessionState::default();
        state.apply(Event::TreeLoaded(vec![
            HierarchyNode::new("Chapter 84", Some("84")),
            HierarchyNode::new("Chapter 85", Some("85")),
        ]));
        assert_eq!(
            parse_input("toggle 2", &state),
            Ok(Input::Event(Event::NodeToggled(vec![1])))
        );
        assert!(parse_input("toggle 3", &state).is_err());
    }

    #[test]
    fn test_grid_commands() {
        let state = SessionState::default();
        assert_eq!(
            parse_input("filter description=tablet", &state),
            Ok(Input::Filter(GridColumn::Description, "tablet".into()))
        );
        assert_eq!(
            parse_input("sort code asc", &state),
            Ok(Input::Sort(GridColumn::Code, SortDirection::Ascending))
        );
        assert_eq!(parse_input("page 2", &state), Ok(Input::Page(2)));
        assert_eq!(parse_input("quit", &state), Ok(Input::Quit));
        assert!(parse_input("dance", &state).is_err());
    }
}
