use anyhow::Context;
use clap::Parser;
use hts_tracker::app::export::export_csv_file;
use hts_tracker::app::input::{parse_input, Input, HELP};
use hts_tracker::app::presenter::{
    render_estimate, render_external, render_ranked, render_tree, sync_success_message, GridView,
    LOADING_MESSAGE, SYNC_FAILURE_MESSAGE,
};
use hts_tracker::app::session::relay_upload;
use hts_tracker::app::state::{View, SUGGESTED_QUERIES};
use hts_tracker::app::tree::HierarchyBrowser;
use hts_tracker::config::cli::{Commands, SearchArgs};
use hts_tracker::config::toml_config::TomlConfig;
use hts_tracker::core::estimator::parse_price;
use hts_tracker::utils::error::ErrorSeverity;
use hts_tracker::utils::{logger, validation::Validate};
use hts_tracker::{
    Candidate, ClassificationGateway, CliConfig, DutyEstimate, Event, HttpGateway, SearchMode,
    Session, SessionState, Settings, TrackerError,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose, config.log_json);
    tracing::debug!("CLI config: {:?}", config);

    let settings = match load_settings(&config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let gateway = match HttpGateway::new(&settings) {
        Ok(gateway) => gateway,
        Err(e) => exit_with(e),
    };
    tracing::info!("Using classification service at {}", gateway.base_url());

    let outcome = match config.command {
        Commands::Search(args) => run_search(&gateway, &settings, &args, config.json).await,
        Commands::Tree { expand_all, find } => {
            run_tree(&gateway, expand_all, find.as_deref(), config.json).await
        }
        Commands::Estimate {
            code,
            rate,
            price,
            currency,
        } => {
            let candidate = match (code, rate) {
                (Some(code), _) => lookup_code(&gateway, &code).await,
                (None, Some(rate)) => Ok(Candidate::new("-", "Manual rate").with_duty_rate(rate)),
                (None, None) => Err(TrackerError::ValidationError {
                    message: "estimate needs --code or --rate".to_string(),
                }),
            };
            candidate.and_then(|candidate| {
                let price = price.as_deref().map_or(settings.default_price, parse_price);
                let currency = currency.unwrap_or(settings.currency);
                let estimate = DutyEstimate::for_candidate(&candidate, price, currency);
                print_out(config.json, &estimate, || render_estimate(&estimate))
            })
        }
        Commands::Sync { file } => match relay_upload(&gateway, &file).await {
            Ok(report) => print_out(config.json, &report, || sync_success_message(&report)),
            Err(e) => {
                eprintln!("{}", SYNC_FAILURE_MESSAGE);
                Err(e)
            }
        },
        Commands::Export { search, output } => {
            let mode = search.mode.unwrap_or(settings.default_mode);
            let results = gateway.search(mode, &search.query_text()).await;
            let rows = search.grid_view(settings.page_size).rows(&results);
            export_csv_file(&rows, &output).map(|count| {
                println!("✅ Exported {} rows to {}", count, output.display());
            })
        }
        Commands::Session => {
            return run_session(gateway, &settings)
                .await
                .context("interactive session failed");
        }
    };

    if let Err(e) = outcome {
        exit_with(e);
    }
    Ok(())
}

fn load_settings(config: &CliConfig) -> hts_tracker::Result<Settings> {
    let file = match &config.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            TomlConfig::from_file(path)?
        }
        None => TomlConfig::default(),
    };
    let settings = Settings::from_file_config(file)
        .with_overrides(config.api_base.clone(), config.timeout_secs);
    settings.validate()?;
    Ok(settings)
}

fn exit_with(e: TrackerError) -> ! {
    tracing::error!(
        "Command failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn print_out<T: Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce() -> String,
) -> hts_tracker::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

async fn run_search(
    gateway: &HttpGateway,
    settings: &Settings,
    args: &SearchArgs,
    json: bool,
) -> hts_tracker::Result<()> {
    let mode = args.mode.unwrap_or(settings.default_mode);
    let query = args.query_text();
    let results = gateway.search(mode, &query).await;
    tracing::info!("{} returned {} candidates", mode, results.len());

    if json {
        let rows = args.grid_view(settings.page_size).rows(&results);
        return print_out(true, &rows, String::new);
    }

    let text = match mode {
        SearchMode::External => {
            render_external(&results, settings.external_row_limit, !query.is_empty())
        }
        SearchMode::Local if args.grid => args.grid_view(settings.page_size).render(&results),
        SearchMode::Local => {
            render_ranked(&results).unwrap_or_else(|| "No results found.".to_string())
        }
    };
    println!("{}", text);
    Ok(())
}

async fn run_tree(
    gateway: &HttpGateway,
    expand_all: bool,
    find: Option<&str>,
    json: bool,
) -> hts_tracker::Result<()> {
    let mut browser = HierarchyBrowser::new(gateway.fetch_tree().await);
    if json {
        return print_out(true, &browser.roots(), String::new);
    }
    if browser.is_empty() {
        println!("{}", render_tree(Some(&browser)));
        return Ok(());
    }

    if expand_all {
        browser.expand_all();
    }
    if let Some(code) = find {
        match browser.find_by_code(code) {
            Some(path) => browser.reveal(&path),
            None => {
                return Err(TrackerError::ValidationError {
                    message: format!("no hierarchy node with code '{}'", code),
                })
            }
        }
    }
    println!("{}", browser.render());
    Ok(())
}

/// Exact code match from the local search, else its best candidate.
async fn lookup_code(gateway: &HttpGateway, code: &str) -> hts_tracker::Result<Candidate> {
    let mut results = gateway.search_local(code).await;
    let exact = results.iter().position(|c| c.code == code);
    match exact {
        Some(i) => Ok(results.swap_remove(i)),
        None if !results.is_empty() => Ok(results.swap_remove(0)),
        None => Err(TrackerError::ValidationError {
            message: format!("no classification found for '{}'", code),
        }),
    }
}

async fn run_session(gateway: HttpGateway, settings: &Settings) -> anyhow::Result<()> {
    let state = SessionState::new(settings.default_mode, settings.default_price, settings.currency);
    let mut session = Session::new(gateway, state);
    let mut grid = GridView::new(settings.page_size);
    let mut show_grid = false;

    println!("HTS Tracker: search, browse and estimate. Type 'help' for commands.");
    println!("Try: {}", SUGGESTED_QUERIES.join(" | "));
    session.dispatch(Event::Started).await;
    render_session(&mut session, &grid, show_grid, settings);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_input(&line, session.state()) {
            Ok(Input::Quit) => break,
            Ok(Input::Help) => {
                println!("{}", HELP);
                continue;
            }
            Ok(Input::Event(event)) => {
                if matches!(event, Event::SearchSubmitted(_) | Event::TabSwitched(_)) {
                    grid.go_to_page(0);
                }
                session.dispatch(event).await;
            }
            Ok(Input::Filter(column, needle)) => {
                grid.set_filter(column, &needle);
                show_grid = true;
            }
            Ok(Input::Sort(column, direction)) => {
                grid.sort_by(column, direction);
                show_grid = true;
            }
            Ok(Input::Page(page)) => {
                grid.go_to_page(page - 1);
                show_grid = true;
            }
            Ok(Input::ShowGrid) => show_grid = true,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        }
        render_session(&mut session, &grid, show_grid, settings);
    }
    Ok(())
}

fn render_session(
    session: &mut Session<HttpGateway>,
    grid: &GridView,
    show_grid: bool,
    settings: &Settings,
) {
    let state = session.state();
    println!("[{}]", state.mode());
    match state.view() {
        View::Loading => println!("{}", LOADING_MESSAGE),
        View::Tree(tree) => println!("{}", render_tree(tree)),
        View::LocalResults(results) => {
            match render_ranked(results) {
                Some(table) => println!("{}", table),
                None => println!("No results found."),
            }
            if show_grid {
                println!("{}", grid.render(results));
            }
        }
        View::ExternalResults {
            results,
            query_issued,
        } => println!(
            "{}",
            render_external(results, settings.external_row_limit, query_issued)
        ),
    }

    if let Some(estimate) = state.estimate() {
        println!("{}", render_estimate(&estimate));
    }
    if let Some(notice) = session.state_mut().take_notice() {
        println!("{}", notice);
    }
}
