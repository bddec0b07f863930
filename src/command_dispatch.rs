//! Purpose: Hold top-level CLI command dispatch for `storefront`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: One-shot commands fetch through a fresh `Catalog` session and exit.
//! Invariants: Browse mode keeps one session, so its cache and debounce state persist across lines.

use super::*;
use record_json::{categories_json, page_json, record_json, screen_json};
use std::fmt;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Instant;
use storefront::api::{
    Catalog, CategoryFilter, DetailScreen, ListQueryState, ListingView, QueryState, RawDraft,
    detail, project, submit_create,
};

pub(super) fn dispatch_command(
    command: Command,
    config: &CatalogConfig,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "storefront", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::List {
            search,
            category,
            sort,
            page,
        } => {
            if page == 0 {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("--page must be at least 1")
                    .with_hint("Pages are numbered from 1."));
            }
            let catalog = Catalog::connect(config)?;
            let records = ready(catalog.list_records())?;
            let mut state = ListQueryState::new(config.page_size);
            state.set_search_text(search);
            state.set_category(CategoryFilter::parse(&category));
            state.set_sort(sort.into());
            state.set_page(page);
            emit_json(page_json(&project(&records, &state)), color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Categories => {
            let catalog = Catalog::connect(config)?;
            let categories = ready(catalog.list_categories())?;
            emit_json(categories_json(&categories), color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Get { id } => {
            let catalog = Catalog::connect(config)?;
            match detail(&catalog, id) {
                DetailScreen::Ready(record) => {
                    emit_json(record_json(&record), color_mode);
                    Ok(RunOutcome::ok())
                }
                DetailScreen::NotFound(id) => Err(Error::new(ErrorKind::NotFound)
                    .with_message("product not found")
                    .with_id(id)),
                DetailScreen::Failed(err) => Err(detach(err)),
                DetailScreen::Loading => Err(Error::new(ErrorKind::Internal)
                    .with_message("product lookup did not settle")
                    .with_id(id)),
            }
        }
        Command::Create {
            title,
            price,
            description,
            image,
            category,
        } => {
            let catalog = Catalog::connect(config)?;
            let raw = RawDraft {
                title,
                price,
                description,
                image,
                category,
            };
            let created = submit_create(&catalog, &raw)?;
            emit_json(json!({ "id": created.id }), color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Browse => {
            let catalog = Catalog::connect(config)?;
            browse(ListingView::new(catalog, config), color_mode)
        }
    }
}

fn ready<T>(state: QueryState<T>) -> Result<T, Error> {
    if let Some(err) = state.error {
        return Err(detach(err));
    }
    state.data.ok_or_else(|| {
        Error::new(ErrorKind::Internal).with_message("catalog read finished without data")
    })
}

// Cache entries share their error; take it back when this is the last handle.
fn detach(err: Arc<Error>) -> Error {
    Arc::try_unwrap(err).unwrap_or_else(|shared| {
        let mut copy = Error::new(shared.kind()).with_fields(shared.fields().to_vec());
        if let Some(message) = shared.message() {
            copy = copy.with_message(message);
        }
        if let Some(hint) = shared.hint() {
            copy = copy.with_hint(hint);
        }
        if let Some(status) = shared.status() {
            copy = copy.with_status(status);
        }
        if let Some(id) = shared.id() {
            copy = copy.with_id(id);
        }
        if let Some(source) = shared.source() {
            copy = copy.with_source(CauseText::capture(source));
        }
        copy
    })
}

/// Rendered copy of a source chain that cannot be moved out of a shared error.
#[derive(Debug)]
struct CauseText {
    message: String,
    next: Option<Box<CauseText>>,
}

impl CauseText {
    fn capture(err: &(dyn StdError + 'static)) -> Self {
        Self {
            message: err.to_string(),
            next: err.source().map(|next| Box::new(Self::capture(next))),
        }
    }
}

impl fmt::Display for CauseText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for CauseText {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.next
            .as_deref()
            .map(|next| next as &(dyn StdError + 'static))
    }
}

#[derive(Debug, PartialEq)]
enum BrowseCommand {
    Search(String),
    Category(CategoryFilter),
    Sort(SortOrder),
    Next,
    Prev,
    Refresh,
    Quit,
}

fn parse_browse_command(line: &str) -> Result<BrowseCommand, Error> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    match verb {
        "search" => Ok(BrowseCommand::Search(rest.to_string())),
        "category" if !rest.trim().is_empty() => {
            Ok(BrowseCommand::Category(CategoryFilter::parse(rest.trim())))
        }
        "sort" => rest.trim().parse().map(BrowseCommand::Sort).map_err(|message: String| {
            Error::new(ErrorKind::Usage).with_message(message)
        }),
        "next" => Ok(BrowseCommand::Next),
        "prev" => Ok(BrowseCommand::Prev),
        "refresh" => Ok(BrowseCommand::Refresh),
        "quit" | "exit" => Ok(BrowseCommand::Quit),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("unrecognized browse input: {line}"))
            .with_hint("Use search|category|sort|next|prev|refresh|quit.")),
    }
}

fn browse(mut view: ListingView, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    emit_screen(&view);
    loop {
        let line = match view.search_deadline() {
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(line) => Some(line),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => {
                        if view.tick(deadline) {
                            emit_screen(&view);
                        }
                        break;
                    }
                }
            }
            None => match rx.recv() {
                Ok(line) => Some(line),
                Err(_) => break,
            },
        };

        let now = Instant::now();
        let mut changed = false;
        if let Some(line) = line {
            if line.trim().is_empty() {
                continue;
            }
            match parse_browse_command(&line) {
                Ok(BrowseCommand::Quit) => break,
                Ok(command) => changed = apply_browse_command(&mut view, command, now),
                Err(err) => emit_error(&err, color_mode),
            }
        }
        if view.tick(now) {
            changed = true;
        }
        if changed {
            emit_screen(&view);
        }
    }
    Ok(RunOutcome::ok())
}

fn apply_browse_command(view: &mut ListingView, command: BrowseCommand, now: Instant) -> bool {
    match command {
        BrowseCommand::Search(text) => {
            view.type_search(text, now);
            false
        }
        BrowseCommand::Category(category) => {
            view.set_category(category);
            true
        }
        BrowseCommand::Sort(sort) => {
            view.set_sort(sort);
            true
        }
        BrowseCommand::Next => view.next_page(),
        BrowseCommand::Prev => view.prev_page(),
        BrowseCommand::Refresh => {
            view.refresh();
            true
        }
        BrowseCommand::Quit => false,
    }
}

// Browse output stays line-delimited even on a terminal.
fn emit_screen(view: &ListingView) {
    let screen = view.render();
    let value = screen_json(&screen, view.query());
    println!(
        "{}",
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    );
}

#[cfg(test)]
mod tests {
    use super::{BrowseCommand, detach, parse_browse_command};
    use crate::error_causes;
    use std::io;
    use std::sync::Arc;
    use storefront::api::{CategoryFilter, Error, ErrorKind, SortOrder};

    #[test]
    fn browse_lines_parse_into_commands() {
        assert_eq!(
            parse_browse_command("search Red Shirt").expect("search"),
            BrowseCommand::Search("Red Shirt".to_string())
        );
        assert_eq!(
            parse_browse_command("search").expect("empty search"),
            BrowseCommand::Search(String::new())
        );
        assert_eq!(
            parse_browse_command("category men's clothing").expect("category"),
            BrowseCommand::Category(CategoryFilter::Only("men's clothing".to_string()))
        );
        assert_eq!(
            parse_browse_command("category all").expect("all"),
            BrowseCommand::Category(CategoryFilter::All)
        );
        assert_eq!(
            parse_browse_command("sort desc").expect("sort"),
            BrowseCommand::Sort(SortOrder::PriceDescending)
        );
        assert_eq!(parse_browse_command("next\r").expect("next"), BrowseCommand::Next);
    }

    #[test]
    fn browse_rejects_unknown_input() {
        let err = parse_browse_command("jump 4").expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = parse_browse_command("sort cheapest").expect_err("bad sort");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(parse_browse_command("category").is_err());
    }

    #[test]
    fn detach_copies_shared_errors() {
        let shared = Arc::new(
            Error::new(ErrorKind::Transport)
                .with_message("catalog error status 500")
                .with_status(500),
        );
        let keep = Arc::clone(&shared);
        let err = detach(shared);
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.message(), keep.message());
    }

    #[test]
    fn detach_keeps_causes_of_shared_errors() {
        let shared = Arc::new(
            Error::new(ErrorKind::Transport)
                .with_message("request failed")
                .with_source(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
        );
        let _keep = Arc::clone(&shared);
        let err = detach(shared);
        assert_eq!(error_causes(&err), vec!["refused".to_string()]);
    }
}
