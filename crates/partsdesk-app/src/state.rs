// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{
    AppMode, EditSession, EditState, Part, Quote, QuoteSortKey, QuoteStatus, QuoteTableView,
    SessionId, SortDirection, SubmitKind, SubmitOutcome, SubmitRequest,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub session: EditSession,
    pub table: QuoteTableView,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            session: EditSession::default(),
            table: QuoteTableView::default(),
            status_line: None,
        }
    }
}

#[derive(Debug)]
pub enum AppCommand {
    EditParts {
        quote: Box<Quote>,
        catalog: Vec<Part>,
    },
    EditQuote(Box<Quote>),
    /// The quote form was persisted; carries the reloaded quote.
    QuoteFieldsSaved(Box<Quote>),
    NewQuote,
    /// The new-quote form was persisted; carries the stored quote.
    QuoteCreated(Box<Quote>),
    /// Opens the catalog form for an existing part, or an empty one.
    EditCatalogPart(Option<Box<Part>>),
    CatalogPartSaved(Box<Part>),
    SaveParts,
    SendForReview,
    SubmitFinished {
        session_id: SessionId,
        result: Result<Quote>,
    },
    /// Cancels whatever is being edited.
    Escape,
    SortBy(QuoteSortKey),
    ToggleStatusFilter(QuoteStatus),
    SetSearch(String),
    NextPage { total_pages: usize },
    PrevPage,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    SubmitRequested(SubmitRequest),
    QuoteRefreshed(Box<Quote>),
    TableChanged,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn with_table(table: QuoteTableView) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    /// Validation failures come back as errors and leave the state untouched.
    pub fn dispatch(&mut self, command: AppCommand) -> Result<Vec<AppEvent>> {
        let events = match command {
            AppCommand::EditParts { quote, catalog } => {
                self.session.begin_parts(&quote, &catalog)?;
                let mut events = self.sync_mode();
                events.push(self.set_status(&format!("editing parts for {}", quote.quote_ref)));
                events
            }
            AppCommand::EditQuote(quote) => {
                self.session.begin_quote_fields(&quote)?;
                let mut events = self.sync_mode();
                events.push(self.set_status(&format!("editing {}", quote.quote_ref)));
                events
            }
            AppCommand::QuoteFieldsSaved(quote) => {
                if !self.session.finish_quote_fields(quote.id) {
                    bail!(
                        "{} is not being edited -- press i on the quote first",
                        quote.quote_ref
                    );
                }
                let message = format!("saved {}", quote.quote_ref);
                let mut events = self.sync_mode();
                events.push(AppEvent::QuoteRefreshed(quote));
                events.push(self.set_status(&message));
                events
            }
            AppCommand::NewQuote => {
                self.session.begin_new_quote()?;
                let mut events = self.sync_mode();
                events.push(self.set_status("new quote"));
                events
            }
            AppCommand::QuoteCreated(quote) => {
                if !self.session.finish_new_quote() {
                    bail!("no new quote is being drafted -- press a to start one");
                }
                let message = format!("created {}", quote.quote_ref);
                let mut events = self.sync_mode();
                events.push(AppEvent::QuoteRefreshed(quote));
                events.push(self.set_status(&message));
                events
            }
            AppCommand::EditCatalogPart(part) => {
                self.session.begin_catalog_part(part.as_deref())?;
                let message = match &part {
                    Some(part) => format!("editing part {}", part.name),
                    None => "new part".to_owned(),
                };
                let mut events = self.sync_mode();
                events.push(self.set_status(&message));
                events
            }
            AppCommand::CatalogPartSaved(part) => {
                if !self.session.finish_catalog_part(part.id) {
                    bail!(
                        "part {} is not being edited -- open it from the catalog first",
                        part.name
                    );
                }
                let mut events = self.sync_mode();
                events.push(self.set_status(&format!("saved part {}", part.name)));
                events
            }
            AppCommand::SaveParts => {
                let request = self.session.save()?;
                vec![
                    self.set_status("saving parts"),
                    AppEvent::SubmitRequested(request),
                ]
            }
            AppCommand::SendForReview => {
                let request = self.session.send_for_review()?;
                vec![
                    self.set_status("sending for review"),
                    AppEvent::SubmitRequested(request),
                ]
            }
            AppCommand::SubmitFinished { session_id, result } => {
                match self.session.complete_submit(session_id, result) {
                    SubmitOutcome::Stale => Vec::new(),
                    SubmitOutcome::Applied { kind, quote } => {
                        let message = match kind {
                            SubmitKind::Save => format!("saved {}", quote.quote_ref),
                            SubmitKind::SendForReview => {
                                format!("{} sent for review", quote.quote_ref)
                            }
                        };
                        let mut events = self.sync_mode();
                        events.push(AppEvent::QuoteRefreshed(quote));
                        events.push(self.set_status(&message));
                        events
                    }
                    SubmitOutcome::Failed { message, .. } => {
                        vec![self.set_status(&format!("save failed: {message}"))]
                    }
                }
            }
            AppCommand::Escape => {
                if self.session.cancel() {
                    let mut events = self.sync_mode();
                    events.push(self.set_status("edit cancelled"));
                    events
                } else {
                    self.status_line = None;
                    vec![AppEvent::StatusCleared]
                }
            }
            AppCommand::SortBy(key) => {
                self.table.sort_by(key);
                let direction = match self.table.direction {
                    SortDirection::Asc => "asc",
                    SortDirection::Desc => "desc",
                };
                vec![
                    AppEvent::TableChanged,
                    self.set_status(&format!("sort: {} {direction}", key.label())),
                ]
            }
            AppCommand::ToggleStatusFilter(status) => {
                self.table.filter.toggle_status(status);
                self.table.page = 0;
                vec![AppEvent::TableChanged]
            }
            AppCommand::SetSearch(search) => {
                self.table.filter.search = search;
                self.table.page = 0;
                vec![AppEvent::TableChanged]
            }
            AppCommand::NextPage { total_pages } => {
                self.table.next_page(total_pages);
                vec![AppEvent::TableChanged]
            }
            AppCommand::PrevPage => {
                self.table.prev_page();
                vec![AppEvent::TableChanged]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        };
        Ok(events)
    }

    fn sync_mode(&mut self) -> Vec<AppEvent> {
        let mode = match self.session.state() {
            EditState::Viewing => AppMode::Nav,
            EditState::EditingQuoteFields { .. } => AppMode::EditQuote,
            EditState::EditingParts(_) => AppMode::EditParts,
            EditState::EditingCatalogPart { .. } => AppMode::EditCatalogPart,
        };
        if mode == self.mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
