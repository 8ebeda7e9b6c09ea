// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use partsdesk_app::pricing;
use partsdesk_app::{
    ActionKind, AppCommand, AppEvent, AppMode, AppState, DeadlineInfo, DeadlineTier, EditState,
    Part, PartField, PartFormInput, PartId, PartsBatch, PartsSession, Quote, QuoteField,
    QuoteFormInput, QuoteId, QuoteRow, QuoteStatus, QuoteTablePage, SortDirection, StatusAction,
    SubmitKind, SubmitRequest, VariantEdit, VariantId,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use time::{OffsetDateTime, UtcOffset};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
/// Countdowns only show whole minutes, so the clock advances once a minute.
const DEADLINE_TICK: Duration = Duration::from_secs(60);
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);

pub trait AppRuntime {
    fn load_quotes(&mut self) -> Result<Vec<Quote>>;
    fn load_catalog(&mut self) -> Result<Vec<Part>>;
    /// Persists a parts batch atomically and returns the reloaded quote.
    fn submit_parts(&mut self, quote_id: QuoteId, batch: &PartsBatch) -> Result<Quote>;
    fn save_quote_fields(&mut self, quote_id: QuoteId, form: &QuoteFormInput) -> Result<Quote>;
    fn create_quote(&mut self, form: &QuoteFormInput) -> Result<Quote>;
    fn create_part(&mut self, form: &PartFormInput) -> Result<Part>;
    fn update_part(&mut self, part_id: PartId, form: &PartFormInput) -> Result<Part>;
    fn apply_status_action(
        &mut self,
        quote_id: QuoteId,
        action: StatusAction,
    ) -> Result<QuoteStatus>;
    fn record_action(&mut self, quote_id: QuoteId, kind: ActionKind) -> Result<()>;
    fn local_offset(&self) -> UtcOffset {
        UtcOffset::UTC
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PartsColumn {
    Number,
    Note,
    #[default]
    FinalPrice,
    ListPrice,
    Aftermarket,
}

impl PartsColumn {
    const ALL: [Self; 5] = [
        Self::Number,
        Self::Note,
        Self::FinalPrice,
        Self::ListPrice,
        Self::Aftermarket,
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Note => "note",
            Self::FinalPrice => "final",
            Self::ListPrice => "list",
            Self::Aftermarket => "am/oem",
        }
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|column| *column == self)
            .unwrap_or(0)
    }

    fn shifted(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let index = (self.index() as isize + delta).rem_euclid(len);
        Self::ALL[index as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct PartsCursor {
    row: usize,
    column: PartsColumn,
}

/// One rendered line of the parts editor.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PartsRow {
    part_id: PartId,
    variant_id: VariantId,
    first_of_part: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputTarget {
    Search,
    QuoteField(QuoteField),
    CatalogField(PartField),
    PartNumber(PartId),
    Variant {
        part_id: PartId,
        variant_id: VariantId,
        column: PartsColumn,
    },
}

impl InputTarget {
    fn label(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::QuoteField(field) => field.label(),
            Self::CatalogField(field) => field.label(),
            Self::PartNumber(_) => "part number",
            Self::Variant { column, .. } => column.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InputState {
    target: InputTarget,
    buffer: String,
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    quotes: Vec<Quote>,
    now: OffsetDateTime,
    selected_row: usize,
    parts_cursor: PartsCursor,
    quote_field_index: usize,
    /// Catalog backing the part picker and the catalog browser.
    catalog: Vec<Part>,
    /// Cursor of the part picker over the quote form; `None` when closed.
    part_picker: Option<usize>,
    /// Cursor of the catalog browser; `None` when closed.
    catalog_cursor: Option<usize>,
    part_field_index: usize,
    input: Option<InputState>,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn new(now: OffsetDateTime) -> Self {
        Self {
            quotes: Vec::new(),
            now,
            selected_row: 0,
            parts_cursor: PartsCursor::default(),
            quote_field_index: 0,
            catalog: Vec::new(),
            part_picker: None,
            catalog_cursor: None,
            part_field_index: 0,
            input: None,
            help_visible: false,
            status_token: 0,
        }
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(local_now(runtime));
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = reload_quotes(state, runtime, &mut view_data) {
        tracing::error!(error = %format!("{error:#}"), "initial quote load failed");
        emit_status(
            state,
            &mut view_data,
            &internal_tx,
            format!("load failed: {error:#}"),
        );
    }

    let mut last_tick = Instant::now();
    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if last_tick.elapsed() >= DEADLINE_TICK {
            view_data.now = local_now(runtime);
            last_tick = Instant::now();
        }

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(POLL_INTERVAL).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn local_now<R: AppRuntime>(runtime: &R) -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(runtime.local_offset())
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                let _ = state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn bump_status_token(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    if state.dispatch(AppCommand::SetStatus(message.into())).is_ok() {
        bump_status_token(view_data, internal_tx);
    }
}

fn dispatch<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    match state.dispatch(command) {
        Ok(events) => handle_app_events(state, runtime, view_data, internal_tx, events),
        Err(error) => emit_status(state, view_data, internal_tx, format!("{error:#}")),
    }
}

fn handle_app_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: Vec<AppEvent>,
) {
    let mut status_changed = false;
    for event in events {
        match event {
            AppEvent::SubmitRequested(request) => {
                submit_parts(state, runtime, view_data, internal_tx, request);
            }
            AppEvent::QuoteRefreshed(quote) => replace_quote(view_data, *quote),
            AppEvent::ModeChanged(AppMode::EditParts) => {
                view_data.parts_cursor = PartsCursor::default();
            }
            AppEvent::ModeChanged(AppMode::EditQuote) => {
                view_data.quote_field_index = 0;
                view_data.part_picker = None;
            }
            AppEvent::ModeChanged(AppMode::EditCatalogPart) => view_data.part_field_index = 0,
            AppEvent::ModeChanged(AppMode::Nav) => {
                view_data.input = None;
                view_data.part_picker = None;
            }
            AppEvent::TableChanged => clamp_selection(state, view_data),
            AppEvent::StatusUpdated(_) => status_changed = true,
            AppEvent::StatusCleared => {}
        }
    }
    if status_changed {
        bump_status_token(view_data, internal_tx);
    }
}

fn submit_parts<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    request: SubmitRequest,
) {
    let quote_id = request.quote_id;
    let result = runtime.submit_parts(quote_id, &request.batch);
    match &result {
        Ok(_) if request.kind == SubmitKind::SendForReview => {
            track_action(runtime, quote_id, ActionKind::Priced);
        }
        Ok(_) => {}
        Err(error) => {
            tracing::error!(
                quote_id = quote_id.get(),
                operations = request.batch.operations.len(),
                error = %format!("{error:#}"),
                "parts submit failed"
            );
        }
    }
    dispatch(
        state,
        runtime,
        view_data,
        internal_tx,
        AppCommand::SubmitFinished {
            session_id: request.session_id,
            result,
        },
    );
}

/// Action history is informational; a failed write never undoes the edit.
fn track_action<R: AppRuntime>(runtime: &mut R, quote_id: QuoteId, kind: ActionKind) {
    if let Err(error) = runtime.record_action(quote_id, kind) {
        tracing::warn!(
            quote_id = quote_id.get(),
            action = kind.as_str(),
            error = %format!("{error:#}"),
            "could not record quote action"
        );
    }
}

fn replace_quote(view_data: &mut ViewData, quote: Quote) {
    match view_data
        .quotes
        .iter_mut()
        .find(|existing| existing.id == quote.id)
    {
        Some(existing) => *existing = quote,
        None => view_data.quotes.push(quote),
    }
}

fn reload_quotes<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    view_data.quotes = runtime.load_quotes()?;
    view_data.now = local_now(runtime);
    clamp_selection(state, view_data);
    Ok(())
}

fn current_page(state: &AppState, view_data: &ViewData) -> QuoteTablePage {
    state.table.project(&view_data.quotes, view_data.now)
}

fn clamp_selection(state: &AppState, view_data: &mut ViewData) {
    let rows = current_page(state, view_data).rows.len();
    view_data.selected_row = view_data.selected_row.min(rows.saturating_sub(1));
}

fn selected_quote<'a>(state: &AppState, view_data: &'a ViewData) -> Option<&'a Quote> {
    let page = current_page(state, view_data);
    let row = page.rows.get(view_data.selected_row)?;
    view_data.quotes.iter().find(|quote| quote.id == row.id)
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.input.is_some() {
        handle_input_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if key.code == KeyCode::Char('?') {
        view_data.help_visible = true;
        return false;
    }

    match state.mode {
        AppMode::Nav if view_data.catalog_cursor.is_some() => {
            handle_catalog_key(state, runtime, view_data, internal_tx, key);
        }
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
        AppMode::EditParts => handle_parts_key(state, runtime, view_data, internal_tx, key),
        AppMode::EditQuote if view_data.part_picker.is_some() => {
            handle_part_picker_key(state, view_data, key);
        }
        AppMode::EditQuote => handle_quote_form_key(state, runtime, view_data, internal_tx, key),
        AppMode::EditCatalogPart => {
            handle_catalog_form_key(state, runtime, view_data, internal_tx, key);
        }
    }
    false
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => move_selection(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_selection(state, view_data, -1),
        KeyCode::Char('n') | KeyCode::PageDown => {
            let total_pages = current_page(state, view_data).total_pages;
            view_data.selected_row = 0;
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::NextPage { total_pages },
            );
        }
        KeyCode::Char('p') | KeyCode::PageUp => {
            view_data.selected_row = 0;
            dispatch(state, runtime, view_data, internal_tx, AppCommand::PrevPage);
        }
        KeyCode::Char('s') => {
            let key = state.table.sort_key.next();
            dispatch(state, runtime, view_data, internal_tx, AppCommand::SortBy(key));
        }
        KeyCode::Char('S') => {
            let key = state.table.sort_key;
            dispatch(state, runtime, view_data, internal_tx, AppCommand::SortBy(key));
        }
        KeyCode::Char(digit @ '1'..='7') => {
            let index = digit as usize - '1' as usize;
            if let Some(status) = QuoteStatus::ALL.get(index).copied() {
                view_data.selected_row = 0;
                dispatch(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    AppCommand::ToggleStatusFilter(status),
                );
            }
        }
        KeyCode::Char('/') => {
            view_data.input = Some(InputState {
                target: InputTarget::Search,
                buffer: state.table.filter.search.clone(),
            });
        }
        KeyCode::Char('a') => dispatch(state, runtime, view_data, internal_tx, AppCommand::NewQuote),
        KeyCode::Char('P') => {
            if refresh_catalog(state, runtime, view_data, internal_tx) {
                view_data.catalog_cursor = Some(0);
            }
        }
        KeyCode::Char('e') => begin_parts_edit(state, runtime, view_data, internal_tx),
        KeyCode::Char('i') => {
            let Some(quote) = selected_quote(state, view_data).cloned() else {
                emit_status(state, view_data, internal_tx, NO_QUOTE_SELECTED);
                return;
            };
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::EditQuote(Box::new(quote)),
            );
        }
        KeyCode::Char('v') => {
            apply_status_action(state, runtime, view_data, internal_tx, StatusAction::Verify);
        }
        KeyCode::Char('c') => apply_status_action(
            state,
            runtime,
            view_data,
            internal_tx,
            StatusAction::MarkCompleted,
        ),
        KeyCode::Char('o') => apply_status_action(
            state,
            runtime,
            view_data,
            internal_tx,
            StatusAction::MarkOrdered,
        ),
        KeyCode::Char('d') => apply_status_action(
            state,
            runtime,
            view_data,
            internal_tx,
            StatusAction::MarkDelivered,
        ),
        KeyCode::Char('w') => apply_status_action(
            state,
            runtime,
            view_data,
            internal_tx,
            StatusAction::MarkWrong,
        ),
        KeyCode::Char('r') => match reload_quotes(state, runtime, view_data) {
            Ok(()) => emit_status(state, view_data, internal_tx, "reloaded"),
            Err(error) => {
                tracing::error!(error = %format!("{error:#}"), "quote reload failed");
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("load failed: {error:#}"),
                );
            }
        },
        KeyCode::Esc => dispatch(state, runtime, view_data, internal_tx, AppCommand::Escape),
        _ => {}
    }
}

const NO_QUOTE_SELECTED: &str = "no quote selected -- choose a quote and retry";

fn move_selection(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let rows = current_page(state, view_data).rows.len();
    view_data.selected_row = move_cursor(view_data.selected_row, rows, delta);
}

fn begin_parts_edit<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(quote) = selected_quote(state, view_data).cloned() else {
        emit_status(state, view_data, internal_tx, NO_QUOTE_SELECTED);
        return;
    };
    let catalog = match runtime.load_catalog() {
        Ok(catalog) => catalog,
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "catalog load failed");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("load failed: {error:#}"),
            );
            return;
        }
    };
    dispatch(
        state,
        runtime,
        view_data,
        internal_tx,
        AppCommand::EditParts {
            quote: Box::new(quote),
            catalog,
        },
    );
}

fn apply_status_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: StatusAction,
) {
    let Some((quote_id, quote_ref)) = selected_quote(state, view_data)
        .map(|quote| (quote.id, quote.quote_ref.clone()))
    else {
        emit_status(state, view_data, internal_tx, NO_QUOTE_SELECTED);
        return;
    };

    match runtime.apply_status_action(quote_id, action) {
        Ok(status) => {
            if action == StatusAction::Verify {
                track_action(runtime, quote_id, ActionKind::Verified);
            }
            if let Err(error) = reload_quotes(state, runtime, view_data) {
                tracing::error!(error = %format!("{error:#}"), "quote reload failed");
            }
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{quote_ref} is now {}", status.label()),
            );
        }
        Err(error) => emit_status(state, view_data, internal_tx, format!("{error:#}")),
    }
}

fn parts_rows(session: &PartsSession) -> Vec<PartsRow> {
    session
        .draft
        .parts
        .iter()
        .flat_map(|part| {
            part.variants
                .iter()
                .enumerate()
                .map(move |(index, variant)| PartsRow {
                    part_id: part.part_id,
                    variant_id: variant.id.clone(),
                    first_of_part: index == 0,
                })
        })
        .collect()
}

fn handle_parts_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(session) = state.session.parts() else {
        return;
    };
    let rows = parts_rows(session);
    let pending = session.pending().is_some();
    let cursor = view_data.parts_cursor;
    let current = rows.get(cursor.row).cloned();

    match key.code {
        KeyCode::Esc => dispatch(state, runtime, view_data, internal_tx, AppCommand::Escape),
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.parts_cursor.row = (cursor.row + 1).min(rows.len().saturating_sub(1));
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.parts_cursor.row = cursor.row.saturating_sub(1);
        }
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
            view_data.parts_cursor.column = cursor.column.shifted(1);
        }
        KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
            view_data.parts_cursor.column = cursor.column.shifted(-1);
        }
        _ if pending => emit_status(
            state,
            view_data,
            internal_tx,
            "save already in progress -- wait for it to finish",
        ),
        KeyCode::Enter => {
            if let Some(row) = current {
                begin_parts_input(state, view_data, internal_tx, row, cursor.column);
            }
        }
        KeyCode::Char('t') => {
            if let Some(row) = current {
                toggle_aftermarket(state, view_data, internal_tx, &row);
            }
        }
        KeyCode::Char('a') => {
            let Some(row) = current else {
                return;
            };
            match state.session.add_variant(row.part_id) {
                Ok(variant_id) => {
                    if let Some(index) = state.session.parts().and_then(|session| {
                        parts_rows(session)
                            .iter()
                            .position(|row| row.variant_id == variant_id)
                    }) {
                        view_data.parts_cursor.row = index;
                    }
                }
                Err(error) => emit_status(state, view_data, internal_tx, format!("{error:#}")),
            }
        }
        KeyCode::Char('x') => {
            let Some(row) = current else {
                return;
            };
            if let Err(error) = state.session.remove_variant(row.part_id, &row.variant_id) {
                emit_status(state, view_data, internal_tx, format!("{error:#}"));
                return;
            }
            let remaining = state.session.parts().map_or(0, |session| {
                session.draft.variant_count()
            });
            view_data.parts_cursor.row = cursor.row.min(remaining.saturating_sub(1));
        }
        KeyCode::Char('s') => {
            dispatch(state, runtime, view_data, internal_tx, AppCommand::SaveParts);
        }
        KeyCode::Char('r') => {
            dispatch(state, runtime, view_data, internal_tx, AppCommand::SendForReview);
        }
        _ => {}
    }
}

fn toggle_aftermarket(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    row: &PartsRow,
) {
    let af = state
        .session
        .parts()
        .and_then(|session| session.draft.part(row.part_id))
        .and_then(|part| part.variant(&row.variant_id))
        .is_some_and(|variant| variant.af);
    if let Err(error) =
        state
            .session
            .edit_variant(row.part_id, &row.variant_id, VariantEdit::Aftermarket(!af))
    {
        emit_status(state, view_data, internal_tx, format!("{error:#}"));
    }
}

fn begin_parts_input(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    row: PartsRow,
    column: PartsColumn,
) {
    if column == PartsColumn::Aftermarket {
        toggle_aftermarket(state, view_data, internal_tx, &row);
        return;
    }
    let Some(part) = state
        .session
        .parts()
        .and_then(|session| session.draft.part(row.part_id))
    else {
        return;
    };
    let variant = part.variant(&row.variant_id);
    let (target, buffer) = match column {
        PartsColumn::Number => (
            InputTarget::PartNumber(row.part_id),
            part.part_level.number.clone(),
        ),
        _ => (
            InputTarget::Variant {
                part_id: row.part_id,
                variant_id: row.variant_id.clone(),
                column,
            },
            match column {
                PartsColumn::Note => variant.map(|v| v.note.clone()).unwrap_or_default(),
                PartsColumn::FinalPrice => price_input_text(variant.and_then(|v| v.final_price_cents)),
                _ => price_input_text(variant.and_then(|v| v.list_price_cents)),
            },
        ),
    };
    view_data.input = Some(InputState { target, buffer });
}

/// Raw amount for editing; unlike the display form it keeps sentinel values.
fn price_input_text(cents: Option<i64>) -> String {
    cents
        .map(|value| format!("{}.{:02}", value / 100, value.rem_euclid(100)))
        .unwrap_or_default()
}

fn handle_quote_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    // The row after the last field opens the part picker.
    let row_count = QUOTE_FORM_ROWS;
    match key.code {
        KeyCode::Esc => dispatch(state, runtime, view_data, internal_tx, AppCommand::Escape),
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => {
            view_data.quote_field_index = (view_data.quote_field_index + 1) % row_count;
        }
        KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => {
            view_data.quote_field_index =
                (view_data.quote_field_index + row_count - 1) % row_count;
        }
        KeyCode::Enter => {
            let Some(field) = QuoteField::ALL.get(view_data.quote_field_index).copied() else {
                if refresh_catalog(state, runtime, view_data, internal_tx) {
                    view_data.part_picker = Some(0);
                }
                return;
            };
            let Some((_, form)) = state.session.quote_form() else {
                return;
            };
            view_data.input = Some(InputState {
                target: InputTarget::QuoteField(field),
                buffer: form.field_value(field),
            });
        }
        KeyCode::Char('s') => save_quote_form(state, runtime, view_data, internal_tx),
        _ => {}
    }
}

const QUOTE_FORM_ROWS: usize = QuoteField::ALL.len() + 1;

fn refresh_catalog<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) -> bool {
    match runtime.load_catalog() {
        Ok(catalog) => {
            view_data.catalog = catalog;
            true
        }
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "catalog load failed");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("load failed: {error:#}"),
            );
            false
        }
    }
}

fn move_cursor(cursor: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (cursor as isize + delta).clamp(0, len as isize - 1) as usize
}

fn handle_part_picker_key(state: &mut AppState, view_data: &mut ViewData, key: KeyEvent) {
    let Some(cursor) = view_data.part_picker else {
        return;
    };
    let len = view_data.catalog.len();
    match key.code {
        KeyCode::Esc => view_data.part_picker = None,
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.part_picker = Some(move_cursor(cursor, len, 1));
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.part_picker = Some(move_cursor(cursor, len, -1));
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(part_id) = view_data.catalog.get(cursor).map(|part| part.id)
                && let Some(form) = state.session.quote_form_mut()
            {
                form.toggle_part(part_id);
            }
        }
        _ => {}
    }
}

fn handle_catalog_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(cursor) = view_data.catalog_cursor else {
        return;
    };
    let len = view_data.catalog.len();
    match key.code {
        KeyCode::Esc => view_data.catalog_cursor = None,
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.catalog_cursor = Some(move_cursor(cursor, len, 1));
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.catalog_cursor = Some(move_cursor(cursor, len, -1));
        }
        KeyCode::Char('a') => dispatch(
            state,
            runtime,
            view_data,
            internal_tx,
            AppCommand::EditCatalogPart(None),
        ),
        KeyCode::Char('e') | KeyCode::Enter => {
            let Some(part) = view_data.catalog.get(cursor).cloned() else {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    "catalog is empty -- press a to add a part",
                );
                return;
            };
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::EditCatalogPart(Some(Box::new(part))),
            );
        }
        _ => {}
    }
}

fn handle_catalog_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let field_count = PartField::ALL.len();
    match key.code {
        KeyCode::Esc => dispatch(state, runtime, view_data, internal_tx, AppCommand::Escape),
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => {
            view_data.part_field_index = (view_data.part_field_index + 1) % field_count;
        }
        KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => {
            view_data.part_field_index =
                (view_data.part_field_index + field_count - 1) % field_count;
        }
        KeyCode::Enter => {
            let field = PartField::ALL[view_data.part_field_index % field_count];
            let Some((_, form)) = state.session.catalog_form() else {
                return;
            };
            view_data.input = Some(InputState {
                target: InputTarget::CatalogField(field),
                buffer: form.field_value(field),
            });
        }
        KeyCode::Char('s') => save_catalog_form(state, runtime, view_data, internal_tx),
        _ => {}
    }
}

fn save_catalog_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some((part_id, form)) = state.session.catalog_form() else {
        return;
    };
    let form = form.clone();
    if let Err(error) = form.validate() {
        emit_status(state, view_data, internal_tx, format!("{error:#}"));
        return;
    }
    let result = match part_id {
        Some(part_id) => runtime.update_part(part_id, &form),
        None => runtime.create_part(&form),
    };
    match result {
        Ok(part) => {
            let saved_id = part.id;
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::CatalogPartSaved(Box::new(part)),
            );
            if refresh_catalog(state, runtime, view_data, internal_tx) {
                let index = view_data
                    .catalog
                    .iter()
                    .position(|part| part.id == saved_id)
                    .unwrap_or(0);
                view_data.catalog_cursor = Some(index);
            }
        }
        Err(error) => {
            tracing::error!(
                part_id = part_id.map(PartId::get),
                error = %format!("{error:#}"),
                "catalog part save failed"
            );
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("save failed: {error:#}"),
            );
        }
    }
}

fn save_quote_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some((quote_id, form)) = state.session.quote_form() else {
        return;
    };
    let form = form.clone();
    if let Err(error) = form.validate(runtime.local_offset()) {
        emit_status(state, view_data, internal_tx, format!("{error:#}"));
        return;
    }
    let Some(quote_id) = quote_id else {
        create_quote(state, runtime, view_data, internal_tx, &form);
        return;
    };
    match runtime.save_quote_fields(quote_id, &form) {
        Ok(quote) => dispatch(
            state,
            runtime,
            view_data,
            internal_tx,
            AppCommand::QuoteFieldsSaved(Box::new(quote)),
        ),
        Err(error) => {
            tracing::error!(
                quote_id = quote_id.get(),
                error = %format!("{error:#}"),
                "quote save failed"
            );
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("save failed: {error:#}"),
            );
        }
    }
}

fn create_quote<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    form: &QuoteFormInput,
) {
    match runtime.create_quote(form) {
        Ok(quote) => {
            track_action(runtime, quote.id, ActionKind::Created);
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::QuoteCreated(Box::new(quote)),
            );
            clamp_selection(state, view_data);
        }
        Err(error) => {
            tracing::error!(
                quote_ref = form.quote_ref.as_str(),
                error = %format!("{error:#}"),
                "quote create failed"
            );
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("create failed: {error:#}"),
            );
        }
    }
}

fn handle_input_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(mut input) = view_data.input.take() else {
        return;
    };
    match key.code {
        KeyCode::Esc => {}
        KeyCode::Enter => commit_input(state, runtime, view_data, internal_tx, input),
        KeyCode::Backspace => {
            input.buffer.pop();
            view_data.input = Some(input);
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.buffer.push(ch);
            view_data.input = Some(input);
        }
        _ => view_data.input = Some(input),
    }
}

fn commit_input<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    input: InputState,
) {
    let InputState { target, buffer } = input;
    let result = match target {
        InputTarget::Search => {
            view_data.selected_row = 0;
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::SetSearch(buffer.trim().to_owned()),
            );
            return;
        }
        InputTarget::QuoteField(field) => match state.session.quote_form_mut() {
            Some(form) => form.set_field(field, &buffer),
            None => Ok(()),
        },
        InputTarget::CatalogField(field) => match state.session.catalog_form_mut() {
            Some(form) => form.set_field(field, &buffer),
            None => Ok(()),
        },
        InputTarget::PartNumber(part_id) => state.session.set_part_number(part_id, &buffer),
        InputTarget::Variant {
            part_id,
            variant_id,
            column,
        } => variant_edit_for(column, &buffer)
            .and_then(|edit| state.session.edit_variant(part_id, &variant_id, edit)),
    };
    if let Err(error) = result {
        emit_status(state, view_data, internal_tx, format!("{error:#}"));
    }
}

fn variant_edit_for(column: PartsColumn, raw: &str) -> Result<VariantEdit> {
    Ok(match column {
        PartsColumn::Note => VariantEdit::Note(raw.trim().to_owned()),
        PartsColumn::FinalPrice => VariantEdit::FinalPrice(pricing::parse_price(raw)?),
        PartsColumn::ListPrice => VariantEdit::ListPrice(pricing::parse_price(raw)?),
        PartsColumn::Aftermarket => VariantEdit::Aftermarket(matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "y" | "yes" | "am" | "true"
        )),
        PartsColumn::Number => bail!("part numbers belong to the part -- edit the number column"),
    })
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let page = current_page(state, view_data);
    let header = Paragraph::new(header_text(state, &page))
        .block(Block::default().title("partsdesk").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    match state.session.state() {
        EditState::EditingParts(session) => {
            render_parts_editor(frame, layout[1], session, view_data);
        }
        _ => render_quote_table(frame, layout[1], &page, view_data),
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if state.mode == AppMode::Nav
        && let Some(cursor) = view_data.catalog_cursor
    {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let body = Paragraph::new(render_catalog_text(&view_data.catalog, cursor)).block(
            Block::default()
                .title(format!("catalog | {} parts", view_data.catalog.len()))
                .borders(Borders::ALL),
        );
        frame.render_widget(body, area);
    }

    if let Some((quote_id, form)) = state.session.quote_form() {
        let area = centered_rect(70, 80, frame.area());
        frame.render_widget(Clear, area);
        let title = match quote_id {
            None => "new quote".to_owned(),
            Some(_) if form.quote_ref.is_empty() => "quote".to_owned(),
            Some(_) => format!("quote {}", form.quote_ref),
        };
        let body = Paragraph::new(render_quote_form_text(
            form,
            view_data.quote_field_index,
            &view_data.catalog,
        ))
        .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(body, area);

        if let Some(cursor) = view_data.part_picker {
            let area = centered_rect(50, 60, frame.area());
            frame.render_widget(Clear, area);
            let picker = Paragraph::new(render_part_picker_text(form, &view_data.catalog, cursor))
                .block(Block::default().title("pick parts").borders(Borders::ALL));
            frame.render_widget(picker, area);
        }
    }

    if let Some((part_id, form)) = state.session.catalog_form() {
        let area = centered_rect(60, 40, frame.area());
        frame.render_widget(Clear, area);
        let title = match part_id {
            Some(_) => format!("part {}", form.name),
            None => "new part".to_owned(),
        };
        let body = Paragraph::new(render_part_form_text(form, view_data.part_field_index))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(body, area);
    }

    if view_data.help_visible {
        let area = centered_rect(80, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn header_text(state: &AppState, page: &QuoteTablePage) -> String {
    let direction = match state.table.direction {
        SortDirection::Asc => "asc",
        SortDirection::Desc => "desc",
    };
    format!(
        "{} quotes | page {}/{} | sort: {} {direction} | filter: {}",
        page.total_rows,
        page.page + 1,
        page.total_pages,
        state.table.sort_key.label(),
        filter_summary(state)
    )
}

fn filter_summary(state: &AppState) -> String {
    let filter = &state.table.filter;
    if !filter.is_active() {
        return "none".to_owned();
    }
    let mut parts = filter
        .statuses
        .iter()
        .map(|status| status.label().to_owned())
        .collect::<Vec<_>>();
    let search = filter.search.trim();
    if !search.is_empty() {
        parts.push(format!("\"{search}\""));
    }
    parts.join(", ")
}

fn quote_row_cells(row: &QuoteRow) -> [String; 6] {
    [
        row.quote_ref.clone(),
        row.status.label().to_owned(),
        row.vehicle.clone(),
        row.customer.clone(),
        row.parts_summary(),
        row.deadline
            .as_ref()
            .map(|info| info.display.clone())
            .unwrap_or_default(),
    ]
}

fn deadline_style(info: &DeadlineInfo) -> Style {
    let style = match info.tier {
        DeadlineTier::Urgent => Style::default().fg(Color::Red),
        DeadlineTier::Warning => Style::default().fg(Color::Yellow),
        DeadlineTier::Normal => Style::default().fg(Color::Green),
    };
    if info.is_overdue() {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn status_style(status: QuoteStatus) -> Style {
    match status {
        QuoteStatus::Unpriced => Style::default().fg(Color::Gray),
        QuoteStatus::WaitingVerification => Style::default().fg(Color::Magenta),
        QuoteStatus::Priced => Style::default().fg(Color::Cyan),
        QuoteStatus::Completed | QuoteStatus::Ordered => Style::default().fg(Color::Blue),
        QuoteStatus::Delivered => Style::default().fg(Color::Green),
        QuoteStatus::Wrong => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::CROSSED_OUT),
    }
}

fn render_quote_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    page: &QuoteTablePage,
    view_data: &ViewData,
) {
    let header = Row::new(
        ["ref", "status", "vehicle", "customer", "parts", "due"].map(|label| {
            Cell::from(label).style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
        }),
    );

    let rows = page.rows.iter().enumerate().map(|(index, row)| {
        let [quote_ref, status, vehicle, customer, parts, due] = quote_row_cells(row);
        let due_style = row.deadline.as_ref().map(deadline_style).unwrap_or_default();
        let cells = vec![
            Cell::from(quote_ref),
            Cell::from(status).style(status_style(row.status)),
            Cell::from(vehicle),
            Cell::from(customer),
            Cell::from(parts),
            Cell::from(due).style(due_style),
        ];
        let mut line = Row::new(cells);
        if index == view_data.selected_row {
            line = line.style(Style::default().bg(Color::DarkGray));
        }
        line
    });

    let widths = [
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Min(16),
        Constraint::Min(12),
        Constraint::Length(6),
        Constraint::Length(12),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title("quotes").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn part_name(session: &PartsSession, part_id: PartId) -> String {
    session
        .catalog
        .iter()
        .find(|part| part.id == part_id)
        .map(|part| part.name.clone())
        .unwrap_or_else(|| format!("part {}", part_id.get()))
}

fn parts_cell_text(session: &PartsSession, row: &PartsRow, column: PartsColumn) -> String {
    let Some(part) = session.draft.part(row.part_id) else {
        return String::new();
    };
    let Some(variant) = part.variant(&row.variant_id) else {
        return String::new();
    };
    match column {
        PartsColumn::Number if row.first_of_part => part.part_level.number.clone(),
        PartsColumn::Number => String::new(),
        PartsColumn::Note => variant.note.clone(),
        PartsColumn::FinalPrice => pricing::format_price(variant.final_price_cents),
        PartsColumn::ListPrice => pricing::format_price(variant.list_price_cents),
        PartsColumn::Aftermarket => if variant.af { "AM" } else { "OEM" }.to_owned(),
    }
}

/// Sentinel prices read as struck-through "N/A".
fn price_style(cents: Option<i64>) -> Style {
    if pricing::is_unavailable(cents) {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    }
}

fn parts_cell_style(session: &PartsSession, row: &PartsRow, column: PartsColumn) -> Style {
    let variant = session
        .draft
        .part(row.part_id)
        .and_then(|part| part.variant(&row.variant_id));
    match (column, variant) {
        (PartsColumn::FinalPrice, Some(variant)) => price_style(variant.final_price_cents),
        (PartsColumn::ListPrice, Some(variant)) => price_style(variant.list_price_cents),
        _ => Style::default(),
    }
}

fn parts_editor_title(session: &PartsSession, view_data: &ViewData) -> String {
    let quote_ref = view_data
        .quotes
        .iter()
        .find(|quote| quote.id == session.quote_id)
        .map_or_else(
            || format!("quote {}", session.quote_id.get()),
            |quote| quote.quote_ref.clone(),
        );
    let suffix = match session.pending() {
        Some(SubmitKind::Save) => " (saving)",
        Some(SubmitKind::SendForReview) => " (sending for review)",
        None => "",
    };
    format!(
        "parts: {quote_ref} | {} variants{suffix}",
        session.draft.variant_count()
    )
}

fn render_parts_editor(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    session: &PartsSession,
    view_data: &ViewData,
) {
    let header = Row::new(
        std::iter::once("part")
            .chain(PartsColumn::ALL.iter().map(|column| column.label()))
            .map(|label| {
                Cell::from(label).style(
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
            })
            .collect::<Vec<_>>(),
    );

    let cursor = view_data.parts_cursor;
    let rows = parts_rows(session)
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let selected_row = index == cursor.row;
            let name = if row.first_of_part {
                part_name(session, row.part_id)
            } else {
                String::new()
            };
            let mut cells = vec![Cell::from(name)];
            cells.extend(PartsColumn::ALL.iter().map(|column| {
                let mut style = parts_cell_style(session, &row, *column);
                if selected_row {
                    style = style.bg(Color::DarkGray);
                }
                if selected_row && *column == cursor.column {
                    style = style
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(parts_cell_text(session, &row, *column)).style(style)
            }));
            Row::new(cells)
        })
        .collect::<Vec<_>>();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(14),
        Constraint::Min(16),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(6),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(parts_editor_title(session, view_data))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn render_quote_form_text(form: &QuoteFormInput, field_index: usize, catalog: &[Part]) -> String {
    let marker = |index: usize| if index == field_index { ">" } else { " " };
    QuoteField::ALL
        .iter()
        .enumerate()
        .map(|(index, field)| {
            format!(
                "{} {:<12} {}",
                marker(index),
                field.label(),
                form.field_value(*field)
            )
        })
        .chain(std::iter::once(format!(
            "{} {:<12} {}",
            marker(QuoteField::ALL.len()),
            "parts",
            requested_part_names(&form.part_ids, catalog)
        )))
        .collect::<Vec<_>>()
        .join("\n")
}

fn requested_part_names(part_ids: &[PartId], catalog: &[Part]) -> String {
    if part_ids.is_empty() {
        return "none (enter to pick)".to_owned();
    }
    part_ids
        .iter()
        .map(|part_id| {
            catalog
                .iter()
                .find(|part| part.id == *part_id)
                .map_or_else(|| format!("part {}", part_id.get()), |part| part.name.clone())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_part_picker_text(form: &QuoteFormInput, catalog: &[Part], cursor: usize) -> String {
    if catalog.is_empty() {
        return "catalog is empty -- add parts with P from the quote table".to_owned();
    }
    catalog
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let marker = if index == cursor { ">" } else { " " };
            let check = if form.part_ids.contains(&part.id) { "x" } else { " " };
            format!("{marker} [{check}] {:<24} {}", part.name, part.number)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_catalog_text(catalog: &[Part], cursor: usize) -> String {
    if catalog.is_empty() {
        return "no parts yet -- press a to add one".to_owned();
    }
    catalog
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let marker = if index == cursor { ">" } else { " " };
            format!(
                "{marker} {:<24} {:<18} {}",
                part.name,
                part.number,
                pricing::format_price(part.legacy_price_cents)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_part_form_text(form: &PartFormInput, field_index: usize) -> String {
    PartField::ALL
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let marker = if index == field_index { ">" } else { " " };
            format!("{marker} {:<12} {}", field.label(), form.field_value(*field))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if let Some(input) = &view_data.input {
        return format!("{}: {}_ | enter apply | esc cancel", input.target.label(), input.buffer);
    }

    let (mode, hints) = match state.mode {
        AppMode::Nav if view_data.catalog_cursor.is_some() => (
            "CATALOG",
            "j/k move | a add | enter edit | esc close",
        ),
        AppMode::Nav => (
            "NAV",
            "j/k move | a new | e parts | i edit | P catalog | v/c/o/d/w status | s/S sort | 1-7 filter | / search | n/p page | ? help",
        ),
        AppMode::EditParts => (
            "PARTS",
            "j/k h/l move | enter edit | t am/oem | a add | x remove | s save | r review | esc cancel",
        ),
        AppMode::EditQuote if view_data.part_picker.is_some() => {
            ("PICK", "j/k move | space toggle | esc done")
        }
        AppMode::EditQuote => ("QUOTE", "j/k field | enter edit | s save | esc cancel"),
        AppMode::EditCatalogPart => ("PART", "j/k field | enter edit | s save | esc cancel"),
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
nav: j/k row | n/p page | s next sort | S flip sort | 1-7 toggle status filter | / search | r reload\n\
nav: a new quote | e edit parts | i edit quote | P catalog\n\
nav: v verify | c completed | o ordered | d delivered | w wrong\n\
parts: j/k variant | h/l column | enter edit cell | t toggle am/oem | a add variant | x remove variant\n\
parts: s save | r send for review | esc discard draft\n\
quote: j/k or tab field | enter edit field | enter on parts opens picker | s save | esc discard\n\
picker: j/k part | space or enter toggle | esc back to form\n\
catalog: j/k part | a add part | enter edit part | esc close\n\
part: j/k field | enter edit field | s save | esc discard\n\
input: type | backspace | enter apply | esc cancel\n\
prices under $10.00 show as N/A (unavailable)"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
