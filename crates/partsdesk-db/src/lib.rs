// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use partsdesk_app::{
    Action, ActionId, ActionKind, Part, PartFormInput, PartId, PartsBatch, Quote, QuoteFormInput,
    QuoteId, QuotePart, QuoteStatus, StatusAction, Variant, VariantId, apply_operations,
    part_number_updates,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::{BTreeSet, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::{debug, info, warn};

pub const APP_NAME: &str = "partsdesk";
pub const DB_PATH_ENV: &str = "PARTSDESK_DB_PATH";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "parts",
        &[
            "id",
            "name",
            "number",
            "price_cents",
            "list_price_cents",
            "note",
            "af",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "quotes",
        &[
            "id",
            "quote_ref",
            "make",
            "model",
            "series",
            "year_month",
            "body",
            "auto_transmission",
            "vin",
            "rego",
            "customer_name",
            "customer_address",
            "settlement_percent",
            "status",
            "required_by",
            "notes",
            "parts_requested",
            "part_requested",
            "created_at",
            "updated_at",
        ],
    ),
    ("actions", &["id", "quote_id", "kind", "created_at"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_parts_name",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_parts_name ON parts (name);",
    },
    RequiredIndex {
        name: "idx_quotes_status",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_quotes_status ON quotes (status);",
    },
    RequiredIndex {
        name: "idx_quotes_quote_ref",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_quotes_quote_ref ON quotes (quote_ref);",
    },
    RequiredIndex {
        name: "idx_actions_quote_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_actions_quote_id ON actions (quote_id);",
    },
];

const QUOTE_COLUMNS: &str = "
    id, quote_ref, make, model, series, year_month, body, auto_transmission,
    vin, rego, customer_name, customer_address, settlement_percent, status,
    required_by, notes, parts_requested, part_requested, created_at, updated_at
";

const PART_COLUMNS: &str = "
    id, name, number, price_cents, list_price_cents, note, af, created_at, updated_at
";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuoteQuery {
    /// Resolved statuses to keep; empty keeps every quote.
    pub statuses: Vec<QuoteStatus>,
}

/// Quote row before its parts column has been decoded.
struct QuoteRecord {
    quote: Quote,
    parts_json: Option<String>,
    legacy_part_ids: Option<String>,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            info!("creating schema");
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)
    }

    pub fn list_parts(&self) -> Result<Vec<Part>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {PART_COLUMNS} FROM parts ORDER BY name COLLATE NOCASE ASC, id ASC"
            ))
            .context("prepare parts query")?;
        let rows = stmt.query_map([], part_from_row).context("query parts")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect parts")
    }

    pub fn get_part(&self, part_id: PartId) -> Result<Part> {
        self.conn
            .query_row(
                &format!("SELECT {PART_COLUMNS} FROM parts WHERE id = ?"),
                params![part_id.get()],
                part_from_row,
            )
            .optional()
            .with_context(|| format!("load part {}", part_id.get()))?
            .ok_or_else(|| {
                anyhow!(
                    "part {} not found -- choose an existing part and retry",
                    part_id.get()
                )
            })
    }

    pub fn create_part(&self, part: &PartFormInput) -> Result<PartId> {
        part.validate()?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO parts (
                  name, number, price_cents, list_price_cents, note, af,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, '', 0, ?, ?)
                ",
                params![
                    part.name.trim(),
                    part.number.trim(),
                    part.legacy_price_cents,
                    part.legacy_list_price_cents,
                    now,
                    now,
                ],
            )
            .context("insert part")?;
        Ok(PartId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_part(&self, part_id: PartId, update: &PartFormInput) -> Result<()> {
        update.validate()?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE parts
                SET
                  name = ?,
                  number = ?,
                  price_cents = ?,
                  list_price_cents = ?,
                  updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.name.trim(),
                    update.number.trim(),
                    update.legacy_price_cents,
                    update.legacy_list_price_cents,
                    now,
                    part_id.get(),
                ],
            )
            .context("update part")?;
        if rows_affected == 0 {
            bail!(
                "part {} not found -- choose an existing part and retry",
                part_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_part(&self, part_id: PartId) -> Result<()> {
        if let Some(quote) = self
            .list_quotes(&QuoteQuery::default())?
            .into_iter()
            .find(|quote| quote.quote_part(part_id).is_some())
        {
            bail!(
                "part {} is requested by quote {} -- remove it from the quote first",
                part_id.get(),
                quote.quote_ref
            );
        }

        let rows_affected = self
            .conn
            .execute("DELETE FROM parts WHERE id = ?", params![part_id.get()])
            .context("delete part")?;
        if rows_affected == 0 {
            bail!(
                "part {} not found -- choose an existing part and retry",
                part_id.get()
            );
        }
        Ok(())
    }

    /// Newest first. Status filtering uses the resolved status, so legacy
    /// rows show up under the status they are displayed with.
    pub fn list_quotes(&self, query: &QuoteQuery) -> Result<Vec<Quote>> {
        let catalog = self.catalog()?;
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {QUOTE_COLUMNS} FROM quotes ORDER BY created_at DESC, id DESC"
            ))
            .context("prepare quotes query")?;
        let records = stmt
            .query_map([], quote_record_from_row)
            .context("query quotes")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect quotes")?;

        let mut quotes = Vec::with_capacity(records.len());
        for record in records {
            let quote = hydrate_quote(record, &catalog)?;
            if query.statuses.is_empty() || query.statuses.contains(&quote.display_status()) {
                quotes.push(quote);
            }
        }
        Ok(quotes)
    }

    pub fn get_quote(&self, quote_id: QuoteId) -> Result<Quote> {
        let catalog = self.catalog()?;
        fetch_quote(&self.conn, quote_id, &catalog)
    }

    pub fn create_quote(&self, quote: &QuoteFormInput) -> Result<QuoteId> {
        quote.validate(UtcOffset::UTC)?;
        let catalog = self.catalog()?;
        let parts = requested_parts(&quote.part_ids, &[], &catalog)?;
        let parts_json = encode_parts(&parts)?;

        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO quotes (
                  quote_ref, make, model, series, year_month, body,
                  auto_transmission, vin, rego, customer_name, customer_address,
                  settlement_percent, status, required_by, notes, parts_requested,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    quote.quote_ref.trim(),
                    quote.make,
                    quote.model,
                    quote.series,
                    quote.year_month,
                    quote.body,
                    quote.auto_transmission,
                    quote.vin,
                    quote.rego,
                    quote.customer_name,
                    quote.customer_address,
                    quote.settlement_percent,
                    QuoteStatus::Unpriced.as_str(),
                    quote.required_by,
                    quote.notes,
                    parts_json,
                    now,
                    now,
                ],
            )
            .context("insert quote")?;
        let quote_id = QuoteId::new(self.conn.last_insert_rowid());
        info!(
            quote_id = quote_id.get(),
            parts = parts.len(),
            "created quote"
        );
        Ok(quote_id)
    }

    /// Updates the quote fields. Parts that stay on the quote keep their
    /// variants; newly requested parts start with one empty default.
    pub fn update_quote(&self, quote_id: QuoteId, update: &QuoteFormInput) -> Result<()> {
        update.validate(UtcOffset::UTC)?;
        let catalog = self.catalog()?;
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin quote update")?;
        let current = fetch_quote(&tx, quote_id, &catalog)?;
        let parts = requested_parts(&update.part_ids, &current.parts_requested, &catalog)?;

        let now = now_rfc3339()?;
        tx.execute(
            "
            UPDATE quotes
            SET
              quote_ref = ?,
              make = ?,
              model = ?,
              series = ?,
              year_month = ?,
              body = ?,
              auto_transmission = ?,
              vin = ?,
              rego = ?,
              customer_name = ?,
              customer_address = ?,
              settlement_percent = ?,
              required_by = ?,
              notes = ?,
              parts_requested = ?,
              part_requested = NULL,
              updated_at = ?
            WHERE id = ?
            ",
            params![
                update.quote_ref.trim(),
                update.make,
                update.model,
                update.series,
                update.year_month,
                update.body,
                update.auto_transmission,
                update.vin,
                update.rego,
                update.customer_name,
                update.customer_address,
                update.settlement_percent,
                update.required_by,
                update.notes,
                encode_parts(&parts)?,
                now,
                quote_id.get(),
            ],
        )
        .context("update quote")?;
        tx.commit().context("commit quote update")
    }

    pub fn delete_quote(&self, quote_id: QuoteId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM quotes WHERE id = ?", params![quote_id.get()])
            .context("delete quote")?;
        if rows_affected == 0 {
            bail!(
                "quote {} not found -- choose an existing quote and retry",
                quote_id.get()
            );
        }
        info!(quote_id = quote_id.get(), "deleted quote");
        Ok(())
    }

    pub fn set_quote_status(&self, quote_id: QuoteId, status: QuoteStatus) -> Result<()> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "UPDATE quotes SET status = ?, updated_at = ? WHERE id = ?",
                params![status.as_str(), now, quote_id.get()],
            )
            .context("update quote status")?;
        if rows_affected == 0 {
            bail!(
                "quote {} not found -- choose an existing quote and retry",
                quote_id.get()
            );
        }
        Ok(())
    }

    /// Runs a table-level status transition against the quote's resolved
    /// status and stores the result.
    pub fn apply_status_action(
        &self,
        quote_id: QuoteId,
        action: StatusAction,
    ) -> Result<QuoteStatus> {
        let quote = self.get_quote(quote_id)?;
        let next = quote
            .display_status()
            .apply(action)
            .with_context(|| format!("quote {}", quote.quote_ref))?;
        self.set_quote_status(quote_id, next)?;
        info!(
            quote_id = quote_id.get(),
            status = next.as_str(),
            "status changed"
        );
        Ok(next)
    }

    /// Applies a reconciled parts batch in one transaction and returns the
    /// refreshed quote. A requested status change only ever moves the quote
    /// forward.
    pub fn update_multiple_parts(&self, quote_id: QuoteId, batch: &PartsBatch) -> Result<Quote> {
        let catalog = self.catalog()?;
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin parts update")?;
        let quote = fetch_quote(&tx, quote_id, &catalog)?;

        for operation in &batch.operations {
            let part_id = operation.part_id();
            if quote.quote_part(part_id).is_none() {
                bail!(
                    "part {} is not on quote {} -- reload the quote and retry",
                    part_id.get(),
                    quote.quote_ref
                );
            }
        }

        let now = now_rfc3339()?;
        for (part_id, number) in part_number_updates(&batch.operations) {
            let rows_affected = tx
                .execute(
                    "UPDATE parts SET number = ?, updated_at = ? WHERE id = ?",
                    params![number.trim(), now, part_id.get()],
                )
                .context("update part number")?;
            if rows_affected == 0 {
                bail!(
                    "part {} not found -- reload the catalog and retry",
                    part_id.get()
                );
            }
        }

        let parts = apply_operations(&quote.parts_requested, &batch.operations);
        let status = batch
            .change_status
            .map(|target| quote.display_status().advance_toward(target));
        tx.execute(
            "
            UPDATE quotes
            SET
              parts_requested = ?,
              part_requested = NULL,
              status = COALESCE(?, status),
              updated_at = ?
            WHERE id = ?
            ",
            params![
                encode_parts(&parts)?,
                status.map(QuoteStatus::as_str),
                now,
                quote_id.get(),
            ],
        )
        .context("write quote parts")?;
        tx.commit().context("commit parts update")?;

        info!(
            quote_id = quote_id.get(),
            operations = batch.operations.len(),
            status = status.map(QuoteStatus::as_str),
            "applied parts batch"
        );
        self.get_quote(quote_id)
    }

    pub fn record_action(&self, quote_id: QuoteId, kind: ActionKind) -> Result<ActionId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO actions (quote_id, kind, created_at) VALUES (?, ?, ?)",
                params![quote_id.get(), kind.as_str(), now],
            )
            .with_context(|| format!("record {} action", kind.as_str()))?;
        Ok(ActionId::new(self.conn.last_insert_rowid()))
    }

    pub fn list_actions(&self, quote_id: QuoteId) -> Result<Vec<Action>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, quote_id, kind, created_at
                FROM actions
                WHERE quote_id = ?
                ORDER BY created_at ASC, id ASC
                ",
            )
            .context("prepare actions query")?;
        let rows = stmt
            .query_map(params![quote_id.get()], |row| {
                let kind_raw: String = row.get(2)?;
                let created_at_raw: String = row.get(3)?;
                let kind = ActionKind::parse(&kind_raw)
                    .ok_or_else(|| anyhow!("unknown action kind {kind_raw:?}"))
                    .map_err(to_sql_error)?;
                Ok(Action {
                    id: ActionId::new(row.get(0)?),
                    quote_id: QuoteId::new(row.get(1)?),
                    kind,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query actions")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect actions")
    }

    fn catalog(&self) -> Result<HashMap<PartId, Part>> {
        Ok(self
            .list_parts()?
            .into_iter()
            .map(|part| (part.id, part))
            .collect())
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os(DB_PATH_ENV) {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set {DB_PATH_ENV} to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("partsdesk.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn fetch_quote(
    conn: &Connection,
    quote_id: QuoteId,
    catalog: &HashMap<PartId, Part>,
) -> Result<Quote> {
    let record = conn
        .query_row(
            &format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ?"),
            params![quote_id.get()],
            quote_record_from_row,
        )
        .optional()
        .with_context(|| format!("load quote {}", quote_id.get()))?
        .ok_or_else(|| {
            anyhow!(
                "quote {} not found -- choose an existing quote and retry",
                quote_id.get()
            )
        })?;
    hydrate_quote(record, catalog)
}

fn quote_record_from_row(row: &Row<'_>) -> rusqlite::Result<QuoteRecord> {
    let created_at_raw: String = row.get(18)?;
    let updated_at_raw: String = row.get(19)?;
    Ok(QuoteRecord {
        quote: Quote {
            id: QuoteId::new(row.get(0)?),
            quote_ref: row.get(1)?,
            make: row.get(2)?,
            model: row.get(3)?,
            series: row.get(4)?,
            year_month: row.get(5)?,
            body: row.get(6)?,
            auto_transmission: row.get(7)?,
            vin: row.get(8)?,
            rego: row.get(9)?,
            customer_name: row.get(10)?,
            customer_address: row.get(11)?,
            settlement_percent: row.get(12)?,
            status: row.get(13)?,
            required_by: row.get(14)?,
            notes: row.get(15)?,
            parts_requested: Vec::new(),
            created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
            updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
        },
        parts_json: row.get(16)?,
        legacy_part_ids: row.get(17)?,
    })
}

fn part_from_row(row: &Row<'_>) -> rusqlite::Result<Part> {
    let created_at_raw: String = row.get(7)?;
    let updated_at_raw: String = row.get(8)?;
    Ok(Part {
        id: PartId::new(row.get(0)?),
        name: row.get(1)?,
        number: row.get(2)?,
        legacy_price_cents: row.get(3)?,
        legacy_list_price_cents: row.get(4)?,
        legacy_note: row.get(5)?,
        legacy_af: row.get(6)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

/// Decodes the parts column, falling back to the legacy comma-joined id list.
/// Parts that come back without variants get a deterministic default built
/// from the catalog's flat fields.
fn hydrate_quote(record: QuoteRecord, catalog: &HashMap<PartId, Part>) -> Result<Quote> {
    let QuoteRecord {
        mut quote,
        parts_json,
        legacy_part_ids,
    } = record;

    quote.parts_requested = match parts_json
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
    {
        Some(raw) => serde_json::from_str::<Vec<QuotePart>>(raw).with_context(|| {
            format!(
                "decode parts for quote {} -- the parts_requested column is not valid JSON",
                quote.id.get()
            )
        })?,
        None => legacy_parts(quote.id, legacy_part_ids.as_deref().unwrap_or_default()),
    };

    for part in &mut quote.parts_requested {
        if part.variants.is_empty() {
            part.variants.push(legacy_default_variant(
                part.part_id,
                catalog.get(&part.part_id),
                quote.created_at,
            ));
        }
    }
    Ok(quote)
}

fn legacy_parts(quote_id: QuoteId, raw: &str) -> Vec<QuotePart> {
    let mut seen = BTreeSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse::<i64>() {
            Ok(id) => Some(PartId::new(id)),
            Err(_) => {
                warn!(
                    quote_id = quote_id.get(),
                    token, "skipping unparseable legacy part id"
                );
                None
            }
        })
        .filter(|part_id| seen.insert(*part_id))
        .map(|part_id| QuotePart {
            part_id,
            variants: Vec::new(),
        })
        .collect()
}

fn legacy_default_variant(
    part_id: PartId,
    part: Option<&Part>,
    created_at: OffsetDateTime,
) -> Variant {
    match part {
        Some(part) => Variant::from_legacy(part, created_at),
        None => Variant {
            id: VariantId::legacy_default(part_id),
            note: String::new(),
            final_price_cents: None,
            list_price_cents: None,
            af: false,
            is_default: true,
            created_at,
        },
    }
}

fn requested_parts(
    part_ids: &[PartId],
    existing: &[QuotePart],
    catalog: &HashMap<PartId, Part>,
) -> Result<Vec<QuotePart>> {
    let mut seen = BTreeSet::new();
    let mut parts = Vec::with_capacity(part_ids.len());
    for part_id in part_ids {
        if !seen.insert(*part_id) {
            continue;
        }
        if let Some(kept) = existing.iter().find(|part| part.part_id == *part_id) {
            parts.push(kept.clone());
            continue;
        }
        if !catalog.contains_key(part_id) {
            bail!(
                "part {} does not exist -- add it to the catalog first",
                part_id.get()
            );
        }
        parts.push(QuotePart::new(*part_id));
    }
    Ok(parts)
}

fn encode_parts(parts: &[QuotePart]) -> Result<String> {
    serde_json::to_string(parts).context("encode quote parts")
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use a partsdesk database or migrate first"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = OffsetDateTime::parse(
        raw,
        &format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
        ),
    ) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
