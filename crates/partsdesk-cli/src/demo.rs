// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use partsdesk_app::reconcile::reconcile;
use partsdesk_app::{ActionKind, PartsBatch, PartsDraft, QuoteId, QuoteStatus, StatusAction};
use partsdesk_db::Store;
use partsdesk_testkit::PartsFaker;
use time::OffsetDateTime;
use tracing::{info, warn};

pub const DEMO_SEED: u64 = 0x5EED_CAFE;
const DEMO_PARTS: usize = 16;
const DEMO_QUOTES: usize = 14;
const MAX_PARTS_PER_QUOTE: usize = 4;

/// Fills `store` with a believable workshop day: quotes in every stage of the
/// pricing workflow, some overdue, some carrying N/A prices.
pub fn seed_demo_data(store: &Store, seed: u64, now: OffsetDateTime) -> Result<()> {
    let mut faker = PartsFaker::new(seed);
    let mut part_ids = Vec::with_capacity(DEMO_PARTS);
    for _ in 0..DEMO_PARTS {
        part_ids.push(store.create_part(&faker.part())?);
    }
    let catalog = store.list_parts()?;

    for _ in 0..DEMO_QUOTES {
        let count = 1 + faker.int_n(MAX_PARTS_PER_QUOTE);
        let start = faker.int_n(part_ids.len() - count + 1);
        let chosen = &part_ids[start..start + count];
        let quote_id = store.create_quote(&faker.quote(chosen, now))?;
        track(store, quote_id, ActionKind::Created);

        if faker.int_n(4) == 0 {
            continue;
        }

        let quote = store.get_quote(quote_id)?;
        let priced = faker.quote_parts(chosen, quote.created_at);
        let draft = PartsDraft::seed(&priced, &catalog);
        let change_status = draft
            .has_priced_variant()
            .then_some(QuoteStatus::WaitingVerification);
        let batch = PartsBatch {
            operations: reconcile(&quote.parts_requested, &catalog, &draft),
            change_status,
        };
        store.update_multiple_parts(quote_id, &batch)?;
        if change_status.is_none() {
            continue;
        }
        track(store, quote_id, ActionKind::Priced);

        let steps = faker.int_n(4);
        for action in [
            StatusAction::Verify,
            StatusAction::MarkCompleted,
            StatusAction::MarkOrdered,
        ]
        .into_iter()
        .take(steps)
        {
            store.apply_status_action(quote_id, action)?;
            if action == StatusAction::Verify {
                track(store, quote_id, ActionKind::Verified);
            }
        }
    }

    info!(
        seed,
        parts = DEMO_PARTS,
        quotes = DEMO_QUOTES,
        "seeded demo data"
    );
    Ok(())
}

fn track(store: &Store, quote_id: QuoteId, kind: ActionKind) {
    if let Err(error) = store.record_action(quote_id, kind) {
        warn!(
            quote_id = quote_id.get(),
            action = kind.as_str(),
            error = %format!("{error:#}"),
            "could not record demo action"
        );
    }
}
