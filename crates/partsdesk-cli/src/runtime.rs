// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use partsdesk_app::{
    ActionKind, Part, PartFormInput, PartId, PartsBatch, Quote, QuoteFormInput, QuoteId,
    QuoteStatus, StatusAction,
};
use partsdesk_db::{QuoteQuery, Store};
use time::UtcOffset;
use tracing::debug;

pub struct DbRuntime<'a> {
    store: &'a Store,
    local_offset: UtcOffset,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store, local_offset: UtcOffset) -> Self {
        Self {
            store,
            local_offset,
        }
    }
}

impl partsdesk_tui::AppRuntime for DbRuntime<'_> {
    fn load_quotes(&mut self) -> Result<Vec<Quote>> {
        self.store.list_quotes(&QuoteQuery::default())
    }

    fn load_catalog(&mut self) -> Result<Vec<Part>> {
        self.store.list_parts()
    }

    fn submit_parts(&mut self, quote_id: QuoteId, batch: &PartsBatch) -> Result<Quote> {
        debug!(
            quote_id = quote_id.get(),
            operations = batch.operations.len(),
            change_status = batch.change_status.map(QuoteStatus::as_str),
            "submitting parts batch"
        );
        self.store.update_multiple_parts(quote_id, batch)
    }

    fn save_quote_fields(&mut self, quote_id: QuoteId, form: &QuoteFormInput) -> Result<Quote> {
        self.store.update_quote(quote_id, form)?;
        self.store.get_quote(quote_id)
    }

    fn create_quote(&mut self, form: &QuoteFormInput) -> Result<Quote> {
        let quote_id = self.store.create_quote(form)?;
        self.store.get_quote(quote_id)
    }

    fn create_part(&mut self, form: &PartFormInput) -> Result<Part> {
        let part_id = self.store.create_part(form)?;
        debug!(part_id = part_id.get(), "created catalog part");
        self.store.get_part(part_id)
    }

    fn update_part(&mut self, part_id: PartId, form: &PartFormInput) -> Result<Part> {
        self.store.update_part(part_id, form)?;
        self.store.get_part(part_id)
    }

    fn apply_status_action(
        &mut self,
        quote_id: QuoteId,
        action: StatusAction,
    ) -> Result<QuoteStatus> {
        self.store.apply_status_action(quote_id, action)
    }

    fn record_action(&mut self, quote_id: QuoteId, kind: ActionKind) -> Result<()> {
        self.store.record_action(quote_id, kind).map(|_| ())
    }

    fn local_offset(&self) -> UtcOffset {
        self.local_offset
    }
}

#[cfg(test)]
mod tests {
    use super::DbRuntime;
    use anyhow::Result;
    use partsdesk_app::{
        ActionKind, EditSession, PartFormInput, QuoteFormInput, QuoteStatus, StatusAction,
        VariantEdit,
    };
    use partsdesk_db::Store;
    use partsdesk_tui::AppRuntime;
    use time::UtcOffset;

    fn store_with_quote() -> Result<(Store, partsdesk_app::QuoteId)> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let part_id = store.create_part(&PartFormInput {
            name: "Bonnet".to_owned(),
            number: "65100-0K010".to_owned(),
            ..PartFormInput::default()
        })?;
        let quote_id = store.create_quote(&QuoteFormInput {
            quote_ref: "Q-100".to_owned(),
            make: "Toyota".to_owned(),
            model: "Hilux".to_owned(),
            part_ids: vec![part_id],
            ..QuoteFormInput::default()
        })?;
        Ok((store, quote_id))
    }

    #[test]
    fn load_quotes_returns_every_status() -> Result<()> {
        let (store, quote_id) = store_with_quote()?;
        store.set_quote_status(quote_id, QuoteStatus::Wrong)?;

        let mut runtime = DbRuntime::new(&store, UtcOffset::UTC);
        let quotes = runtime.load_quotes()?;
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].display_status(), QuoteStatus::Wrong);
        assert_eq!(runtime.load_catalog()?.len(), 1);
        Ok(())
    }

    #[test]
    fn submitted_review_batch_advances_status() -> Result<()> {
        let (store, quote_id) = store_with_quote()?;
        let mut runtime = DbRuntime::new(&store, UtcOffset::UTC);
        let quote = store.get_quote(quote_id)?;
        let catalog = runtime.load_catalog()?;

        let mut session = EditSession::default();
        session.begin_parts(&quote, &catalog)?;
        let part_id = quote.parts_requested[0].part_id;
        let variant_id = quote.parts_requested[0].variants[0].id.clone();
        session.edit_variant(part_id, &variant_id, VariantEdit::FinalPrice(Some(42_000)))?;
        let request = session.send_for_review()?;

        let saved = runtime.submit_parts(request.quote_id, &request.batch)?;
        assert_eq!(saved.display_status(), QuoteStatus::WaitingVerification);
        assert_eq!(saved.priced_part_count(), 1);
        Ok(())
    }

    #[test]
    fn status_actions_and_tracking_reach_the_store() -> Result<()> {
        let (store, quote_id) = store_with_quote()?;
        store.set_quote_status(quote_id, QuoteStatus::WaitingVerification)?;
        let mut runtime = DbRuntime::new(&store, UtcOffset::UTC);

        let status = runtime.apply_status_action(quote_id, StatusAction::Verify)?;
        assert_eq!(status, QuoteStatus::Priced);
        runtime.record_action(quote_id, ActionKind::Verified)?;

        let actions = store.list_actions(quote_id)?;
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Verified);
        Ok(())
    }

    #[test]
    fn save_quote_fields_returns_reloaded_quote() -> Result<()> {
        let (store, quote_id) = store_with_quote()?;
        let mut runtime = DbRuntime::new(&store, UtcOffset::UTC);
        let mut form = QuoteFormInput::from_quote(&store.get_quote(quote_id)?);
        form.customer_name = "Westside Panel".to_owned();

        let saved = runtime.save_quote_fields(quote_id, &form)?;
        assert_eq!(saved.customer_name, "Westside Panel");
        assert_eq!(saved.parts_requested.len(), 1);
        Ok(())
    }

    #[test]
    fn created_quote_comes_back_with_its_parts() -> Result<()> {
        let (store, _) = store_with_quote()?;
        let mut runtime = DbRuntime::new(&store, UtcOffset::UTC);
        let part_id = runtime.load_catalog()?[0].id;

        let created = runtime.create_quote(&QuoteFormInput {
            quote_ref: "Q-101".to_owned(),
            make: "Isuzu".to_owned(),
            model: "D-Max".to_owned(),
            part_ids: vec![part_id],
            ..QuoteFormInput::default()
        })?;
        assert_eq!(created.quote_ref, "Q-101");
        assert_eq!(created.display_status(), QuoteStatus::Unpriced);
        assert_eq!(created.parts_requested.len(), 1);
        assert_eq!(created.parts_requested[0].part_id, part_id);
        assert_eq!(runtime.load_quotes()?.len(), 2);
        Ok(())
    }

    #[test]
    fn catalog_parts_are_created_and_updated() -> Result<()> {
        let (store, _) = store_with_quote()?;
        let mut runtime = DbRuntime::new(&store, UtcOffset::UTC);

        let created = runtime.create_part(&PartFormInput {
            name: "Tailgate".to_owned(),
            ..PartFormInput::default()
        })?;
        assert_eq!(created.name, "Tailgate");

        let updated = runtime.update_part(
            created.id,
            &PartFormInput {
                name: "Tailgate shell".to_owned(),
                number: "67005-0K100".to_owned(),
                legacy_price_cents: Some(48_000),
                ..PartFormInput::default()
            },
        )?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.number, "67005-0K100");
        assert_eq!(updated.legacy_price_cents, Some(48_000));
        assert_eq!(runtime.load_catalog()?.len(), 2);

        let missing = PartFormInput {
            name: "Ghost".to_owned(),
            ..PartFormInput::default()
        };
        let error = runtime
            .update_part(partsdesk_app::PartId::new(999), &missing)
            .expect_err("unknown part");
        assert!(error.to_string().contains("not found"));
        Ok(())
    }
}
