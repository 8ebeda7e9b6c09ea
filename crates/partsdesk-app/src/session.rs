// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{
    Part, PartFormInput, PartId, PartsBatch, PartsDraft, Quote, QuoteFormInput, QuoteId,
    QuotePart, QuoteStatus, VariantId, reconcile,
};

/// Stamp carried by every submission so a late response can be matched to
/// the draft it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitKind {
    Save,
    SendForReview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub session_id: SessionId,
    pub quote_id: QuoteId,
    pub kind: SubmitKind,
    pub batch: PartsBatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Applied { kind: SubmitKind, quote: Box<Quote> },
    Failed { kind: SubmitKind, message: String },
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariantEdit {
    Note(String),
    FinalPrice(Option<i64>),
    ListPrice(Option<i64>),
    Aftermarket(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartsSession {
    pub quote_id: QuoteId,
    pub session_id: SessionId,
    /// Last persisted parts; the reconciler diffs against this.
    pub original: Vec<QuotePart>,
    pub catalog: Vec<Part>,
    pub draft: PartsDraft,
    pending: Option<SubmitKind>,
}

impl PartsSession {
    pub const fn pending(&self) -> Option<SubmitKind> {
        self.pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    Viewing,
    /// `quote_id` is `None` while a new quote is being drafted.
    EditingQuoteFields {
        quote_id: Option<QuoteId>,
        form: Box<QuoteFormInput>,
    },
    EditingParts(Box<PartsSession>),
    /// `part_id` is `None` while a new catalog part is being drafted.
    EditingCatalogPart {
        part_id: Option<PartId>,
        form: Box<PartFormInput>,
    },
}

/// Editing lifecycle for the quote table. Holding a single value means at
/// most one quote can have a parts draft at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    state: EditState,
    last_session: u64,
}

impl Default for EditSession {
    fn default() -> Self {
        Self {
            state: EditState::Viewing,
            last_session: 0,
        }
    }
}

impl EditSession {
    pub const fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_viewing(&self) -> bool {
        matches!(self.state, EditState::Viewing)
    }

    pub fn parts(&self) -> Option<&PartsSession> {
        match &self.state {
            EditState::EditingParts(session) => Some(&**session),
            _ => None,
        }
    }

    pub fn quote_form(&self) -> Option<(Option<QuoteId>, &QuoteFormInput)> {
        match &self.state {
            EditState::EditingQuoteFields { quote_id, form } => Some((*quote_id, &**form)),
            _ => None,
        }
    }

    pub fn quote_form_mut(&mut self) -> Option<&mut QuoteFormInput> {
        match &mut self.state {
            EditState::EditingQuoteFields { form, .. } => Some(&mut **form),
            _ => None,
        }
    }

    pub fn catalog_form(&self) -> Option<(Option<PartId>, &PartFormInput)> {
        match &self.state {
            EditState::EditingCatalogPart { part_id, form } => Some((*part_id, &**form)),
            _ => None,
        }
    }

    pub fn catalog_form_mut(&mut self) -> Option<&mut PartFormInput> {
        match &mut self.state {
            EditState::EditingCatalogPart { form, .. } => Some(&mut **form),
            _ => None,
        }
    }

    pub fn editing_quote_id(&self) -> Option<QuoteId> {
        match &self.state {
            EditState::Viewing | EditState::EditingCatalogPart { .. } => None,
            EditState::EditingQuoteFields { quote_id, .. } => *quote_id,
            EditState::EditingParts(session) => Some(session.quote_id),
        }
    }

    pub fn begin_parts(&mut self, quote: &Quote, catalog: &[Part]) -> Result<SessionId> {
        self.ensure_not_pending()?;
        self.last_session += 1;
        let session_id = SessionId(self.last_session);
        self.state = EditState::EditingParts(Box::new(PartsSession {
            quote_id: quote.id,
            session_id,
            original: quote.parts_requested.clone(),
            catalog: catalog.to_vec(),
            draft: PartsDraft::seed(&quote.parts_requested, catalog),
            pending: None,
        }));
        Ok(session_id)
    }

    pub fn begin_quote_fields(&mut self, quote: &Quote) -> Result<()> {
        self.ensure_not_pending()?;
        self.state = EditState::EditingQuoteFields {
            quote_id: Some(quote.id),
            form: Box::new(QuoteFormInput::from_quote(quote)),
        };
        Ok(())
    }

    pub fn begin_new_quote(&mut self) -> Result<()> {
        self.ensure_not_pending()?;
        self.state = EditState::EditingQuoteFields {
            quote_id: None,
            form: Box::default(),
        };
        Ok(())
    }

    /// Leaves quote-field editing after the caller persisted the form.
    pub fn finish_quote_fields(&mut self, quote_id: QuoteId) -> bool {
        match &self.state {
            EditState::EditingQuoteFields {
                quote_id: Some(active),
                ..
            } if *active == quote_id => {
                self.state = EditState::Viewing;
                true
            }
            _ => false,
        }
    }

    /// Leaves the new-quote form after the caller created the quote.
    pub fn finish_new_quote(&mut self) -> bool {
        match &self.state {
            EditState::EditingQuoteFields { quote_id: None, .. } => {
                self.state = EditState::Viewing;
                true
            }
            _ => false,
        }
    }

    /// Opens the catalog form for `part`, or an empty one when `None`.
    pub fn begin_catalog_part(&mut self, part: Option<&Part>) -> Result<()> {
        self.ensure_not_pending()?;
        self.state = EditState::EditingCatalogPart {
            part_id: part.map(|part| part.id),
            form: Box::new(part.map(PartFormInput::from_part).unwrap_or_default()),
        };
        Ok(())
    }

    /// Leaves the catalog form after the caller persisted `part_id`. A new
    /// part accepts whatever id the store assigned.
    pub fn finish_catalog_part(&mut self, part_id: PartId) -> bool {
        match &self.state {
            EditState::EditingCatalogPart { part_id: active, .. }
                if active.is_none_or(|active| active == part_id) =>
            {
                self.state = EditState::Viewing;
                true
            }
            _ => false,
        }
    }

    pub fn add_variant(&mut self, part_id: PartId) -> Result<VariantId> {
        let session = self.editable_parts()?;
        let Some(part) = session.draft.part_mut(part_id) else {
            bail!("part {} is not on this quote", part_id.get());
        };
        Ok(part.push_variant())
    }

    pub fn remove_variant(&mut self, part_id: PartId, variant_id: &VariantId) -> Result<()> {
        let session = self.editable_parts()?;
        let Some(part) = session.draft.part_mut(part_id) else {
            bail!("part {} is not on this quote", part_id.get());
        };
        if !part.remove_variant(variant_id) {
            bail!("variant {variant_id} is not on part {}", part_id.get());
        }
        Ok(())
    }

    pub fn edit_variant(
        &mut self,
        part_id: PartId,
        variant_id: &VariantId,
        edit: VariantEdit,
    ) -> Result<()> {
        let session = self.editable_parts()?;
        let Some(variant) = session
            .draft
            .part_mut(part_id)
            .and_then(|part| part.variant_mut(variant_id))
        else {
            bail!("variant {variant_id} is not on part {}", part_id.get());
        };
        match edit {
            VariantEdit::Note(note) => variant.note = note,
            VariantEdit::FinalPrice(cents) => variant.final_price_cents = cents,
            VariantEdit::ListPrice(cents) => variant.list_price_cents = cents,
            VariantEdit::Aftermarket(af) => variant.af = af,
        }
        Ok(())
    }

    /// Part numbers live on the catalog row, so parts missing from the
    /// catalog cannot take one.
    pub fn set_part_number(&mut self, part_id: PartId, number: &str) -> Result<()> {
        let session = self.editable_parts()?;
        if !session.catalog.iter().any(|part| part.id == part_id) {
            bail!(
                "part {} has no catalog entry -- part numbers are kept on catalog parts",
                part_id.get()
            );
        }
        let Some(part) = session.draft.part_mut(part_id) else {
            bail!("part {} is not on this quote", part_id.get());
        };
        part.part_level.number = number.trim().to_owned();
        Ok(())
    }

    /// Persists the draft without touching the quote's status.
    pub fn save(&mut self) -> Result<SubmitRequest> {
        self.submit(SubmitKind::Save, None)
    }

    /// Persists the draft and asks the store to advance the quote to
    /// waiting-verification. Needs at least one above-floor price.
    pub fn send_for_review(&mut self) -> Result<SubmitRequest> {
        let session = self.editable_parts()?;
        if !session.draft.has_priced_variant() {
            bail!("price at least one part before sending for review");
        }
        self.submit(
            SubmitKind::SendForReview,
            Some(QuoteStatus::WaitingVerification),
        )
    }

    fn submit(
        &mut self,
        kind: SubmitKind,
        change_status: Option<QuoteStatus>,
    ) -> Result<SubmitRequest> {
        let session = self.editable_parts()?;
        let operations = reconcile::reconcile(&session.original, &session.catalog, &session.draft);
        session.pending = Some(kind);
        Ok(SubmitRequest {
            session_id: session.session_id,
            quote_id: session.quote_id,
            kind,
            batch: PartsBatch {
                operations,
                change_status,
            },
        })
    }

    /// Applies the collaborator's answer to a submission. Answers for a
    /// session that is no longer active are dropped.
    pub fn complete_submit(
        &mut self,
        session_id: SessionId,
        result: Result<Quote>,
    ) -> SubmitOutcome {
        let EditState::EditingParts(session) = &mut self.state else {
            return SubmitOutcome::Stale;
        };
        if session.session_id != session_id {
            return SubmitOutcome::Stale;
        }
        let Some(kind) = session.pending.take() else {
            return SubmitOutcome::Stale;
        };

        match result {
            Ok(quote) => {
                self.state = EditState::Viewing;
                SubmitOutcome::Applied {
                    kind,
                    quote: Box::new(quote),
                }
            }
            Err(error) => SubmitOutcome::Failed {
                kind,
                message: format!("{error:#}"),
            },
        }
    }

    /// Discards any draft. Returns false when nothing was being edited.
    pub fn cancel(&mut self) -> bool {
        if self.is_viewing() {
            return false;
        }
        self.state = EditState::Viewing;
        true
    }

    fn editable_parts(&mut self) -> Result<&mut PartsSession> {
        match &mut self.state {
            EditState::EditingParts(session) => {
                if session.pending.is_some() {
                    bail!("save already in progress -- wait for it to finish");
                }
                Ok(session)
            }
            _ => bail!("no parts are being edited -- press e on a quote first"),
        }
    }

    fn ensure_not_pending(&self) -> Result<()> {
        if let EditState::EditingParts(session) = &self.state
            && session.pending.is_some()
        {
            bail!("save already in progress -- wait for it to finish");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{EditSession, EditState, SubmitKind, SubmitOutcome, VariantEdit};
    use crate::{
        Part, PartId, Quote, QuoteId, QuotePart, QuoteStatus, Variant, VariantId,
        VariantOperation, apply_operations,
    };
    use anyhow::anyhow;
    use time::OffsetDateTime;

    fn variant(id: &str, price: Option<i64>) -> Variant {
        Variant {
            id: VariantId::from(id),
            note: String::new(),
            final_price_cents: price,
            list_price_cents: None,
            af: false,
            is_default: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn quote(id: i64, parts: Vec<QuotePart>) -> Quote {
        Quote {
            id: QuoteId::new(id),
            quote_ref: format!("Q-{id}"),
            make: "Mazda".to_owned(),
            model: "CX-5".to_owned(),
            series: String::new(),
            year_month: "2019/04".to_owned(),
            body: String::new(),
            auto_transmission: true,
            vin: String::new(),
            rego: String::new(),
            customer_name: String::new(),
            customer_address: String::new(),
            settlement_percent: None,
            status: Some("unpriced".to_owned()),
            required_by: None,
            notes: String::new(),
            parts_requested: parts,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn unpriced_quote() -> Quote {
        quote(
            1,
            vec![QuotePart {
                part_id: PartId::new(5),
                variants: vec![variant("v1", None)],
            }],
        )
    }

    #[test]
    fn send_for_review_without_prices_is_rejected() {
        let mut session = EditSession::default();
        session
            .begin_parts(&unpriced_quote(), &[])
            .expect("begin editing");

        let error = session
            .send_for_review()
            .expect_err("no priced part should block review");
        assert!(error.to_string().contains("price at least one part"));
        let parts = session.parts().expect("still editing");
        assert_eq!(parts.pending(), None);
    }

    #[test]
    fn sentinel_price_does_not_unlock_review() -> anyhow::Result<()> {
        let mut session = EditSession::default();
        session.begin_parts(&unpriced_quote(), &[])?;
        session.edit_variant(
            PartId::new(5),
            &VariantId::from("v1"),
            VariantEdit::FinalPrice(Some(999)),
        )?;
        assert!(session.send_for_review().is_err());
        Ok(())
    }

    #[test]
    fn send_for_review_requests_status_change() -> anyhow::Result<()> {
        let mut session = EditSession::default();
        session.begin_parts(&unpriced_quote(), &[])?;
        session.edit_variant(
            PartId::new(5),
            &VariantId::from("v1"),
            VariantEdit::FinalPrice(Some(18_000)),
        )?;

        let request = session.send_for_review()?;
        assert_eq!(request.kind, SubmitKind::SendForReview);
        assert_eq!(
            request.batch.change_status,
            Some(QuoteStatus::WaitingVerification)
        );
        assert_eq!(request.batch.operations.len(), 1);
        assert!(matches!(
            &request.batch.operations[0],
            VariantOperation::UpsertVariant { created: false, .. }
        ));
        Ok(())
    }

    #[test]
    fn save_never_changes_status() -> anyhow::Result<()> {
        let mut session = EditSession::default();
        session.begin_parts(&unpriced_quote(), &[])?;
        let request = session.save()?;
        assert_eq!(request.kind, SubmitKind::Save);
        assert_eq!(request.batch.change_status, None);
        assert!(request.batch.operations.is_empty());
        Ok(())
    }

    #[test]
    fn pending_submission_blocks_edits_and_resubmits() -> anyhow::Result<()> {
        let mut session = EditSession::default();
        session.begin_parts(&unpriced_quote(), &[])?;
        session.save()?;

        assert!(session.save().is_err());
        assert!(session.add_variant(PartId::new(5)).is_err());
        assert!(session.begin_parts(&unpriced_quote(), &[]).is_err());
        Ok(())
    }

    #[test]
    fn successful_submit_returns_to_viewing_with_fresh_quote() -> anyhow::Result<()> {
        let original = unpriced_quote();
        let mut session = EditSession::default();
        let session_id = session.begin_parts(&original, &[])?;
        session.add_variant(PartId::new(5))?;
        let request = session.save()?;

        let refreshed = Quote {
            parts_requested: apply_operations(
                &original.parts_requested,
                &request.batch.operations,
            ),
            ..original
        };
        let outcome = session.complete_submit(session_id, Ok(refreshed.clone()));
        assert_eq!(
            outcome,
            SubmitOutcome::Applied {
                kind: SubmitKind::Save,
                quote: Box::new(refreshed),
            }
        );
        assert!(session.is_viewing());
        Ok(())
    }

    #[test]
    fn failed_submit_keeps_draft_for_retry() -> anyhow::Result<()> {
        let mut session = EditSession::default();
        let session_id = session.begin_parts(&unpriced_quote(), &[])?;
        let added = session.add_variant(PartId::new(5))?;
        let first = session.save()?;

        let outcome = session.complete_submit(session_id, Err(anyhow!("database is locked")));
        assert!(matches!(
            outcome,
            SubmitOutcome::Failed { kind: SubmitKind::Save, ref message } if message.contains("locked")
        ));
        let parts = session.parts().expect("session stays open");
        assert_eq!(parts.pending(), None);
        assert!(
            parts
                .draft
                .part(PartId::new(5))
                .is_some_and(|part| part.contains(&added))
        );

        let retry = session.save()?;
        assert_eq!(retry.batch, first.batch);
        Ok(())
    }

    #[test]
    fn late_response_for_replaced_session_is_discarded() -> anyhow::Result<()> {
        let mut session = EditSession::default();
        let first = session.begin_parts(&unpriced_quote(), &[])?;
        session.save()?;
        // Late answer arrives after the user cancelled and opened another quote.
        assert!(session.cancel());
        let second_quote = quote(2, vec![QuotePart::new(PartId::new(9))]);
        let second = session.begin_parts(&second_quote, &[])?;
        assert_ne!(first, second);

        let outcome = session.complete_submit(first, Ok(unpriced_quote()));
        assert_eq!(outcome, SubmitOutcome::Stale);
        assert_eq!(session.editing_quote_id(), Some(QuoteId::new(2)));
        Ok(())
    }

    #[test]
    fn removing_last_variant_keeps_a_default_in_the_draft() -> anyhow::Result<()> {
        let mut session = EditSession::default();
        session.begin_parts(&unpriced_quote(), &[])?;
        session.remove_variant(PartId::new(5), &VariantId::from("v1"))?;

        let part = session
            .parts()
            .and_then(|parts| parts.draft.part(PartId::new(5)))
            .expect("part in draft");
        assert_eq!(part.variants.len(), 1);
        assert!(part.variants[0].is_default);
        assert_eq!(part.variants[0].final_price_cents, None);
        assert!(part.variants[0].note.is_empty());
        Ok(())
    }

    #[test]
    fn cancel_discards_either_edit_mode() -> anyhow::Result<()> {
        let mut session = EditSession::default();
        assert!(!session.cancel());

        session.begin_quote_fields(&unpriced_quote())?;
        assert!(matches!(
            session.state(),
            EditState::EditingQuoteFields { .. }
        ));
        assert!(session.cancel());
        assert!(session.is_viewing());

        session.begin_parts(&unpriced_quote(), &[])?;
        assert!(session.cancel());
        assert!(session.is_viewing());
        Ok(())
    }

    #[test]
    fn new_quote_form_starts_empty_and_finishes_once() -> anyhow::Result<()> {
        let mut session = EditSession::default();
        assert!(!session.finish_new_quote());

        session.begin_new_quote()?;
        let (quote_id, form) = session.quote_form().expect("form open");
        assert_eq!(quote_id, None);
        assert!(form.quote_ref.is_empty());
        assert_eq!(session.editing_quote_id(), None);

        assert!(!session.finish_quote_fields(QuoteId::new(1)));
        assert!(session.finish_new_quote());
        assert!(session.is_viewing());
        Ok(())
    }

    #[test]
    fn catalog_form_tracks_the_part_being_edited() -> anyhow::Result<()> {
        let existing = Part {
            id: PartId::new(7),
            name: "Grille".to_owned(),
            number: "53111-0K010".to_owned(),
            legacy_price_cents: Some(21_000),
            legacy_list_price_cents: None,
            legacy_note: String::new(),
            legacy_af: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let mut session = EditSession::default();
        session.begin_catalog_part(Some(&existing))?;
        let (part_id, form) = session.catalog_form().expect("form open");
        assert_eq!(part_id, Some(PartId::new(7)));
        assert_eq!(form.name, "Grille");

        assert!(!session.finish_catalog_part(PartId::new(8)));
        assert!(session.finish_catalog_part(PartId::new(7)));

        session.begin_catalog_part(None)?;
        assert_eq!(session.catalog_form().map(|(id, _)| id), Some(None));
        assert!(session.finish_catalog_part(PartId::new(30)));
        assert!(session.is_viewing());
        Ok(())
    }

    #[test]
    fn edits_outside_a_parts_session_are_rejected() {
        let mut session = EditSession::default();
        let error = session
            .add_variant(PartId::new(5))
            .expect_err("not editing");
        assert!(error.to_string().contains("no parts are being edited"));
    }

    #[test]
    fn part_number_needs_a_catalog_row() -> anyhow::Result<()> {
        let orphan = quote(3, vec![QuotePart::new(PartId::new(12))]);
        let mut session = EditSession::default();
        session.begin_parts(&orphan, &[])?;

        let error = session
            .set_part_number(PartId::new(12), "ABC-123")
            .expect_err("uncatalogued part has nowhere to keep a number");
        assert!(error.to_string().contains("no catalog entry"));
        assert!(session.save()?.batch.operations.is_empty());
        Ok(())
    }

    #[test]
    fn part_number_on_catalog_part_reaches_the_batch() -> anyhow::Result<()> {
        let catalog = vec![Part {
            id: PartId::new(12),
            name: "Tail lamp RH".to_owned(),
            number: String::new(),
            legacy_price_cents: None,
            legacy_list_price_cents: None,
            legacy_note: String::new(),
            legacy_af: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }];
        let listed = quote(3, vec![QuotePart::new(PartId::new(12))]);
        let mut session = EditSession::default();
        session.begin_parts(&listed, &catalog)?;
        session.set_part_number(PartId::new(12), " ABC-123 ")?;

        let request = session.save()?;
        assert_eq!(
            request.batch.operations,
            vec![VariantOperation::SetPartNumber {
                part_id: PartId::new(12),
                number: "ABC-123".to_owned(),
            }]
        );
        Ok(())
    }
}
