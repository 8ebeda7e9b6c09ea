// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Turns a parts draft into the batch of writes that brings the stored
//! variants in line with it.
//!
//! The diff is always taken against the last persisted parts list, never
//! against what the editor currently shows: a variant id that is missing
//! from the persisted list is new, whatever the screen says.

use crate::{Part, PartId, PartsDraft, QuotePart, QuoteStatus, Variant, VariantDraft};

/// One logical write for the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartsBatch {
    pub operations: Vec<VariantOperation>,
    /// Status the quote should advance toward alongside the field updates.
    pub change_status: Option<QuoteStatus>,
}

impl PartsBatch {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.change_status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantOperation {
    /// Update the catalog part's comma-joined part numbers.
    SetPartNumber { part_id: PartId, number: String },
    /// Create or overwrite one variant with fully merged values.
    UpsertVariant {
        part_id: PartId,
        variant: Variant,
        created: bool,
    },
    /// Replace the part's whole variant collection after removals.
    ReplaceVariants {
        part_id: PartId,
        surviving: Vec<Variant>,
    },
}

impl VariantOperation {
    pub const fn part_id(&self) -> PartId {
        match self {
            Self::SetPartNumber { part_id, .. }
            | Self::UpsertVariant { part_id, .. }
            | Self::ReplaceVariants { part_id, .. } => *part_id,
        }
    }
}

pub fn reconcile(
    original: &[QuotePart],
    catalog: &[Part],
    draft: &PartsDraft,
) -> Vec<VariantOperation> {
    let mut operations = Vec::new();

    for part_draft in &draft.parts {
        let part_id = part_draft.part_id;
        let persisted = original
            .iter()
            .find(|part| part.part_id == part_id)
            .map(|part| part.variants.as_slice())
            .unwrap_or(&[]);

        if let Some(catalog_part) = catalog.iter().find(|part| part.id == part_id)
            && catalog_part.number != part_draft.part_level.number
        {
            operations.push(VariantOperation::SetPartNumber {
                part_id,
                number: part_draft.part_level.number.clone(),
            });
        }

        // The store swaps the whole collection per write, so once anything is
        // created every sibling has to travel with it.
        let has_new = part_draft
            .variants
            .iter()
            .any(|variant| find_persisted(persisted, variant).is_none());

        for variant in &part_draft.variants {
            match find_persisted(persisted, variant) {
                None => operations.push(VariantOperation::UpsertVariant {
                    part_id,
                    variant: variant.to_variant(),
                    created: true,
                }),
                Some(stored) if has_new || variant.differs_from(stored) => {
                    operations.push(VariantOperation::UpsertVariant {
                        part_id,
                        variant: merge(variant, stored),
                        created: false,
                    });
                }
                Some(_) => {}
            }
        }

        let removed_any = persisted
            .iter()
            .any(|stored| !part_draft.contains(&stored.id));
        if removed_any {
            let surviving = part_draft
                .variants
                .iter()
                .map(|variant| match find_persisted(persisted, variant) {
                    Some(stored) => merge(variant, stored),
                    None => variant.to_variant(),
                })
                .collect();
            operations.push(VariantOperation::ReplaceVariants { part_id, surviving });
        }
    }

    operations
}

/// Applies a batch with the store's semantics: upserts match by id and append
/// when missing, replacements swap the collection, and no part is left
/// without a variant.
pub fn apply_operations(parts: &[QuotePart], operations: &[VariantOperation]) -> Vec<QuotePart> {
    let mut applied = parts.to_vec();

    for operation in operations {
        match operation {
            VariantOperation::SetPartNumber { .. } => {}
            VariantOperation::UpsertVariant {
                part_id, variant, ..
            } => {
                let part = part_entry(&mut applied, *part_id);
                match part
                    .variants
                    .iter_mut()
                    .find(|existing| existing.id == variant.id)
                {
                    Some(existing) => *existing = variant.clone(),
                    None => part.variants.push(variant.clone()),
                }
            }
            VariantOperation::ReplaceVariants { part_id, surviving } => {
                part_entry(&mut applied, *part_id).variants = surviving.clone();
            }
        }
    }

    for part in &mut applied {
        part.ensure_variant();
    }
    applied
}

pub fn part_number_updates(
    operations: &[VariantOperation],
) -> impl Iterator<Item = (PartId, &str)> + '_ {
    operations.iter().filter_map(|operation| match operation {
        VariantOperation::SetPartNumber { part_id, number } => Some((*part_id, number.as_str())),
        _ => None,
    })
}

fn find_persisted<'a>(persisted: &'a [Variant], draft: &VariantDraft) -> Option<&'a Variant> {
    persisted.iter().find(|stored| stored.id == draft.id)
}

fn merge(draft: &VariantDraft, stored: &Variant) -> Variant {
    Variant {
        created_at: stored.created_at,
        ..draft.to_variant()
    }
}

fn part_entry(parts: &mut Vec<QuotePart>, part_id: PartId) -> &mut QuotePart {
    let index = match parts.iter().position(|part| part.part_id == part_id) {
        Some(index) => index,
        None => {
            parts.push(QuotePart {
                part_id,
                variants: Vec::new(),
            });
            parts.len() - 1
        }
    };
    &mut parts[index]
}

#[cfg(test)]
mod tests {
    use super::{VariantOperation, apply_operations, part_number_updates, reconcile};
    use crate::{Part, PartId, PartsDraft, QuotePart, Variant, VariantId};
    use time::OffsetDateTime;

    fn variant(id: &str, price: Option<i64>) -> Variant {
        Variant {
            id: VariantId::from(id),
            note: String::new(),
            final_price_cents: price,
            list_price_cents: None,
            af: false,
            is_default: id == "v1",
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn catalog() -> Vec<Part> {
        vec![Part {
            id: PartId::new(1),
            name: "Bumper bar front".to_owned(),
            number: "52119-0K921".to_owned(),
            legacy_price_cents: None,
            legacy_list_price_cents: None,
            legacy_note: String::new(),
            legacy_af: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }]
    }

    fn original() -> Vec<QuotePart> {
        vec![QuotePart {
            part_id: PartId::new(1),
            variants: vec![variant("v1", Some(42_000)), variant("v2", Some(31_000))],
        }]
    }

    fn upserted_ids(operations: &[VariantOperation]) -> Vec<(String, bool)> {
        operations
            .iter()
            .filter_map(|operation| match operation {
                VariantOperation::UpsertVariant {
                    variant, created, ..
                } => Some((variant.id.to_string(), *created)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn untouched_draft_produces_no_operations() {
        let draft = PartsDraft::seed(&original(), &catalog());
        assert!(reconcile(&original(), &catalog(), &draft).is_empty());
    }

    #[test]
    fn adding_a_variant_reemits_every_sibling() {
        let original = original();
        let mut draft = PartsDraft::seed(&original, &catalog());
        let new_id = draft
            .part_mut(PartId::new(1))
            .expect("part in draft")
            .push_variant();

        let operations = reconcile(&original, &catalog(), &draft);
        assert_eq!(
            upserted_ids(&operations),
            vec![
                ("v1".to_owned(), false),
                ("v2".to_owned(), false),
                (new_id.to_string(), true),
            ]
        );
        assert!(
            !operations
                .iter()
                .any(|op| matches!(op, VariantOperation::ReplaceVariants { .. }))
        );

        let applied = apply_operations(&original, &operations);
        assert_eq!(applied[0].variants.len(), 3);
        assert!(reconcile(&applied, &catalog(), &draft).is_empty());
    }

    #[test]
    fn new_empty_variant_is_still_materialized() {
        let original = original();
        let mut draft = PartsDraft::seed(&original, &catalog());
        let new_id = draft
            .part_mut(PartId::new(1))
            .expect("part in draft")
            .push_variant();

        let operations = reconcile(&original, &catalog(), &draft);
        let created = operations.iter().find_map(|operation| match operation {
            VariantOperation::UpsertVariant {
                variant,
                created: true,
                ..
            } => Some(variant.clone()),
            _ => None,
        });
        let created = created.expect("new variant emitted");
        assert_eq!(created.id, new_id);
        assert!(created.note.is_empty());
        assert_eq!(created.final_price_cents, None);
    }

    #[test]
    fn removal_carries_only_surviving_variants() {
        let original = original();
        let mut draft = PartsDraft::seed(&original, &catalog());
        draft
            .part_mut(PartId::new(1))
            .expect("part in draft")
            .remove_variant(&VariantId::from("v2"));

        let operations = reconcile(&original, &catalog(), &draft);
        assert_eq!(
            operations,
            vec![VariantOperation::ReplaceVariants {
                part_id: PartId::new(1),
                surviving: vec![variant("v1", Some(42_000))],
            }]
        );

        let applied = apply_operations(&original, &operations);
        assert_eq!(applied[0].variants, vec![variant("v1", Some(42_000))]);
        assert!(reconcile(&applied, &catalog(), &draft).is_empty());
    }

    #[test]
    fn edited_variant_is_sent_with_merged_values() {
        let original = original();
        let mut draft = PartsDraft::seed(&original, &catalog());
        let part = draft.part_mut(PartId::new(1)).expect("part in draft");
        let edited = part
            .variant_mut(&VariantId::from("v2"))
            .expect("v2 in draft");
        edited.note = "second hand".to_owned();

        let operations = reconcile(&original, &catalog(), &draft);
        assert_eq!(
            operations,
            vec![VariantOperation::UpsertVariant {
                part_id: PartId::new(1),
                variant: Variant {
                    note: "second hand".to_owned(),
                    ..variant("v2", Some(31_000))
                },
                created: false,
            }]
        );
    }

    #[test]
    fn removing_every_variant_materializes_a_replacement_default() {
        let original = original();
        let mut draft = PartsDraft::seed(&original, &catalog());
        let part = draft.part_mut(PartId::new(1)).expect("part in draft");
        part.remove_variant(&VariantId::from("v1"));
        part.remove_variant(&VariantId::from("v2"));
        let replacement = part.variants[0].id.clone();

        let operations = reconcile(&original, &catalog(), &draft);
        assert_eq!(
            upserted_ids(&operations),
            vec![(replacement.to_string(), true)]
        );
        let surviving = operations.iter().find_map(|operation| match operation {
            VariantOperation::ReplaceVariants { surviving, .. } => Some(surviving.clone()),
            _ => None,
        });
        let surviving = surviving.expect("removal emitted");
        assert_eq!(surviving.len(), 1);
        assert_eq!(surviving[0].id, replacement);

        let applied = apply_operations(&original, &operations);
        assert_eq!(applied[0].variants.len(), 1);
        assert!(reconcile(&applied, &catalog(), &draft).is_empty());
    }

    #[test]
    fn part_number_change_targets_the_catalog_part() {
        let original = original();
        let mut draft = PartsDraft::seed(&original, &catalog());
        draft
            .part_mut(PartId::new(1))
            .expect("part in draft")
            .part_level
            .number = "52119-0K921, 52119-0K922".to_owned();

        let operations = reconcile(&original, &catalog(), &draft);
        assert_eq!(operations.len(), 1);
        assert_eq!(
            part_number_updates(&operations).collect::<Vec<_>>(),
            vec![(PartId::new(1), "52119-0K921, 52119-0K922")]
        );
        assert_eq!(apply_operations(&original, &operations), original);
    }

    #[test]
    fn legacy_part_without_variants_gets_its_default_created() {
        let original = vec![QuotePart {
            part_id: PartId::new(1),
            variants: Vec::new(),
        }];
        let draft = PartsDraft::seed(&original, &catalog());

        let operations = reconcile(&original, &catalog(), &draft);
        assert_eq!(operations.len(), 1);
        assert!(matches!(
            &operations[0],
            VariantOperation::UpsertVariant { created: true, .. }
        ));
    }
}
