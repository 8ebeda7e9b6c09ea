// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::{Part, PartId, QuotePart, Variant, VariantId, pricing};

/// Editable copy of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDraft {
    pub id: VariantId,
    pub note: String,
    pub final_price_cents: Option<i64>,
    pub list_price_cents: Option<i64>,
    pub af: bool,
    pub is_default: bool,
    pub created_at: OffsetDateTime,
}

impl VariantDraft {
    pub fn fresh(is_default: bool) -> Self {
        Self {
            is_default,
            ..Self::from(&Variant::empty_default())
        }
    }

    pub fn to_variant(&self) -> Variant {
        Variant {
            id: self.id.clone(),
            note: self.note.clone(),
            final_price_cents: self.final_price_cents,
            list_price_cents: self.list_price_cents,
            af: self.af,
            is_default: self.is_default,
            created_at: self.created_at,
        }
    }

    /// True when any user-editable field differs from `persisted`.
    pub fn differs_from(&self, persisted: &Variant) -> bool {
        self.note != persisted.note
            || self.final_price_cents != persisted.final_price_cents
            || self.list_price_cents != persisted.list_price_cents
            || self.af != persisted.af
    }

    pub fn is_priced(&self) -> bool {
        pricing::is_priced(self.final_price_cents)
    }
}

impl From<&Variant> for VariantDraft {
    fn from(variant: &Variant) -> Self {
        Self {
            id: variant.id.clone(),
            note: variant.note.clone(),
            final_price_cents: variant.final_price_cents,
            list_price_cents: variant.list_price_cents,
            af: variant.af,
            is_default: variant.is_default,
            created_at: variant.created_at,
        }
    }
}

/// Fields that belong to the catalog part rather than one variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartLevelDraft {
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDraft {
    pub part_id: PartId,
    pub part_level: PartLevelDraft,
    /// Display order is preserved; ids are unique within a part.
    pub variants: Vec<VariantDraft>,
}

impl PartDraft {
    pub fn variant(&self, id: &VariantId) -> Option<&VariantDraft> {
        self.variants.iter().find(|variant| &variant.id == id)
    }

    pub fn variant_mut(&mut self, id: &VariantId) -> Option<&mut VariantDraft> {
        self.variants.iter_mut().find(|variant| &variant.id == id)
    }

    pub fn contains(&self, id: &VariantId) -> bool {
        self.variant(id).is_some()
    }

    pub fn push_variant(&mut self) -> VariantId {
        let draft = VariantDraft::fresh(self.variants.is_empty());
        let id = draft.id.clone();
        self.variants.push(draft);
        id
    }

    /// Removes a variant, synthesizing an empty default when the part would
    /// otherwise be left without one. Returns false for unknown ids.
    pub fn remove_variant(&mut self, id: &VariantId) -> bool {
        let Some(index) = self.variants.iter().position(|variant| &variant.id == id) else {
            return false;
        };
        let removed = self.variants.remove(index);
        if self.variants.is_empty() {
            self.variants.push(VariantDraft::fresh(true));
        } else if removed.is_default && !self.variants.iter().any(|v| v.is_default) {
            self.variants[0].is_default = true;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartsDraft {
    pub parts: Vec<PartDraft>,
}

impl PartsDraft {
    /// Copies the persisted variants of every requested part. Parts without
    /// variants get one default, seeded from the catalog's legacy flat fields
    /// when the part still has them.
    pub fn seed(parts: &[QuotePart], catalog: &[Part]) -> Self {
        let parts = parts
            .iter()
            .map(|quote_part| {
                let catalog_part = catalog.iter().find(|part| part.id == quote_part.part_id);
                let mut variants = quote_part
                    .variants
                    .iter()
                    .map(VariantDraft::from)
                    .collect::<Vec<_>>();
                if variants.is_empty() {
                    let seeded = match catalog_part {
                        Some(part) if part.has_legacy_pricing() => VariantDraft {
                            id: VariantId::transient(),
                            ..VariantDraft::from(&Variant::from_legacy(
                                part,
                                OffsetDateTime::now_utc(),
                            ))
                        },
                        _ => VariantDraft::fresh(true),
                    };
                    variants.push(seeded);
                }
                PartDraft {
                    part_id: quote_part.part_id,
                    part_level: PartLevelDraft {
                        number: catalog_part
                            .map(|part| part.number.clone())
                            .unwrap_or_default(),
                    },
                    variants,
                }
            })
            .collect();
        Self { parts }
    }

    pub fn part(&self, part_id: PartId) -> Option<&PartDraft> {
        self.parts.iter().find(|part| part.part_id == part_id)
    }

    pub fn part_mut(&mut self, part_id: PartId) -> Option<&mut PartDraft> {
        self.parts.iter_mut().find(|part| part.part_id == part_id)
    }

    pub fn has_priced_variant(&self) -> bool {
        self.parts
            .iter()
            .flat_map(|part| part.variants.iter())
            .any(VariantDraft::is_priced)
    }

    pub fn variant_count(&self) -> usize {
        self.parts.iter().map(|part| part.variants.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{PartDraft, PartLevelDraft, PartsDraft, VariantDraft};
    use crate::{Part, PartId, QuotePart, Variant, VariantId};
    use time::OffsetDateTime;

    fn catalog_part(id: i64, legacy_price: Option<i64>) -> Part {
        Part {
            id: PartId::new(id),
            name: format!("part {id}"),
            number: format!("PN-{id}"),
            legacy_price_cents: legacy_price,
            legacy_list_price_cents: None,
            legacy_note: String::new(),
            legacy_af: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn variant(id: &str) -> Variant {
        Variant {
            id: VariantId::from(id),
            ..Variant::empty_default()
        }
    }

    #[test]
    fn seed_copies_persisted_variants_in_order() {
        let parts = vec![QuotePart {
            part_id: PartId::new(1),
            variants: vec![variant("v1"), variant("v2")],
        }];
        let draft = PartsDraft::seed(&parts, &[catalog_part(1, None)]);

        let part = draft.part(PartId::new(1)).expect("part seeded");
        let ids = part
            .variants
            .iter()
            .map(|v| v.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["v1", "v2"]);
        assert_eq!(part.part_level.number, "PN-1");
    }

    #[test]
    fn seed_synthesizes_default_for_parts_without_variants() {
        let parts = vec![
            QuotePart {
                part_id: PartId::new(1),
                variants: Vec::new(),
            },
            QuotePart {
                part_id: PartId::new(2),
                variants: Vec::new(),
            },
        ];
        let draft = PartsDraft::seed(&parts, &[catalog_part(1, Some(8_800))]);

        let legacy = &draft.part(PartId::new(1)).expect("part 1").variants;
        assert_eq!(legacy.len(), 1);
        assert!(legacy[0].id.is_transient());
        assert_eq!(legacy[0].final_price_cents, Some(8_800));
        assert!(legacy[0].af);

        let blank = &draft.part(PartId::new(2)).expect("part 2").variants;
        assert_eq!(blank.len(), 1);
        assert!(blank[0].is_default);
        assert_eq!(blank[0].final_price_cents, None);
        assert_eq!(
            draft.part(PartId::new(2)).expect("part 2").part_level,
            PartLevelDraft::default()
        );
    }

    #[test]
    fn removing_default_promotes_next_variant() {
        let mut part = PartDraft {
            part_id: PartId::new(1),
            part_level: PartLevelDraft::default(),
            variants: vec![
                VariantDraft::from(&Variant {
                    is_default: true,
                    ..variant("v1")
                }),
                VariantDraft::from(&Variant {
                    is_default: false,
                    ..variant("v2")
                }),
            ],
        };
        assert!(part.remove_variant(&VariantId::from("v1")));
        assert_eq!(part.variants.len(), 1);
        assert!(part.variants[0].is_default);
        assert!(!part.remove_variant(&VariantId::from("missing")));
    }

    #[test]
    fn removing_last_variant_keeps_one_empty_default() {
        let mut part = PartDraft {
            part_id: PartId::new(1),
            part_level: PartLevelDraft::default(),
            variants: vec![VariantDraft::from(&variant("v1"))],
        };
        assert!(part.remove_variant(&VariantId::from("v1")));
        assert_eq!(part.variants.len(), 1);
        let replacement = &part.variants[0];
        assert!(replacement.is_default);
        assert!(replacement.note.is_empty());
        assert_eq!(replacement.final_price_cents, None);
        assert_eq!(replacement.list_price_cents, None);
        assert!(replacement.id.is_transient());
    }
}
