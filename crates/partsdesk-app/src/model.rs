// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;
use crate::pricing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteStatus {
    Unpriced,
    WaitingVerification,
    Priced,
    Completed,
    Ordered,
    Delivered,
    Wrong,
}

impl QuoteStatus {
    pub const ALL: [Self; 7] = [
        Self::Unpriced,
        Self::WaitingVerification,
        Self::Priced,
        Self::Completed,
        Self::Ordered,
        Self::Delivered,
        Self::Wrong,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpriced => "unpriced",
            Self::WaitingVerification => "waiting_verification",
            Self::Priced => "priced",
            Self::Completed => "completed",
            Self::Ordered => "ordered",
            Self::Delivered => "delivered",
            Self::Wrong => "wrong",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unpriced" => Some(Self::Unpriced),
            "waiting_verification" => Some(Self::WaitingVerification),
            "priced" => Some(Self::Priced),
            "completed" => Some(Self::Completed),
            "ordered" => Some(Self::Ordered),
            "delivered" => Some(Self::Delivered),
            "wrong" => Some(Self::Wrong),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Unpriced => "unpriced",
            Self::WaitingVerification => "to verify",
            Self::Priced => "priced",
            Self::Completed => "completed",
            Self::Ordered => "ordered",
            Self::Delivered => "delivered",
            Self::Wrong => "wrong",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Created,
    Priced,
    Verified,
}

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Priced => "PRICED",
            Self::Verified => "VERIFIED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CREATED" => Some(Self::Created),
            "PRICED" => Some(Self::Priced),
            "VERIFIED" => Some(Self::Verified),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    EditQuote,
    EditParts,
    EditCatalogPart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// One priced option for a requested part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub final_price_cents: Option<i64>,
    #[serde(default)]
    pub list_price_cents: Option<i64>,
    #[serde(default)]
    pub af: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Variant {
    pub fn empty_default() -> Self {
        Self {
            id: VariantId::transient(),
            note: String::new(),
            final_price_cents: None,
            list_price_cents: None,
            af: false,
            is_default: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Default variant carrying the flat price fields of a pre-variant part.
    pub fn from_legacy(part: &Part, created_at: OffsetDateTime) -> Self {
        Self {
            id: VariantId::legacy_default(part.id),
            note: part.legacy_note.clone(),
            final_price_cents: part.legacy_price_cents,
            list_price_cents: part.legacy_list_price_cents,
            af: part.legacy_af,
            is_default: true,
            created_at,
        }
    }

    pub fn is_priced(&self) -> bool {
        pricing::is_priced(self.final_price_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePart {
    pub part_id: PartId,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl QuotePart {
    pub fn new(part_id: PartId) -> Self {
        Self {
            part_id,
            variants: vec![Variant::empty_default()],
        }
    }

    /// Restores the "at least one variant" invariant.
    pub fn ensure_variant(&mut self) {
        if self.variants.is_empty() {
            self.variants.push(Variant::empty_default());
        }
    }

    pub fn has_priced_variant(&self) -> bool {
        self.variants.iter().any(Variant::is_priced)
    }
}

/// Catalog part. The flat `legacy_*` fields predate variants and are only
/// read to seed a default variant for old records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    pub name: String,
    pub number: String,
    pub legacy_price_cents: Option<i64>,
    pub legacy_list_price_cents: Option<i64>,
    pub legacy_note: String,
    pub legacy_af: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Part {
    pub fn numbers(&self) -> Vec<&str> {
        self.number
            .split(',')
            .map(str::trim)
            .filter(|number| !number.is_empty())
            .collect()
    }

    pub fn has_legacy_pricing(&self) -> bool {
        self.legacy_price_cents.is_some()
            || self.legacy_list_price_cents.is_some()
            || !self.legacy_note.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub quote_ref: String,
    pub make: String,
    pub model: String,
    pub series: String,
    pub year_month: String,
    pub body: String,
    pub auto_transmission: bool,
    pub vin: String,
    pub rego: String,
    pub customer_name: String,
    pub customer_address: String,
    pub settlement_percent: Option<i32>,
    pub status: Option<String>,
    pub required_by: Option<String>,
    pub notes: String,
    pub parts_requested: Vec<QuotePart>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Quote {
    pub fn display_status(&self) -> QuoteStatus {
        crate::status::resolve_status(&self.parts_requested, self.status.as_deref())
    }

    pub fn priced_part_count(&self) -> usize {
        self.parts_requested
            .iter()
            .filter(|part| part.has_priced_variant())
            .count()
    }

    pub fn vehicle_summary(&self) -> String {
        [
            self.year_month.as_str(),
            self.make.as_str(),
            self.model.as_str(),
            self.series.as_str(),
        ]
        .into_iter()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn quote_part(&self, part_id: PartId) -> Option<&QuotePart> {
        self.parts_requested
            .iter()
            .find(|part| part.part_id == part_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub quote_id: QuoteId,
    pub kind: ActionKind,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::{ActionKind, Part, QuotePart, QuoteStatus, Variant};
    use crate::{PartId, VariantId};
    use time::OffsetDateTime;

    fn priced(id: &str, cents: Option<i64>) -> Variant {
        Variant {
            id: VariantId::from(id),
            final_price_cents: cents,
            ..Variant::empty_default()
        }
    }

    #[test]
    fn status_parse_round_trips_every_value() {
        for status in QuoteStatus::ALL {
            assert_eq!(QuoteStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QuoteStatus::parse("active"), None);
    }

    #[test]
    fn action_kind_uses_upper_case_storage_values() {
        assert_eq!(ActionKind::Verified.as_str(), "VERIFIED");
        assert_eq!(ActionKind::parse("PRICED"), Some(ActionKind::Priced));
        assert_eq!(ActionKind::parse("priced"), None);
    }

    #[test]
    fn sentinel_prices_do_not_count_as_priced() {
        let part = QuotePart {
            part_id: PartId::new(1),
            variants: vec![priced("v1", Some(999)), priced("v2", None)],
        };
        assert!(!part.has_priced_variant());

        let part = QuotePart {
            part_id: PartId::new(1),
            variants: vec![priced("v1", Some(999)), priced("v2", Some(1_000))],
        };
        assert!(part.has_priced_variant());
    }

    #[test]
    fn part_numbers_split_comma_joined_values() {
        let part = Part {
            id: PartId::new(1),
            name: "Headlamp LH".to_owned(),
            number: "8110-0K010, 8110-0K011,,".to_owned(),
            legacy_price_cents: None,
            legacy_list_price_cents: None,
            legacy_note: String::new(),
            legacy_af: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        assert_eq!(part.numbers(), vec!["8110-0K010", "8110-0K011"]);
        assert!(!part.has_legacy_pricing());
    }

    #[test]
    fn variant_json_round_trip_keeps_rfc3339_timestamp() {
        let variant = Variant {
            id: VariantId::from("v7"),
            note: "genuine".to_owned(),
            final_price_cents: Some(12_050),
            list_price_cents: Some(15_000),
            af: true,
            is_default: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&variant).expect("serialize variant");
        assert!(json.contains("\"1970-01-01T00:00:00Z\""));
        let decoded: Variant = serde_json::from_str(&json).expect("decode variant");
        assert_eq!(decoded, variant);
    }
}
