// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::UtcOffset;

use crate::{Part, PartId, Quote, deadline, pricing};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuoteFormInput {
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
    pub required_by: Option<String>,
    pub notes: String,
    pub part_ids: Vec<PartId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteField {
    QuoteRef,
    Make,
    Model,
    Series,
    YearMonth,
    Body,
    AutoTransmission,
    Vin,
    Rego,
    CustomerName,
    CustomerAddress,
    SettlementPercent,
    RequiredBy,
    Notes,
}

impl QuoteField {
    pub const ALL: [Self; 14] = [
        Self::QuoteRef,
        Self::Make,
        Self::Model,
        Self::Series,
        Self::YearMonth,
        Self::Body,
        Self::AutoTransmission,
        Self::Vin,
        Self::Rego,
        Self::CustomerName,
        Self::CustomerAddress,
        Self::SettlementPercent,
        Self::RequiredBy,
        Self::Notes,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::QuoteRef => "ref",
            Self::Make => "make",
            Self::Model => "model",
            Self::Series => "series",
            Self::YearMonth => "year/month",
            Self::Body => "body",
            Self::AutoTransmission => "auto",
            Self::Vin => "VIN",
            Self::Rego => "rego",
            Self::CustomerName => "customer",
            Self::CustomerAddress => "address",
            Self::SettlementPercent => "settlement %",
            Self::RequiredBy => "required by",
            Self::Notes => "notes",
        }
    }
}

impl QuoteFormInput {
    pub fn from_quote(quote: &Quote) -> Self {
        Self {
            quote_ref: quote.quote_ref.clone(),
            make: quote.make.clone(),
            model: quote.model.clone(),
            series: quote.series.clone(),
            year_month: quote.year_month.clone(),
            body: quote.body.clone(),
            auto_transmission: quote.auto_transmission,
            vin: quote.vin.clone(),
            rego: quote.rego.clone(),
            customer_name: quote.customer_name.clone(),
            customer_address: quote.customer_address.clone(),
            settlement_percent: quote.settlement_percent,
            required_by: quote.required_by.clone(),
            notes: quote.notes.clone(),
            part_ids: quote
                .parts_requested
                .iter()
                .map(|part| part.part_id)
                .collect(),
        }
    }

    pub fn field_value(&self, field: QuoteField) -> String {
        match field {
            QuoteField::QuoteRef => self.quote_ref.clone(),
            QuoteField::Make => self.make.clone(),
            QuoteField::Model => self.model.clone(),
            QuoteField::Series => self.series.clone(),
            QuoteField::YearMonth => self.year_month.clone(),
            QuoteField::Body => self.body.clone(),
            QuoteField::AutoTransmission => {
                if self.auto_transmission { "yes" } else { "no" }.to_owned()
            }
            QuoteField::Vin => self.vin.clone(),
            QuoteField::Rego => self.rego.clone(),
            QuoteField::CustomerName => self.customer_name.clone(),
            QuoteField::CustomerAddress => self.customer_address.clone(),
            QuoteField::SettlementPercent => self
                .settlement_percent
                .map(|value| value.to_string())
                .unwrap_or_default(),
            QuoteField::RequiredBy => self.required_by.clone().unwrap_or_default(),
            QuoteField::Notes => self.notes.clone(),
        }
    }

    pub fn set_field(&mut self, field: QuoteField, raw: &str) -> Result<()> {
        let trimmed = raw.trim();
        match field {
            QuoteField::QuoteRef => self.quote_ref = trimmed.to_owned(),
            QuoteField::Make => self.make = trimmed.to_owned(),
            QuoteField::Model => self.model = trimmed.to_owned(),
            QuoteField::Series => self.series = trimmed.to_owned(),
            QuoteField::YearMonth => self.year_month = trimmed.to_owned(),
            QuoteField::Body => self.body = trimmed.to_owned(),
            QuoteField::AutoTransmission => {
                self.auto_transmission = match trimmed.to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "y" | "auto" => true,
                    "0" | "false" | "no" | "n" | "manual" | "" => false,
                    _ => bail!("auto must be yes or no, got {trimmed:?}"),
                };
            }
            QuoteField::Vin => self.vin = trimmed.to_ascii_uppercase(),
            QuoteField::Rego => self.rego = trimmed.to_ascii_uppercase(),
            QuoteField::CustomerName => self.customer_name = trimmed.to_owned(),
            QuoteField::CustomerAddress => self.customer_address = trimmed.to_owned(),
            QuoteField::SettlementPercent => {
                self.settlement_percent = if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.trim_end_matches('%').parse().map_err(|_| {
                        anyhow::anyhow!("settlement must be a whole percentage, got {trimmed:?}")
                    })?)
                };
            }
            QuoteField::RequiredBy => {
                self.required_by = (!trimmed.is_empty()).then(|| trimmed.to_owned());
            }
            QuoteField::Notes => self.notes = raw.to_owned(),
        }
        Ok(())
    }

    /// Adds the part when absent and removes it otherwise. Returns whether
    /// the part is now requested.
    pub fn toggle_part(&mut self, part_id: PartId) -> bool {
        if let Some(index) = self.part_ids.iter().position(|id| *id == part_id) {
            self.part_ids.remove(index);
            false
        } else {
            self.part_ids.push(part_id);
            true
        }
    }

    pub fn validate(&self, local_offset: UtcOffset) -> Result<()> {
        if self.quote_ref.trim().is_empty() {
            bail!("quote reference is required -- enter a reference and retry");
        }
        if self.make.trim().is_empty() {
            bail!("vehicle make is required -- enter a make and retry");
        }
        if let Some(percent) = self.settlement_percent
            && !(0..=100).contains(&percent)
        {
            bail!("settlement percentage must be between 0 and 100, got {percent}");
        }
        if let Some(required_by) = &self.required_by
            && deadline::parse_deadline(required_by, local_offset).is_err()
        {
            bail!(
                "required-by {required_by:?} is not a date -- use 2026-10-19T15:30 or 19/10/2026 3:30pm"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartFormInput {
    pub name: String,
    pub number: String,
    pub legacy_price_cents: Option<i64>,
    pub legacy_list_price_cents: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartField {
    Name,
    Number,
    Price,
    ListPrice,
}

impl PartField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Number, Self::Price, Self::ListPrice];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Number => "number",
            Self::Price => "price",
            Self::ListPrice => "list price",
        }
    }
}

impl PartFormInput {
    pub fn from_part(part: &Part) -> Self {
        Self {
            name: part.name.clone(),
            number: part.number.clone(),
            legacy_price_cents: part.legacy_price_cents,
            legacy_list_price_cents: part.legacy_list_price_cents,
        }
    }

    pub fn field_value(&self, field: PartField) -> String {
        match field {
            PartField::Name => self.name.clone(),
            PartField::Number => self.number.clone(),
            PartField::Price => editable_cents(self.legacy_price_cents),
            PartField::ListPrice => editable_cents(self.legacy_list_price_cents),
        }
    }

    pub fn set_field(&mut self, field: PartField, raw: &str) -> Result<()> {
        let trimmed = raw.trim();
        match field {
            PartField::Name => self.name = trimmed.to_owned(),
            PartField::Number => self.number = trimmed.to_owned(),
            PartField::Price => self.legacy_price_cents = pricing::parse_price(trimmed)?,
            PartField::ListPrice => {
                self.legacy_list_price_cents = pricing::parse_price(trimmed)?;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("part name is required -- enter a name and retry");
        }
        if self.number.split(',').any(|number| number.trim().contains(' ')) {
            bail!("part numbers cannot contain spaces -- separate multiple numbers with commas");
        }
        for (label, cents) in [
            ("price", self.legacy_price_cents),
            ("list price", self.legacy_list_price_cents),
        ] {
            if let Some(cents) = cents
                && cents < 0
            {
                bail!("{label} cannot be negative -- enter 0 or more");
            }
        }
        Ok(())
    }
}

// Sentinel prices stay editable as plain numbers, unlike the N/A display.
fn editable_cents(cents: Option<i64>) -> String {
    cents
        .map(|value| format!("{}.{:02}", value / 100, value % 100))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{PartField, PartFormInput, QuoteField, QuoteFormInput};
    use crate::{Part, PartId};
    use time::{OffsetDateTime, UtcOffset};

    fn valid_quote() -> QuoteFormInput {
        QuoteFormInput {
            quote_ref: "Q-1042".to_owned(),
            make: "Toyota".to_owned(),
            model: "Corolla".to_owned(),
            ..QuoteFormInput::default()
        }
    }

    #[test]
    fn quote_validation_requires_reference_and_make() {
        assert!(valid_quote().validate(UtcOffset::UTC).is_ok());

        let missing_ref = QuoteFormInput {
            quote_ref: "  ".to_owned(),
            ..valid_quote()
        };
        let error = missing_ref
            .validate(UtcOffset::UTC)
            .expect_err("reference required");
        assert!(error.to_string().contains("quote reference is required"));

        let missing_make = QuoteFormInput {
            make: String::new(),
            ..valid_quote()
        };
        assert!(missing_make.validate(UtcOffset::UTC).is_err());
    }

    #[test]
    fn quote_validation_checks_settlement_and_deadline() {
        let bad_percent = QuoteFormInput {
            settlement_percent: Some(140),
            ..valid_quote()
        };
        assert!(bad_percent.validate(UtcOffset::UTC).is_err());

        let bad_deadline = QuoteFormInput {
            required_by: Some("soon".to_owned()),
            ..valid_quote()
        };
        let error = bad_deadline
            .validate(UtcOffset::UTC)
            .expect_err("deadline must parse");
        assert!(error.to_string().contains("is not a date"));

        let legacy_deadline = QuoteFormInput {
            required_by: Some("19/10/2026 3:30pm".to_owned()),
            ..valid_quote()
        };
        assert!(legacy_deadline.validate(UtcOffset::UTC).is_ok());
    }

    #[test]
    fn set_field_normalizes_input() -> anyhow::Result<()> {
        let mut form = valid_quote();
        form.set_field(QuoteField::Vin, " jtdbr32e120045678 ")?;
        form.set_field(QuoteField::AutoTransmission, "Yes")?;
        form.set_field(QuoteField::SettlementPercent, "15%")?;
        form.set_field(QuoteField::RequiredBy, "")?;

        assert_eq!(form.vin, "JTDBR32E120045678");
        assert!(form.auto_transmission);
        assert_eq!(form.settlement_percent, Some(15));
        assert_eq!(form.required_by, None);
        assert_eq!(form.field_value(QuoteField::AutoTransmission), "yes");
        assert!(form.set_field(QuoteField::SettlementPercent, "ten").is_err());
        Ok(())
    }

    #[test]
    fn part_validation_rejects_blank_name() {
        assert!(PartFormInput::default().validate().is_err());
        assert!(
            PartFormInput {
                name: "Radiator".to_owned(),
                number: "16400-0T040,16400-0T041".to_owned(),
                ..PartFormInput::default()
            }
            .validate()
            .is_ok()
        );
        assert!(
            PartFormInput {
                name: "Radiator".to_owned(),
                number: "16400 0T040".to_owned(),
                ..PartFormInput::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            PartFormInput {
                name: "Radiator".to_owned(),
                legacy_price_cents: Some(-500),
                ..PartFormInput::default()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn toggle_part_adds_then_removes() {
        let mut form = valid_quote();
        assert!(form.toggle_part(PartId::new(4)));
        assert!(form.toggle_part(PartId::new(9)));
        assert_eq!(form.part_ids, vec![PartId::new(4), PartId::new(9)]);

        assert!(!form.toggle_part(PartId::new(4)));
        assert_eq!(form.part_ids, vec![PartId::new(9)]);
    }

    #[test]
    fn part_form_round_trips_catalog_fields() -> anyhow::Result<()> {
        let part = Part {
            id: PartId::new(3),
            name: "Bonnet".to_owned(),
            number: "53301-02200".to_owned(),
            legacy_price_cents: Some(500),
            legacy_list_price_cents: None,
            legacy_note: String::new(),
            legacy_af: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let mut form = PartFormInput::from_part(&part);
        assert_eq!(form.field_value(PartField::Price), "5.00");
        assert_eq!(form.field_value(PartField::ListPrice), "");

        form.set_field(PartField::Name, "  Bonnet panel ")?;
        form.set_field(PartField::ListPrice, "$1,240.5")?;
        form.set_field(PartField::Price, "")?;

        assert_eq!(form.name, "Bonnet panel");
        assert_eq!(form.legacy_list_price_cents, Some(124_050));
        assert_eq!(form.legacy_price_cents, None);
        assert!(form.set_field(PartField::Price, "cheap").is_err());
        Ok(())
    }
}
