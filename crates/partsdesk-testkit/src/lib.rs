// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use partsdesk_app::{PartFormInput, PartId, QuoteFormInput, QuotePart, Variant, VariantId};
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

const MAKES: [(&str, &[&str]); 8] = [
    ("Toyota", &["Corolla", "Camry", "HiLux", "RAV4", "LandCruiser"]),
    ("Mazda", &["Mazda3", "CX-5", "BT-50", "CX-3"]),
    ("Ford", &["Ranger", "Focus", "Everest", "Falcon"]),
    ("Holden", &["Commodore", "Colorado", "Cruze"]),
    ("Hyundai", &["i30", "Tucson", "Santa Fe"]),
    ("Mitsubishi", &["Triton", "Outlander", "ASX", "Lancer"]),
    ("Nissan", &["Navara", "X-Trail", "Patrol"]),
    ("Subaru", &["Forester", "Outback", "Impreza"]),
];

const BODIES: [&str; 6] = ["Sedan", "Hatch", "Wagon", "Ute", "SUV", "Van"];

const PART_NAMES: [&str; 20] = [
    "Bumper bar front",
    "Bumper bar rear",
    "Headlamp LH",
    "Headlamp RH",
    "Tail lamp LH",
    "Tail lamp RH",
    "Bonnet",
    "Guard LH front",
    "Guard RH front",
    "Radiator",
    "Condenser",
    "Radiator support panel",
    "Grille",
    "Door mirror LH",
    "Door mirror RH",
    "Windscreen",
    "Intercooler",
    "Fog lamp LH",
    "Bumper reinforcement",
    "Airbag module driver",
];

const VARIANT_NOTES: [&str; 8] = [
    "genuine",
    "aftermarket, 3-5 days",
    "used, good condition",
    "used, minor scratches",
    "reco, needs paint",
    "back order",
    "ex-stock Sydney",
    "",
];

const FIRST_NAMES: [&str; 12] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Robin",
];
const LAST_NAMES: [&str; 12] = [
    "Walker", "Nguyen", "Hill", "Evans", "Smith", "Gray", "Ward", "Young", "Kelly", "Reed",
    "Turner", "Brooks",
];
const REPAIRER_SUFFIXES: [&str; 4] = ["Smash Repairs", "Collision Centre", "Panel & Paint", "Auto Body"];
const SUBURBS: [&str; 8] = [
    "Parramatta",
    "Penrith",
    "Blacktown",
    "Liverpool",
    "Campbelltown",
    "Hornsby",
    "Chatswood",
    "Ryde",
];

struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of realistic workshop data. The same seed always yields
/// the same sequence.
pub struct PartsFaker {
    rng: DeterministicRng,
    variants_issued: u64,
}

impl PartsFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            variants_issued: 0,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn part(&mut self) -> PartFormInput {
        let name = self.pick(&PART_NAMES).to_owned();
        let count = self.int_range(1, 2);
        let number = (0..count)
            .map(|_| self.part_number())
            .collect::<Vec<_>>()
            .join(",");
        let legacy_price_cents = (self.int_range(1, 4) == 1).then(|| self.price_cents());
        PartFormInput {
            name,
            number,
            legacy_price_cents,
            legacy_list_price_cents: None,
        }
    }

    /// Quote form for `part_ids`, due somewhere between overdue and three
    /// days after `now`.
    pub fn quote(&mut self, part_ids: &[PartId], now: OffsetDateTime) -> QuoteFormInput {
        let (make, models) = MAKES[self.rng.int_n(MAKES.len())];
        let model = self.pick(models).to_owned();
        let year = self.int_range(2008, 2025);
        let month = self.int_range(1, 12);
        let required_by = if self.int_range(1, 5) == 1 {
            None
        } else {
            let minutes = self.int_range(-120, 3 * 24 * 60);
            (now + Duration::minutes(minutes)).format(&Rfc3339).ok()
        };

        QuoteFormInput {
            quote_ref: format!("Q-{:05}", self.int_range(1, 99_999)),
            make: make.to_owned(),
            model,
            series: String::new(),
            year_month: format!("{year}/{month:02}"),
            body: self.pick(&BODIES).to_owned(),
            auto_transmission: self.rng.bool(),
            vin: self.vin(),
            rego: self.rego(),
            customer_name: self.repairer_name(),
            customer_address: format!(
                "{} {} St, {}",
                self.int_range(1, 240),
                self.pick(&LAST_NAMES),
                self.pick(&SUBURBS)
            ),
            settlement_percent: (self.int_range(1, 3) == 1)
                .then(|| i32::try_from(self.int_range(5, 20)).unwrap_or(10)),
            required_by,
            notes: String::new(),
            part_ids: part_ids.to_vec(),
        }
    }

    /// A variant with a stable id; roughly one in six carries a sentinel
    /// price below the floor.
    pub fn variant(&mut self, is_default: bool, created_at: OffsetDateTime) -> Variant {
        self.variants_issued += 1;
        let final_price_cents = match self.int_range(1, 6) {
            1 => None,
            2 => Some(self.int_range(0, 999)),
            _ => Some(self.price_cents()),
        };
        let list_price_cents = final_price_cents
            .filter(|cents| *cents >= 1_000)
            .map(|cents| cents + cents * self.int_range(5, 40) / 100);
        Variant {
            id: VariantId::new(format!("fake-{}", self.variants_issued)),
            note: self.pick(&VARIANT_NOTES).to_owned(),
            final_price_cents,
            list_price_cents,
            af: self.rng.bool(),
            is_default,
            created_at,
        }
    }

    pub fn quote_parts(&mut self, part_ids: &[PartId], created_at: OffsetDateTime) -> Vec<QuotePart> {
        part_ids
            .iter()
            .map(|part_id| {
                let count = self.int_range(1, 3);
                let variants = (0..count)
                    .map(|index| self.variant(index == 0, created_at))
                    .collect();
                QuotePart {
                    part_id: *part_id,
                    variants,
                }
            })
            .collect()
    }

    fn price_cents(&mut self) -> i64 {
        self.int_range(25, 2_400) * 100 + self.int_range(0, 1) * 50
    }

    fn part_number(&mut self) -> String {
        format!(
            "{:05}-{}{:03}",
            self.int_range(10_000, 99_999),
            (b'0' + u8::try_from(self.int_n(10)).unwrap_or(0)) as char,
            self.int_range(0, 999)
        )
    }

    fn vin(&mut self) -> String {
        const VIN_CHARS: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ0123456789";
        (0..17)
            .map(|_| VIN_CHARS[self.rng.int_n(VIN_CHARS.len())] as char)
            .collect()
    }

    fn rego(&mut self) -> String {
        const LETTERS: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ";
        let mut rego = String::with_capacity(6);
        for _ in 0..3 {
            rego.push(LETTERS[self.rng.int_n(LETTERS.len())] as char);
        }
        rego.push_str(&format!("{:02}", self.int_range(0, 99)));
        rego.push(LETTERS[self.rng.int_n(LETTERS.len())] as char);
        rego
    }

    fn repairer_name(&mut self) -> String {
        if self.rng.bool() {
            format!(
                "{}'s {}",
                self.pick(&LAST_NAMES),
                self.pick(&REPAIRER_SUFFIXES)
            )
        } else {
            format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("partsdesk.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-10-19T15:00:00+10:00"
}

pub fn part_names() -> &'static [&'static str] {
    &PART_NAMES
}

#[cfg(test)]
mod tests {
    use super::{PartsFaker, part_names};
    use partsdesk_app::{PartId, pricing};
    use std::collections::BTreeSet;
    use time::macros::datetime;

    #[test]
    fn same_seed_same_data() {
        let mut left = PartsFaker::new(42);
        let mut right = PartsFaker::new(42);
        assert_eq!(left.part(), right.part());
        let now = datetime!(2026-10-19 15:00:00 +10:00);
        assert_eq!(
            left.quote(&[PartId::new(1)], now),
            right.quote(&[PartId::new(1)], now)
        );
    }

    #[test]
    fn parts_are_valid_catalog_entries() {
        let mut faker = PartsFaker::new(7);
        for _ in 0..50 {
            let part = faker.part();
            part.validate().expect("generated part should validate");
            assert!(part_names().contains(&part.name.as_str()));
        }
    }

    #[test]
    fn quotes_pass_form_validation() {
        let mut faker = PartsFaker::new(9);
        let now = datetime!(2026-10-19 15:00:00 +10:00);
        for _ in 0..50 {
            let quote = faker.quote(&[PartId::new(1), PartId::new(2)], now);
            quote
                .validate(time::UtcOffset::UTC)
                .expect("generated quote should validate");
            assert_eq!(quote.vin.len(), 17);
            assert_eq!(quote.part_ids.len(), 2);
        }
    }

    #[test]
    fn quote_parts_keep_one_default_each() {
        let mut faker = PartsFaker::new(3);
        let parts = faker.quote_parts(
            &[PartId::new(1), PartId::new(2), PartId::new(3)],
            datetime!(2026-10-01 09:00:00 UTC),
        );
        assert_eq!(parts.len(), 3);
        let mut ids = BTreeSet::new();
        for part in &parts {
            assert!(!part.variants.is_empty());
            assert_eq!(part.variants.iter().filter(|v| v.is_default).count(), 1);
            for variant in &part.variants {
                assert!(ids.insert(variant.id.clone()), "duplicate {}", variant.id);
            }
        }
    }

    #[test]
    fn variants_include_sentinel_prices_across_seeds() {
        let created_at = datetime!(2026-10-01 09:00:00 UTC);
        let mut faker = PartsFaker::new(11);
        let prices = (0..200)
            .map(|_| faker.variant(true, created_at).final_price_cents)
            .collect::<Vec<_>>();
        assert!(prices.iter().any(|cents| pricing::is_unavailable(*cents)));
        assert!(prices.iter().any(|cents| pricing::is_priced(*cents)));
        assert!(prices.iter().any(Option::is_none));
    }
}
