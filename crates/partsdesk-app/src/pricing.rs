// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

/// Prices under ten dollars mark a part as unavailable rather than cheap.
pub const PRICE_FLOOR_CENTS: i64 = 1_000;

pub const UNAVAILABLE_LABEL: &str = "N/A";

pub fn is_priced(cents: Option<i64>) -> bool {
    matches!(cents, Some(value) if value >= PRICE_FLOOR_CENTS)
}

pub fn is_unavailable(cents: Option<i64>) -> bool {
    matches!(cents, Some(value) if value < PRICE_FLOOR_CENTS)
}

pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    let dollars = absolute / 100;
    let cents_component = absolute % 100;
    format!("{sign}${dollars}.{cents_component:02}")
}

pub fn format_price(cents: Option<i64>) -> String {
    match cents {
        None => String::new(),
        Some(value) if value < PRICE_FLOOR_CENTS => UNAVAILABLE_LABEL.to_owned(),
        Some(value) => format_money(value),
    }
}

/// Text offered to the clipboard affordance; sentinel prices are never copied.
pub fn copyable_price(cents: Option<i64>) -> Option<String> {
    match cents {
        Some(value) if value >= PRICE_FLOOR_CENTS => {
            Some(format!("{}.{:02}", value / 100, value % 100))
        }
        _ => None,
    }
}

pub fn parse_price(raw: &str) -> Result<Option<i64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).replace(',', "");
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        bail!("invalid price {raw:?}; enter a value like 120 or 120.50");
    }
    if fraction.len() > 2
        || !whole.chars().all(|ch| ch.is_ascii_digit())
        || !fraction.chars().all(|ch| ch.is_ascii_digit())
    {
        bail!("invalid price {raw:?}; enter a value like 120 or 120.50");
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| anyhow::anyhow!("price {raw:?} is too large"))?
    };
    let fraction_value: i64 = match fraction.len() {
        0 => 0,
        1 => i64::from(fraction.as_bytes()[0] - b'0') * 10,
        _ => fraction
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid price {raw:?}"))?,
    };

    whole_value
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(fraction_value))
        .map(Some)
        .ok_or_else(|| anyhow::anyhow!("price {raw:?} is too large"))
}
