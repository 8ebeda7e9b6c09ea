// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::deadline::{self, DeadlineInfo};
use crate::{Quote, QuoteId, QuoteStatus, SortDirection};

pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSortKey {
    RequiredBy,
    CreatedAt,
    Status,
    Reference,
}

impl QuoteSortKey {
    pub const ALL: [Self; 4] = [
        Self::RequiredBy,
        Self::CreatedAt,
        Self::Status,
        Self::Reference,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequiredBy => "required_by",
            Self::CreatedAt => "created_at",
            Self::Status => "status",
            Self::Reference => "reference",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RequiredBy => "due",
            Self::CreatedAt => "created",
            Self::Status => "status",
            Self::Reference => "ref",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL
            .iter()
            .position(|key| *key == self)
            .unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

/// Empty `statuses` shows every status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuoteFilter {
    pub statuses: Vec<QuoteStatus>,
    pub search: String,
}

impl QuoteFilter {
    pub fn toggle_status(&mut self, status: QuoteStatus) {
        if let Some(index) = self.statuses.iter().position(|s| *s == status) {
            self.statuses.remove(index);
        } else {
            self.statuses.push(status);
        }
    }

    pub fn is_active(&self) -> bool {
        !self.statuses.is_empty() || !self.search.trim().is_empty()
    }

    fn matches(&self, quote: &Quote, status: QuoteStatus) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&status) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            &quote.quote_ref,
            &quote.make,
            &quote.model,
            &quote.vin,
            &quote.rego,
            &quote.customer_name,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRow {
    pub id: QuoteId,
    pub quote_ref: String,
    pub status: QuoteStatus,
    pub vehicle: String,
    pub customer: String,
    pub priced_parts: usize,
    pub total_parts: usize,
    pub deadline: Option<DeadlineInfo>,
    pub created_at: OffsetDateTime,
}

impl QuoteRow {
    fn from_quote(quote: &Quote, now: OffsetDateTime) -> Self {
        Self {
            id: quote.id,
            quote_ref: quote.quote_ref.clone(),
            status: quote.display_status(),
            vehicle: quote.vehicle_summary(),
            customer: quote.customer_name.clone(),
            priced_parts: quote.priced_part_count(),
            total_parts: quote.parts_requested.len(),
            deadline: deadline::deadline_info(quote.required_by.as_deref(), now),
            created_at: quote.created_at,
        }
    }

    pub fn parts_summary(&self) -> String {
        format!("{}/{}", self.priced_parts, self.total_parts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteTablePage {
    pub rows: Vec<QuoteRow>,
    /// Zero-based, already clamped.
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteTableView {
    pub filter: QuoteFilter,
    pub sort_key: QuoteSortKey,
    pub direction: SortDirection,
    pub page: usize,
    pub page_size: usize,
}

impl Default for QuoteTableView {
    fn default() -> Self {
        Self {
            filter: QuoteFilter::default(),
            sort_key: QuoteSortKey::RequiredBy,
            direction: SortDirection::Asc,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QuoteTableView {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn project(&self, quotes: &[Quote], now: OffsetDateTime) -> QuoteTablePage {
        let mut rows = quotes
            .iter()
            .filter_map(|quote| {
                let row = QuoteRow::from_quote(quote, now);
                self.filter.matches(quote, row.status).then_some(row)
            })
            .collect::<Vec<_>>();
        rows.sort_by(|left, right| self.compare(left, right));

        let page_size = self.page_size.max(1);
        let total_rows = rows.len();
        let total_pages = total_rows.div_ceil(page_size).max(1);
        let page = self.page.min(total_pages - 1);
        let rows = rows
            .into_iter()
            .skip(page * page_size)
            .take(page_size)
            .collect();

        QuoteTablePage {
            rows,
            page,
            total_pages,
            total_rows,
        }
    }

    pub fn next_page(&mut self, total_pages: usize) {
        if self.page + 1 < total_pages {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    /// Selecting the current key again flips the direction.
    pub fn sort_by(&mut self, key: QuoteSortKey) {
        if self.sort_key == key {
            self.direction = self.direction.flipped();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Asc;
        }
        self.page = 0;
    }

    fn compare(&self, left: &QuoteRow, right: &QuoteRow) -> Ordering {
        let primary = match self.sort_key {
            QuoteSortKey::RequiredBy => {
                let left_due = left.deadline.as_ref().map(|info| info.minutes_remaining);
                let right_due = right.deadline.as_ref().map(|info| info.minutes_remaining);
                match (left_due, right_due) {
                    (Some(l), Some(r)) => self.directed(l.cmp(&r)),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
            QuoteSortKey::CreatedAt => self.directed(left.created_at.cmp(&right.created_at)),
            QuoteSortKey::Status => self.directed(status_order(left.status).cmp(&status_order(
                right.status,
            ))),
            QuoteSortKey::Reference => self.directed(
                left.quote_ref
                    .to_lowercase()
                    .cmp(&right.quote_ref.to_lowercase()),
            ),
        };
        primary.then_with(|| right.id.cmp(&left.id))
    }

    fn directed(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

fn status_order(status: QuoteStatus) -> u8 {
    status.rank().unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::{QuoteSortKey, QuoteTableView};
    use crate::{Quote, QuoteId, QuoteStatus, SortDirection};
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};

    const NOW: OffsetDateTime = datetime!(2026-10-19 09:00:00 +10:00);

    fn quote(id: i64, status: &str, due_minutes: Option<i64>) -> Quote {
        Quote {
            id: QuoteId::new(id),
            quote_ref: format!("Q-{id:03}"),
            make: "Holden".to_owned(),
            model: "Commodore".to_owned(),
            series: "VF".to_owned(),
            year_month: "2015/06".to_owned(),
            body: String::new(),
            auto_transmission: true,
            vin: String::new(),
            rego: format!("ABC{id}"),
            customer_name: "Ray's Smash Repairs".to_owned(),
            customer_address: String::new(),
            settlement_percent: None,
            status: Some(status.to_owned()),
            required_by: due_minutes.map(|minutes| {
                (NOW + Duration::minutes(minutes))
                    .format(&time::format_description::well_known::Rfc3339)
                    .expect("format deadline")
            }),
            notes: String::new(),
            parts_requested: Vec::new(),
            created_at: NOW - Duration::days(id),
            updated_at: NOW,
        }
    }

    fn ids(view: &QuoteTableView, quotes: &[Quote]) -> Vec<i64> {
        view.project(quotes, NOW)
            .rows
            .iter()
            .map(|row| row.id.get())
            .collect()
    }

    #[test]
    fn required_by_sort_puts_missing_deadlines_last() {
        let quotes = vec![
            quote(1, "unpriced", None),
            quote(2, "unpriced", Some(120)),
            quote(3, "unpriced", Some(5)),
            quote(4, "unpriced", None),
        ];
        let mut view = QuoteTableView::default();
        assert_eq!(ids(&view, &quotes), vec![3, 2, 4, 1]);

        view.direction = SortDirection::Desc;
        assert_eq!(ids(&view, &quotes), vec![2, 3, 4, 1]);
    }

    #[test]
    fn status_filter_uses_resolved_status() {
        let quotes = vec![
            quote(1, "active", None),
            quote(2, "priced", None),
            quote(3, "waiting_verification", None),
        ];
        let mut view = QuoteTableView::default();
        view.filter.toggle_status(QuoteStatus::Unpriced);
        assert_eq!(ids(&view, &quotes), vec![1]);

        view.filter.toggle_status(QuoteStatus::WaitingVerification);
        assert_eq!(ids(&view, &quotes), vec![3, 1]);

        view.filter.toggle_status(QuoteStatus::Unpriced);
        view.filter.toggle_status(QuoteStatus::WaitingVerification);
        assert!(!view.filter.is_active());
        assert_eq!(ids(&view, &quotes).len(), 3);
    }

    #[test]
    fn search_matches_rego_case_insensitively() {
        let quotes = vec![quote(1, "unpriced", None), quote(2, "unpriced", None)];
        let mut view = QuoteTableView::default();
        view.filter.search = "abc2".to_owned();
        assert_eq!(ids(&view, &quotes), vec![2]);
    }

    #[test]
    fn sort_by_same_key_flips_direction() {
        let quotes = vec![
            quote(1, "delivered", None),
            quote(2, "unpriced", None),
            quote(3, "wrong", None),
        ];
        let mut view = QuoteTableView::default();
        view.sort_by(QuoteSortKey::Status);
        assert_eq!(ids(&view, &quotes), vec![2, 1, 3]);

        view.sort_by(QuoteSortKey::Status);
        assert_eq!(view.direction, SortDirection::Desc);
        assert_eq!(ids(&view, &quotes), vec![3, 1, 2]);
    }

    #[test]
    fn pagination_clamps_requested_page() {
        let quotes = (1..=7)
            .map(|id| quote(id, "unpriced", Some(id * 60)))
            .collect::<Vec<_>>();
        let view = QuoteTableView {
            page: 9,
            page_size: 3,
            ..QuoteTableView::default()
        };

        let page = view.project(&quotes, NOW);
        assert_eq!(page.total_rows, 7);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].id, QuoteId::new(7));
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let quotes = vec![quote(1, "unpriced", None), quote(2, "unpriced", None)];
        let view = QuoteTableView {
            page_size: 0,
            ..QuoteTableView::default()
        };
        let page = view.project(&quotes, NOW);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.total_pages, 2);
        assert_eq!(QuoteTableView::with_page_size(0).page_size, 1);
    }

    #[test]
    fn empty_table_still_has_one_page() {
        let page = QuoteTableView::default().project(&[], NOW);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 0);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn sort_key_names_round_trip() {
        for key in QuoteSortKey::ALL {
            assert_eq!(QuoteSortKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(QuoteSortKey::Reference.next(), QuoteSortKey::RequiredBy);
    }
}
