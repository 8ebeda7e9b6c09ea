// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{QuotePart, QuoteStatus};

/// Display status for a quote.
///
/// A stored status always wins. Legacy rows (`"active"` or no status at all)
/// fall back to `Unpriced`; pricing completeness of legacy variants is not
/// inspected.
pub fn resolve_status(parts: &[QuotePart], stored: Option<&str>) -> QuoteStatus {
    match stored.and_then(QuoteStatus::parse) {
        Some(status) => status,
        None if parts.is_empty() => QuoteStatus::Unpriced,
        // TODO: derive from variant pricing once legacy "active" rows are migrated.
        None => QuoteStatus::Unpriced,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    SendForReview,
    Verify,
    MarkCompleted,
    MarkOrdered,
    MarkDelivered,
    MarkWrong,
}

impl StatusAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SendForReview => "send for review",
            Self::Verify => "verify",
            Self::MarkCompleted => "mark completed",
            Self::MarkOrdered => "mark ordered",
            Self::MarkDelivered => "mark delivered",
            Self::MarkWrong => "mark wrong",
        }
    }
}

impl QuoteStatus {
    /// Position in the forward workflow; `Wrong` sits outside it.
    pub const fn rank(self) -> Option<u8> {
        match self {
            Self::Unpriced => Some(0),
            Self::WaitingVerification => Some(1),
            Self::Priced => Some(2),
            Self::Completed => Some(3),
            Self::Ordered => Some(4),
            Self::Delivered => Some(5),
            Self::Wrong => None,
        }
    }

    /// Moves forward to `target` unless already at or past it.
    pub fn advance_toward(self, target: Self) -> Self {
        match (self.rank(), target.rank()) {
            (None, _) => self,
            (Some(_), None) => target,
            (Some(current), Some(next)) if next > current => target,
            _ => self,
        }
    }

    pub fn apply(self, action: StatusAction) -> Result<Self> {
        if self == Self::Wrong {
            bail!(
                "quote is marked wrong -- {} is not available for wrong quotes",
                action.label()
            );
        }

        let required = match action {
            StatusAction::SendForReview => {
                return Ok(self.advance_toward(Self::WaitingVerification));
            }
            StatusAction::MarkWrong => return Ok(Self::Wrong),
            StatusAction::Verify => Self::WaitingVerification,
            StatusAction::MarkCompleted => Self::Priced,
            StatusAction::MarkOrdered => Self::Completed,
            StatusAction::MarkDelivered => Self::Ordered,
        };
        if self != required {
            bail!(
                "cannot {} a quote that is {} -- the quote must be {} first",
                action.label(),
                self.label(),
                required.label()
            );
        }

        Ok(match action {
            StatusAction::Verify => Self::Priced,
            StatusAction::MarkCompleted => Self::Completed,
            StatusAction::MarkOrdered => Self::Ordered,
            _ => Self::Delivered,
        })
    }
}
