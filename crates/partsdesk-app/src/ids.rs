// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(QuoteId);
entity_id!(PartId);
entity_id!(ActionId);

const TRANSIENT_PREFIX: &str = "draft-";
const LEGACY_PREFIX: &str = "legacy-";

/// Identifier of a priced variant inside a quote's parts list.
///
/// Variants created during an edit session get a transient id
/// (`draft-<uuid v7>`, time-ordered) until the batch that materializes them is
/// applied; the store keeps whatever id it receives.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(String);

impl VariantId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn transient() -> Self {
        Self(format!("{TRANSIENT_PREFIX}{}", Uuid::now_v7()))
    }

    /// Deterministic id for the default variant synthesized from a legacy
    /// comma-joined `part_requested` row.
    pub fn legacy_default(part_id: PartId) -> Self {
        Self(format!("{LEGACY_PREFIX}{}", part_id.get()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_transient(&self) -> bool {
        self.0.starts_with(TRANSIENT_PREFIX)
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariantId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
