// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod deadline;
pub mod draft;
pub mod forms;
pub mod ids;
pub mod model;
pub mod pricing;
pub mod reconcile;
pub mod session;
pub mod state;
pub mod status;
pub mod table;

pub use deadline::{DeadlineInfo, DeadlineTier, deadline_info};
pub use draft::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use reconcile::{PartsBatch, VariantOperation, apply_operations, part_number_updates};
pub use session::*;
pub use state::*;
pub use status::{StatusAction, resolve_status};
pub use table::*;
