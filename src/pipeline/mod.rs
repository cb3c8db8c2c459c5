//! View transformation pipeline
//!
//! Turns stored records into rows for a view. Stages run in a fixed order
//! and never touch the stored records:
//!
//! unwind → flatten → select → omit → order → offset/limit
//!
//! Missing fields never fail a record; they project as absent cells.

mod errors;
mod plan;
mod row;
mod stages;

pub use errors::{TransformResult, TransformationError};
pub use plan::{transform, Page, TransformPlan, ViewQuery};
pub use row::Row;
pub use stages::{flatten, unwind};
