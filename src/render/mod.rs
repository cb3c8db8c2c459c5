//! View rendering
//!
//! Display configuration (component, per-column label and format) and the
//! table model produced for a view. Only the `table` component exists.

mod errors;
mod format;
mod renderer;
mod table;

pub use errors::{RenderError, RenderResult};
pub use format::{DisplayComponent, DisplayFormat};
pub use renderer::ViewRenderer;
pub use table::{Cell, Column, TableModel};
