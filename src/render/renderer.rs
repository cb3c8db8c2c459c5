//! View renderer
//!
//! Attaches labels and formats to transformed rows. Rendering never changes
//! a value; the format is a hint for whoever draws the table.

use super::errors::{RenderError, RenderResult};
use super::format::{DisplayComponent, DisplayFormat};
use super::table::{Cell, Column, TableModel};
use crate::path::FieldPath;
use crate::pipeline::Row;
use crate::schema::ViewDisplay;

/// Renders rows into a [`TableModel`].
pub struct ViewRenderer;

impl ViewRenderer {
    /// Checks a display section against the fields its view selects.
    ///
    /// Runs at configuration load; `render` assumes it passed.
    pub fn check(display: &ViewDisplay, fields: &[FieldPath]) -> RenderResult<()> {
        match display.component {
            DisplayComponent::Table => {}
        }
        if let Some(path) = display.properties.keys().find(|p| !fields.contains(p)) {
            return Err(RenderError::UnresolvedProperty(path.canonical()));
        }
        Ok(())
    }

    /// Renders `rows` with one column per entry of `fields`, in order.
    ///
    /// Cells come from the row by column path, so a row lacking a column
    /// renders an undefined cell.
    pub fn render(rows: &[Row], display: &ViewDisplay, fields: &[FieldPath]) -> TableModel {
        let columns: Vec<Column> = fields
            .iter()
            .map(|path| {
                let property = display.property(path);
                let label = property
                    .and_then(|p| p.label.clone())
                    .unwrap_or_else(|| path.canonical());
                match property.and_then(|p| p.format) {
                    Some(format) => Column {
                        path: path.clone(),
                        label,
                        format,
                        explicit: true,
                    },
                    None => Column {
                        path: path.clone(),
                        label,
                        format: rows
                            .iter()
                            .find_map(|row| row.get(path).as_present())
                            .map_or(DisplayFormat::Text, DisplayFormat::infer),
                        explicit: false,
                    },
                }
            })
            .collect();

        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| {
                        let value = row.get(&column.path).clone();
                        let format = if column.explicit {
                            column.format
                        } else {
                            value.as_present().map_or(DisplayFormat::Text, DisplayFormat::infer)
                        };
                        Cell { value, format }
                    })
                    .collect()
            })
            .collect();

        TableModel { columns, rows }
    }
}
