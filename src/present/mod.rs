//! Result presentation: formatting, sortable table views, CSV export

pub mod csv_export;
pub mod format;
pub mod table;

pub use csv_export::{export_csv, export_filename, flatten_row};
pub use format::{format_cell, format_column_name, format_currency};
pub use table::{SortDirection, TableView};
