// UI and formatting module

pub mod formatters;
pub mod process_tree;

// Re-export commonly used items for cleaner imports
pub use formatters::{
    format_disk_row, format_process_row, format_realtime, format_size, format_topology,
    process_header,
};
pub use process_tree::{flatten_rows, FlattenedRow};
