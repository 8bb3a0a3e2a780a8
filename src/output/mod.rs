//! Output module.
//!
//! Console rendering of results as they arrive and the CSV report written at
//! the end of a run.

mod csv_format;
mod plain;

pub use csv_format::{
    flatten, report_file_name, write_rows, ReportRow, ReportWriter, REPORT_HEADERS,
};
pub use plain::{
    format_host, print_error, print_host, print_info, print_success, print_summary,
    print_warning,
};
