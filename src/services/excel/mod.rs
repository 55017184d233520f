pub mod analyzer;
pub mod processor;
pub mod types;
pub mod utils;

pub use analyzer::{analyze_column, analyze_sheet, calculate_statistics, detect_data_type, detect_format_issues};
pub use processor::ExcelProcessor;
pub use types::*;
