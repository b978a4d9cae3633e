//! # Reporting Module / 报告模块
//!
//! The results file written into the projects root and the colored summary
//! printed at the end of a batch.
//!
//! 写入项目根目录的结果文件，以及批量运行结束时打印的彩色摘要。

pub mod console;
pub mod text;

// Re-export common reporting functions
pub use console::print_summary;
pub use text::{render_report, write_report};
