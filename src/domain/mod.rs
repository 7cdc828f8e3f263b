pub mod match_summary;
pub mod run_result;

pub use match_summary::*;
pub use run_result::*;
