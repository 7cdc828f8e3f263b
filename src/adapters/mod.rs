pub mod kicktipp;

pub use kicktipp::{match_detail_path, prediction_list_path, SessionToken, SiteSession};
