pub mod constants;
pub mod timeout;
pub mod url_utils;

pub use constants::*;
pub use timeout::{run_until_timeout, with_timeout};
pub use url_utils::{extract_url, file_name, host_ends_with_any, host_matches_any};
