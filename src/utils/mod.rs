pub mod json_util;
pub mod string_util;

pub use json_util::{RepairError, extract_json, extract_list, repair_json};
pub use string_util::{StripCodeBlock, truncate_for_log};
