pub mod content_disposition_utils;
pub mod host_policy_utils;
