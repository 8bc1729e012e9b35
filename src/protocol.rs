mod dn;
mod filter;

pub use dn::extract_common_name;
pub use filter::escape_filter_value;
pub(crate) use filter::{account_name_filter, GROUP_MEMBERSHIP_ATTR};
