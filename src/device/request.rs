//! Request target construction
//!
//! Every camera call goes to [`API_PATH`] with the command name and login
//! carried in the query string.

use super::command::CommandName;
use super::endpoint::{API_PATH, DeviceEndpoint};

/// Optional query parameters for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryOptions {
    pub include_channel: bool,
    pub include_random_seed: bool,
}

impl QueryOptions {
    pub const NONE: Self = Self {
        include_channel: false,
        include_random_seed: false,
    };

    pub const CHANNEL: Self = Self {
        include_channel: true,
        include_random_seed: false,
    };

    /// Channel plus a cache-busting seed, used for image snapshots
    pub const SNAPSHOT: Self = Self {
        include_channel: true,
        include_random_seed: true,
    };
}

/// Build the path and query for `cmd`
///
/// The result is relative to the endpoint's base URL, e.g.
/// `/api.cgi?cmd=GetMdState&channel=0&user=admin&password=secret`.
#[must_use]
pub fn build_target(endpoint: &DeviceEndpoint, cmd: CommandName, options: QueryOptions) -> String {
    let mut target = format!("{API_PATH}?cmd={cmd}");

    if options.include_channel {
        target.push_str(&format!("&channel={}", endpoint.channel));
    }
    if options.include_random_seed {
        target.push_str(&format!("&rs={}", random_seed()));
    }

    target.push_str(&format!(
        "&user={}&password={}",
        endpoint.credentials.user,
        endpoint.credentials.password_param()
    ));

    target
}

/// Fresh cache-busting value, never reused between calls
#[must_use]
pub fn random_seed() -> String {
    format!("{:x}", rand::random::<u64>())
}
