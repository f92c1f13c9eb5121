//! Exit codes are part of the public contract.

pub const SUCCESS: i32 = 0;
/// Unexpected fatal error mid-run. Remote failures are not fatal; they
/// become stored ERROR records and still exit SUCCESS.
pub const FAILURE: i32 = 1;
/// Invalid usage or missing required configuration, before any remote call.
pub const CONFIG_ERROR: i32 = 2;
