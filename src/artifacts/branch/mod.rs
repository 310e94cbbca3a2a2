//! Project and branch identifiers

pub mod branch_name;

pub const INVALID_BRANCH_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// Project ids become a single directory level under `refs/`.
pub const INVALID_PROJECT_ID_REGEX: &str = r"[^A-Za-z0-9_.\-]|^\.|\.\.";

pub const DEFAULT_BRANCH: &str = "main";

pub const DEFAULT_PROJECT: &str = "default";
