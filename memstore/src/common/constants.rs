// document constants
pub const FIELD_SEPARATOR: &str = ".";
pub const DEFAULT_ID_NAME: &str = "id";

// predicate keys
pub const AND_KEY: &str = "and";
pub const OR_KEY: &str = "or";
pub const NEAR_KEY: &str = "near";

// store constants
pub const INITIAL_SEQUENCE: i64 = 1;
pub const TEMP_FILE_SUFFIX: &str = "tmp";
