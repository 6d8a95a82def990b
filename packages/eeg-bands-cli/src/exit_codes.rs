pub const SUCCESS: i32 = 0;
/// Bad arguments, configuration, or input files
pub const INPUT_ERROR: i32 = 1;
/// Nothing could be processed
pub const EXECUTION_ERROR: i32 = 2;
/// Some participants failed, others succeeded
pub const PARTIAL_FAILURE: i32 = 3;
