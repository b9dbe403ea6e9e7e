pub const NOT_IN_GUILD: &str = "NOT_IN_GUILD";
pub const LOCK_CONTENTION: &str = "LOCK_CONTENTION";
pub const UNCONFIGURED_SERVER: &str = "UNCONFIGURED_SERVER";
pub const WRONG_INVOCATION_CHANNEL: &str = "WRONG_INVOCATION_CHANNEL";
pub const INVALID_MONTH: &str = "INVALID_MONTH";
pub const INVALID_YEAR: &str = "INVALID_YEAR";
pub const MISSING_CHANNEL_BINDING: &str = "MISSING_CHANNEL_BINDING";
pub const NO_QUALIFYING_MESSAGES: &str = "NO_QUALIFYING_MESSAGES";
pub const VOLUME_CAP_REACHED: &str = "VOLUME_CAP_REACHED";
pub const RUN_TIMED_OUT: &str = "RUN_TIMED_OUT";
pub const ATTACHMENT_TRANSFER_FAILURE: &str = "ATTACHMENT_TRANSFER_FAILURE";
