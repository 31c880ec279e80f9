pub mod network {
    pub const TENANT_DOMAIN: &str = "legacy-use.com";
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const API_KEY_HEADER: &str = "X-API-Key";
    pub const DISTINCT_ID_HEADER: &str = "X-Distinct-Id";
    pub const DEFAULT_DISTINCT_ID: &str = "rust-client";
    pub const USER_AGENT: &str = "legacy-use-client/0.3.0";
}

pub mod polling {
    pub const DEFAULT_DELAY_MS: u64 = 2_000;
    pub const DEFAULT_LIMIT: u64 = 300;
    pub const IN_FLIGHT_STATUSES: &[&str] = &["pending", "queued", "running"];
    pub const SUCCESS_STATUS: &str = "success";
    pub const FAILED_STATUS: &str = "failed";
    pub const START_STATUS: &str = "pending";
    pub const LIMIT_REACHED_MESSAGE: &str = "Polling limit reached";
    pub const TIMEOUT_REACHED_MESSAGE: &str = "Polling timeout reached";
}

pub mod limits {
    pub const SIMPLIFY_MAX_ENTRIES: usize = 10;
    pub const LOG_BODY_PREVIEW_BYTES: usize = 512;
}

pub mod protocols {
    pub const WRITE_METHODS: &[&str] = &["POST", "PUT", "PATCH", "DELETE"];
    pub const SUPPORTED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];
}
