/// Application constants

// Aptos
pub const DEFAULT_APTOS_NODE_URL: &str = "https://fullnode.testnet.aptoslabs.com/v1";
pub const DEFAULT_MODULE_NAME: &str = "bill_payment";
pub const OCTAS_PER_APT: u64 = 100_000_000;

// 0.001 APT per bill, charged on top of the pending total before a group payment
pub const GAS_ESTIMATE_PER_BILL_APT: f64 = 0.001;

// Bill normalization defaults
pub const DEFAULT_BILL_DESCRIPTION: &str = "No description";
pub const DEFAULT_BILL_CATEGORY: &str = "Payment";

// Bill statuses as stored on-chain
pub const STATUS_CODE_PENDING: u8 = 0;
pub const STATUS_CODE_PAID: u8 = 1;
pub const STATUS_CODE_AUTOPAY: u8 = 2;

// Added bills without a due date fall due 30 days out
pub const DEFAULT_DUE_IN_DAYS: i64 = 30;

// API version
pub const API_VERSION: &str = "v1";

// Background service intervals
pub const BILL_POLL_INTERVAL_SECS: u64 = 10;
pub const POST_SUBMIT_REFRESH_DELAY_SECS: u64 = 3;
pub const AUTOPAY_SCHEDULER_INTERVAL_SECS: u64 = 86_400;

// Outbound HTTP (Aptos node, AutoPay store)
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 4;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

// A poller that has not exited this long after stop() is aborted
pub const POLLER_STOP_GRACE_SECS: u64 = 5;

// Payee balance diagnostics around a group payment cover the first few bills only
pub const PAYEE_CHECK_LIMIT: usize = 3;

// Notifications
pub const NOTIFICATION_CAPACITY: usize = 100;

// Local cache
pub const DEFAULT_LOCAL_CACHE_PATH: &str = ".pulse/cache.json";
