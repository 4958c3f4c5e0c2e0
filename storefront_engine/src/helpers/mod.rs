mod retry;

pub use retry::{with_timeout, RetryPolicy};
