use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{Quota, RateLimiter};

/// The shared outbound send limiter. One instance is shared by every
/// concurrent recap run so the process as a whole stays under the chat
/// platform's throughput limit.
pub type SendLimiter = governor::DefaultDirectRateLimiter;

/// Default outbound sends per second across all delivery targets.
pub const DEFAULT_SENDS_PER_SECOND: u32 = 5;

#[must_use]
pub fn new_send_limiter(per_second: u32) -> Arc<SendLimiter> {
    let per_second = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(per_second)))
}
