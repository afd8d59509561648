//! Real-time fan-out of counter ticks to feed subscribers.

mod broadcaster;

pub use broadcaster::{Broadcaster, PublishReport, SubscriberId};
