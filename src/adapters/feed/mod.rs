//! Transaction feed adapters.

mod channel_feed;

pub use channel_feed::ChannelTransactionFeed;
