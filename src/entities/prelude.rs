pub use super::market_flow::Entity as MarketFlow;
pub use super::real_time_feed::Entity as RealTimeFeed;
pub use super::staking_data::Entity as StakingData;
pub use super::whale_events::Entity as WhaleEvents;
