pub mod chain;
pub mod envelope;
pub mod feed;
pub mod refresh;
pub mod stake;
pub mod swap;
pub mod transfer;
