pub mod codec;
pub mod dispatcher;
pub mod resilience;
pub mod transport;
