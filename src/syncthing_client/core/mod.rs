pub mod aggregator;
pub mod cursor;
pub mod decoder;
pub mod http;
pub mod rate;
pub mod runtime;
pub mod scheduler;
pub mod status;
pub mod store;
