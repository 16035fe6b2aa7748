pub mod events;
pub mod metrics;

pub use self::metrics::try_init_prometheus;
