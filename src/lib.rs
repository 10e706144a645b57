// Kagami image transformation proxy library

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod fetcher;
pub mod image_optimizer;
pub mod logging;
pub mod metrics;
pub mod options;
pub mod pipeline;
pub mod proxy;
pub mod watermark;
