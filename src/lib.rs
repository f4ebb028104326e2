pub mod audit;
pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod motivation;
pub mod names;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod rotation;
pub mod status;
pub mod value;
