pub mod alive;
pub mod allowed;
pub mod health;
pub mod ingest;
pub mod metrics;
