//! Worker HTTP adapter
//!
//! Implements [`WorkerGateway`](council_application::WorkerGateway) for
//! worker services speaking JSON over HTTP.

pub mod gateway;
pub mod protocol;

pub use gateway::HttpWorkerGateway;
