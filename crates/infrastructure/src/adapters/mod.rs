//! Adapters for the application ports.

mod log_sink;
mod reqwest_client;

pub use log_sink::{BufferedLogSink, TracingLogSink};
pub use reqwest_client::ReqwestHttpClient;
