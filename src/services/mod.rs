pub mod api_client;
pub mod credentials;
pub mod job;
pub mod logger;
pub mod options;
pub mod parameters;
pub mod request_builder;
pub mod tool_executor;
pub mod transport;
pub mod validation;
