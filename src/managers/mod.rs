pub mod api;
pub mod batch;
pub mod jobs;
pub mod options;
