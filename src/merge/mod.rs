pub mod client;
pub mod decoder;
pub mod report;
pub mod request;

pub use client::{MergeBody, MergeClient, MergeStream};
pub use decoder::{EventDecoder, MergeEvent, MergeProgress};
pub use request::MergeRequest;
