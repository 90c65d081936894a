//! Client for the external egress service that captures participant tracks
//! and streams them to our ingress endpoint.
//!
//! The recording core depends on the media provider only through the
//! [`EgressClient`] trait: submit a job, stop a job, list job statuses.

pub mod client;
pub mod http;

pub use client::{EgressClient, EgressJobState, EgressJobStatus};
pub use http::HttpEgressClient;
