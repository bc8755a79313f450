//! Typed API call wrappers, one function per server operation.
//!
//! Each wrapper only builds a [`RequestDescriptor`](crate::pipeline::RequestDescriptor)
//! and hands it to the pipeline; headers, envelopes and failures are handled
//! there.

pub mod class;
pub mod teacher;
pub mod user;
