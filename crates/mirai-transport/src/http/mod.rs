//! HTTP transport.

mod client;

pub use client::{FilePart, HttpClient, MultipartBody};
