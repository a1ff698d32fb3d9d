// ABOUTME: DNS lookup surface for timespotter.
// ABOUTME: Decodes a digest from the first two query labels and answers 127.0.0.1 if it has been seen.

pub mod query;
pub mod server;

pub use query::{ANSWER_ADDR, ANSWER_TTL, QueryError, answer, decode_query_name};
pub use server::{DnsError, bind, serve};
