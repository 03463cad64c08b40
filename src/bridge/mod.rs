//! The HTTP transaction bridge.
//!
//! A hosting runtime hands this crate a mutable, streaming, callback-style
//! request/response pair; application handlers want immutable values. The
//! bridge converts in both directions:
//!
//! - [`adapt`] consumes an [`IncomingTransaction`] — the host's native
//!   streaming request — and produces an immutable [`Request`](crate::http::Request)
//!   with an absolute URL, a repetition-preserving header multimap, and a
//!   fully buffered body for methods that carry one.
//! - [`send`] takes an immutable [`Response`](crate::http::Response) and
//!   streams it into a [`ResponseSink`]: head first, then body chunks in
//!   arrival order, then exactly one finalization.
//!
//! Both directions surface I/O failures to the caller; nothing is retried
//! and nothing is logged-and-swallowed here.

pub mod adapter;
pub mod sink;

pub use adapter::{AdaptError, IncomingTransaction, adapt};
pub use sink::{ResponseSink, SendError, send};
