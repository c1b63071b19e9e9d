#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(noop_method_call)]
#![warn(unreachable_pub)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod client;
mod err;
pub mod interval;
pub mod relay;
pub mod trustee;
pub mod verdict;

pub use client::Client;
pub use err::Error;
pub use interval::advance_interval;
pub use relay::Relay;
pub use trustee::Trustee;
pub use verdict::{Accumulator, Certifier, VerdictKey};
