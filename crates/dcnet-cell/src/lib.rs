#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(noop_method_call)]
#![warn(unreachable_pub)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod cell;
mod err;
pub mod inversion;
pub mod request;
pub mod request_tuning;

pub use cell::{Codec, NullCodec};
pub use err::Error;
pub use inversion::InversionCodec;
pub use request::{RequestChecker, RequestDecoder, RequestEncoder, RequestParams};
