#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(noop_method_call)]
#![warn(unreachable_pub)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod cipher;
mod err;
pub mod group;
pub mod keystream;

pub use err::Error;
pub use group::{verdict_1024, Element, Keypair, Scalar, SchnorrGroup, Signature};
pub use keystream::{derive_trap_noise, XorNet, CELL_LENGTH};
