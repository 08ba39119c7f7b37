#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::checked_conversions,
    clippy::implicit_saturating_sub,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

extern crate alloc;

pub mod cipher;
pub mod kdf;
pub mod pke;

#[cfg(feature = "replay-rng")]
pub mod rng;

mod arithmetic;
mod error;

pub use crate::{
    arithmetic::{AffinePoint, Curve},
    error::{Error, Result},
};

pub use crypto_bigint::{self, BoxedUint};
pub use der;
pub use digest;
pub use rand_core;
