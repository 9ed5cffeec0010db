//! This library is an internal component of `checkertrace`,
//! which defines the core mathematical types: small vectors, row-major 4×4 matrices,
//! quaternions, and the projection constructors the camera is built from.
//!
//! Do not depend on this library directly; use `checkertrace-render` instead, which
//! re-exports what it needs.

#![no_std]
// Crate-specific lint settings. (General settings can be found in the workspace manifest.)
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    warn(clippy::std_instead_of_core, clippy::std_instead_of_alloc)
)]

#[cfg(any(feature = "std", test))]
#[cfg_attr(test, macro_use)]
extern crate std;

// -------------------------------------------------------------------------------------------------

pub mod math;

pub mod util;
