#![forbid(unsafe_code)]

//! coldsign: an appliance console for signing offline Bitcoin transactions.
//!
//! A 16x3 character display and a six-key keypad drive a small set of flows:
//! 1. **Sign TX**: mount a trusted USB stick, pick a transaction, review its
//!    outputs page by page, confirm, sign, and unmount
//! 2. **Trust USB**: add a plugged-in stick to the trusted set
//! 3. **Eject USB**: unmount every mounted stick
//!
//! The slow signer runs on one background worker while the foreground shows
//! a progress bar driven by learned timing estimates.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use coldsign::prelude::*;
//! ```

pub mod prelude;

pub mod app;
#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod display;
pub mod input;
pub mod logger;
pub mod platform;
pub mod runtime;
pub mod timing;
pub mod views;
pub mod worker;
pub mod workflow;
