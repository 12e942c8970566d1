#![deny(rust_2018_idioms)]
#![deny(clippy::all)]
#![allow(clippy::module_inception)]

pub mod cmark;
pub mod config;
pub mod corpus;
pub mod lint;
pub mod model;
pub mod report;

pub mod error {
    pub use anyhow::{Error, Result};
}
