//! tft-reference library: builds versioned Teamfight Tactics reference data
//! (sets, traits, champions, items, augments) from CommunityDragon JSON.

pub mod assemble;
pub mod config;
pub mod data;
pub mod error;
pub mod extract;
pub mod model;
pub mod overrides;
pub mod records;
pub mod sink;
pub mod split;
pub mod trait_index;

pub use error::{Error, Result, ValidationError};
