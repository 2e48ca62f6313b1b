//! Special functions backing the distribution tails.

pub mod beta;
pub mod gamma;
pub mod stable;
