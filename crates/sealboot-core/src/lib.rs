pub mod codec;
pub mod config;
pub mod deleter;
pub mod error;
pub mod platform;
pub mod prefix;
pub mod provision;
pub mod reconstruct;
pub mod stub;
pub mod tags;
pub mod writer;

#[cfg(test)]
mod tests;
#[cfg(test)]
mod testutil;
