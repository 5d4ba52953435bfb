//! Client for the upstream trends service.

mod client;
pub mod models;
mod oauth;

pub use client::TwitterClient;
pub use oauth::{OAuth1Signer, TwitterCredentials};
