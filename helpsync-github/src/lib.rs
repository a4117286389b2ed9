//! # helpsync-github
//!
//! Repository-hosting client: the [`Hosting`] trait consumed by the detector
//! and the reconciliation engine, and [`GithubClient`], its blocking
//! implementation over the GitHub REST v3 API.

pub mod client;
pub mod error;

pub use client::{GithubClient, Hosting, PullRequestQuery};
pub use error::GithubError;
