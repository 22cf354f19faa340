//! Core domain concepts shared across all subdomains.
//!
//! - [`question::Question`]: a validated user query posed to the council
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: UTF-8 safe truncation

pub mod error;
pub mod question;
pub mod string;
