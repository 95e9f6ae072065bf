//! Database models for the page analyzer backend.
//!
//! ## Site Names
//! A site is identified by its normalized address (`scheme://host[:port]`),
//! which is unique in the `urls` table.

pub mod check;
pub mod db;
pub mod url;
