//! Office management for a small legal practice.
//!
//! Everything hangs off a handful of record collections (clients, cases,
//! invoices, expenses, future debts) persisted through [`store::RecordStore`].
//! Role resolution in [`identity`] decides what a session may see, the
//! [`practice`] services enforce it, and [`console`] is the interactive
//! surface that ties them together. Record mutations land in the office
//! audit trail ([`audit`]), and [`advisory`] wraps the optional AI desk.

pub mod advisory;
pub mod audit;
pub mod config;
pub mod console;
pub mod error;
pub mod identity;
pub mod library;
pub mod messages;
pub mod practice;
pub mod settings;
pub mod store;
