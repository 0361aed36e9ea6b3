pub mod filter;
pub mod statistics;
