pub mod filters;
pub mod rate_limit;
