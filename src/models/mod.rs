pub mod advisory;
pub mod forecast;
