pub mod analytics;
pub mod numbering;
pub mod pricing;
pub mod status;
