pub mod config;
pub mod fact;
pub mod grouping;
pub mod metrics;
pub mod track;
pub mod window;
