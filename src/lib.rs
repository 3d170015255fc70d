// adforge - campaign asset generation with critique-driven regeneration
// Library exports

pub mod campaign;
pub mod config;
pub mod controller;
pub mod critic;
pub mod errors;
pub mod generation;
pub mod logging;
pub mod orchestrator;
pub mod providers;
pub mod report;
