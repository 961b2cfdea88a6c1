// src/services/mod.rs
pub mod alpha_vantage;
pub mod calendar;
pub mod chart;
pub mod dashboard;
pub mod live_patch;
pub mod normalizer;
pub mod source;
pub mod twelve_data;
pub mod validator;
pub mod yahoo;
