pub mod catalog;
pub mod choices;
pub mod config;
pub mod currency;
pub mod environment;
pub mod errors;
pub mod gift;
pub mod handoff;
pub mod intake;
pub mod label;
pub mod normalization;
pub mod profile;
pub mod recommender;
pub mod results;
pub mod routes;
pub mod sessions;
