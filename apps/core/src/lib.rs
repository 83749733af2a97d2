pub mod assets;
pub mod catalog;
pub mod config;
pub mod contract;
pub mod controller;
pub mod host;
pub mod logging;
pub mod model;
pub mod overlay_state;
pub mod runtime;
pub mod search;
pub mod timer;
pub mod transport;
pub mod view;
pub mod visibility;
