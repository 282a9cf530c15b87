pub mod data_core;
pub mod settings;
pub mod toast;
pub mod translation;
pub mod upload;
