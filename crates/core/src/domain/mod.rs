pub mod cycle;
pub mod error;
pub mod settings;
pub mod types;

mod serde_tests;
