pub mod background;
pub mod cycle_tracker;
pub mod page_controller;
pub mod rewrite_cycle;
