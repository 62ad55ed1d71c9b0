// Command handlers module
pub mod config;
pub mod scan;
pub mod topology;

// Re-exports for cleaner imports
pub use config::execute as config;
pub use scan::execute as scan;
pub use topology::execute as topology;
