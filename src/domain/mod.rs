// Encoding, vocabulary and splitting
pub mod ml;

// Evaluation metrics and descriptive statistics
pub mod performance;

// Match records and categorical fields
pub mod types;

// Domain-specific error types
pub mod errors;
