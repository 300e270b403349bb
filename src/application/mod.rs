// Model training, inference and forecasting
pub mod ml;
