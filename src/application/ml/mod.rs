pub mod forecast;
pub mod predictor;
pub mod smartcore_predictor;
pub mod training_pipeline;
pub mod winrate_predictor;
