pub mod feature_encoder;
pub mod feature_registry;
pub mod split;
