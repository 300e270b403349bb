pub mod csv_source;
pub mod forecast_writer;
pub mod model_store;

pub use csv_source::{IngestError, load_matches, read_matches};
pub use model_store::ModelStore;
