pub mod banner;
pub mod config;
pub mod decorators;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod lexer;
pub mod mapping;
pub mod reconcile;
pub mod rules;
pub mod session;
pub mod transpile;

pub use decorators::normalize_decorators;
pub use engine::{full_backward, full_forward, preprocess, Outcome};
pub use error::{MappingError, Warning};
pub use mapping::Mapping;
pub use reconcile::{reconcile, reconcile_with, ReconcileOptions};
pub use rules::Direction;
pub use transpile::transpile;
