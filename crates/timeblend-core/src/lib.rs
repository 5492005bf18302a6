//! TimeBlend Core — data model, collaborator traits, seed tree.

pub mod capabilities;
pub mod error;
pub mod pipeline;
pub mod seed;
pub mod types;

pub use capabilities::{BudgetTimer, Trainable, TrainableFactory};
pub use error::{Error, Result};
pub use pipeline::{BlendStrategy, Pipeline};
pub use seed::{SeedNode, SeedTree, RANDOM_STATE_KEY};
pub use types::{Prediction, ResourceLimits, Task};
