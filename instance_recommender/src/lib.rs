/**
 * Instance type recommendation.
 *
 * A small decision tree trained on a fixed knowledge base distilled from the
 * benchmark results maps a workload description (CPU intensity, memory,
 * workload type, budget sensitivity) to an instance type.
 */
pub mod encoder;
pub mod knowledge_base;
pub mod model;
pub mod report;
pub mod tree;

pub use encoder::{LabelEncoder, UnseenLabel};
pub use knowledge_base::{Example, FEATURE_NAMES, KNOWLEDGE_BASE, KNOWLEDGE_BASE_VERSION};
pub use model::{ModelError, Recommendation, TrainedModel, predict, train};
pub use report::{ReportError, SCENARIOS, Scenario};
pub use tree::{DecisionTreeClassifier, TreeError};
