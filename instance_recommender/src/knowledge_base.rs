//! Instance choices derived from the benchmark campaign.

/// Bumped whenever a row of `KNOWLEDGE_BASE` changes.
pub const KNOWLEDGE_BASE_VERSION: u32 = 1;

/// Names of the model inputs, in feature order.
pub const FEATURE_NAMES: [&str; 4] = ["CPU", "Mem", "Type", "Budget"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Example {
    /// Relative CPU demand, 1 to 10.
    pub cpu_intensity: f64,
    pub memory_gb: f64,
    pub workload_type: &'static str,
    /// `"Yes"` or `"No"`.
    pub budget_sensitive: &'static str,
    pub recommended_instance: &'static str,
}

const fn example(
    cpu_intensity: f64,
    memory_gb: f64,
    workload_type: &'static str,
    budget_sensitive: &'static str,
    recommended_instance: &'static str,
) -> Example {
    Example {
        cpu_intensity,
        memory_gb,
        workload_type,
        budget_sensitive,
        recommended_instance,
    }
}

pub const KNOWLEDGE_BASE: [Example; 10] = [
    example(9.0, 2.0, "Compute", "No", "c5.large"),
    example(8.0, 4.0, "Web", "No", "c5.large"),
    example(10.0, 2.0, "Compute", "Yes", "c5.large"),
    example(5.0, 8.0, "DB", "No", "m5.large"),
    example(4.0, 7.0, "DB", "Yes", "m5.large"),
    example(6.0, 8.0, "Web", "No", "m5.large"),
    example(2.0, 2.0, "Dev", "Yes", "t3.medium"),
    example(3.0, 4.0, "Dev", "No", "t3.medium"),
    example(4.0, 2.0, "Web", "Yes", "t3.medium"),
    example(1.0, 1.0, "Dev", "Yes", "t3.medium"),
];
