/// Bounds on engine work.
///
/// Rewriting always terminates because the pass loop is capped; the
/// resolution search is capped by a step budget. Hitting a cap truncates
/// the result rather than raising an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceLimits {
    /// Maximum accepted input size in bytes.
    pub max_input_bytes: usize,
    /// Maximum normalization passes before the fixpoint loop gives up
    /// and returns the latest form.
    pub max_rewrite_passes: usize,
    /// Maximum goal-stack pops per resolution search.
    pub max_search_steps: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits {
            max_input_bytes: 64 * 1024,
            max_rewrite_passes: 64,
            max_search_steps: 10_000,
        }
    }
}
