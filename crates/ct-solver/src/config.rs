//! Solver configuration.

/// Bisection search settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Stop when the bracket is narrower than this fraction of its upper end
    pub relative_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-6,
            max_iterations: 60,
        }
    }
}

/// Root-finding settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RootFindingConfig {
    /// Relative change between successive iterates that counts as converged
    pub relative_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for RootFindingConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-5,
            max_iterations: 50,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainSolverConfig {
    pub search: SearchConfig,
    pub root_finding: RootFindingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TrainSolverConfig::default();
        assert_eq!(config.search.relative_tolerance, 1e-6);
        assert_eq!(config.search.max_iterations, 60);
        assert_eq!(config.root_finding.relative_tolerance, 1e-5);
        assert_eq!(config.root_finding.max_iterations, 50);
    }
}
