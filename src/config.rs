//! Knobs shared by all stages of the pipeline.

const DEFAULT_SINK_STATE: &str = "qd";
const DEFAULT_MINIMIZED_PREFIX: &str = "Q";

/// Configuration carried by an [`Automaton`](crate::automaton::Automaton).
///
/// Setters consume and return the config so they can be chained; unset
/// options fall back to their defaults in the `get_*` accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    sink_state: Option<String>,
    minimized_prefix: Option<String>,
    parallel_refinement: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the synthetic sink state introduced by completion and by
    /// transitions routed to a dead state.
    pub fn sink_state(mut self, name: impl Into<String>) -> Self {
        self.sink_state = Some(name.into());
        self
    }

    /// Prefix of the state names assigned by minimization.
    pub fn minimized_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.minimized_prefix = Some(prefix.into());
        self
    }

    /// Whether pre-image sets of one refinement step are computed with rayon.
    pub fn parallel_refinement(mut self, yes: bool) -> Self {
        self.parallel_refinement = Some(yes);
        self
    }

    pub fn get_sink_state(&self) -> &str {
        self.sink_state.as_deref().unwrap_or(DEFAULT_SINK_STATE)
    }

    pub fn get_minimized_prefix(&self) -> &str {
        self.minimized_prefix
            .as_deref()
            .unwrap_or(DEFAULT_MINIMIZED_PREFIX)
    }

    pub fn get_parallel_refinement(&self) -> bool {
        self.parallel_refinement.unwrap_or(true)
    }

    /// Overlays the options set in `other` on top of `self`.
    pub fn overwrite(&self, other: Config) -> Config {
        Config {
            sink_state: other.sink_state.or_else(|| self.sink_state.clone()),
            minimized_prefix: other
                .minimized_prefix
                .or_else(|| self.minimized_prefix.clone()),
            parallel_refinement: other.parallel_refinement.or(self.parallel_refinement),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::new();
        assert_eq!(config.get_sink_state(), "qd");
        assert_eq!(config.get_minimized_prefix(), "Q");
        assert!(config.get_parallel_refinement());
    }

    #[test]
    fn overwrite_keeps_unset_options() {
        let base = Config::new().sink_state("dead").parallel_refinement(false);
        let merged = base.overwrite(Config::new().minimized_prefix("M"));
        assert_eq!(merged.get_sink_state(), "dead");
        assert_eq!(merged.get_minimized_prefix(), "M");
        assert!(!merged.get_parallel_refinement());
    }
}
