//! Process-wide caps and the pool's soft minimum, grouped per-manager rather
//! than as hidden global state.

/// Configuration for one [`crate::manager::TweenManager`]. Every tween built
/// through that manager is checked against the same `combined_attrs_limit`
/// and `waypoints_limit`; `pool_capacity` is the size the manager's pool is
/// grown to eagerly rather than lazily, one child node at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Maximum number of scalar components a single tween may declare.
    pub combined_attrs_limit: usize,
    /// Maximum number of waypoints a single tween may declare.
    pub waypoints_limit: usize,
    /// Free-list size to grow the pool to up front.
    pub pool_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            combined_attrs_limit: 3,
            waypoints_limit: 0,
            pool_capacity: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_caps() {
        let config = EngineConfig::default();
        assert_eq!(config.combined_attrs_limit, 3);
        assert_eq!(config.waypoints_limit, 0);
        assert_eq!(config.pool_capacity, 0);
    }
}
