use rand::SeedableRng;
use rand::rngs::StdRng;
use crate::engine::PuzzleKind;
use crate::evasion::{CONTROL_SIZE, EvasionPolicy};
use crate::geom::Size;

/// Response button area; the stylesheet pins its height at 160px.
pub const DEFAULT_CONTAINER: Size = Size::new(300.0, 160.0);

/// Choice of puzzle and evasion policy plus the measured card geometry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub puzzle: PuzzleKind,
    pub policy: EvasionPolicy,
    pub container: Size,
    pub control: Size,
    pub heading_bottom: f64,
    pub bottom_padding: f64,
    /// Fixed seed for reproducible runs; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            puzzle: PuzzleKind::default(),
            policy: EvasionPolicy::default(),
            container: DEFAULT_CONTAINER,
            control: CONTROL_SIZE,
            heading_bottom: 0.0,
            bottom_padding: 0.0,
            seed: None,
        }
    }
}

impl Config {
    /// Builds a config from positional words: a puzzle kind, an evasion
    /// policy and a numeric seed, each optional and in any order.
    pub fn from_args<I, S>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Config::default();
        for arg in args {
            let arg = arg.as_ref();
            if let Ok(kind) = arg.parse::<PuzzleKind>() {
                config.puzzle = kind;
            } else if let Ok(policy) = arg.parse::<EvasionPolicy>() {
                config.policy = policy;
            } else if let Ok(seed) = arg.parse::<u64>() {
                config.seed = Some(seed);
            } else {
                anyhow::bail!(
                    "unrecognized argument {arg:?}; expected swap|select, slots|fractional|radial|pointer, or a seed"
                );
            }
        }
        Ok(config)
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
