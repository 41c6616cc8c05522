//! Solver configuration.
//!
//! Two layers, both fixed before the stepper becomes ready:
//! - [`ClothConfig`] describes the patch: grid resolution, size, stiffness,
//!   mass, and local/global iterations per frame.
//! - [`SimulationConfig`] holds the run-wide constants: timestep, gravity,
//!   momentum preservation, and global solver settings.
//!
//! Both serialize with serde and load from TOML.

use serde::{Deserialize, Serialize};

use drape_math::cg::CgConfig;
use drape_types::constants::{
    DEFAULT_DT, DEFAULT_LOCAL_ITERATIONS, DEFAULT_PRESERVATION, DEFAULT_VERTEX_MASS, GRAVITY,
};
use drape_types::{DrapeError, DrapeResult, Scalar};

/// Which linear solver runs the global step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalSolverKind {
    /// Preconditioner-free conjugate gradient.
    #[default]
    ConjugateGradient,
    /// Sparse LLᵀ prefactored once with `faer`.
    Cholesky,
}

/// Parameters of the cloth patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothConfig {
    /// Vertices per side (N ≥ 2).
    pub resolution: usize,

    /// Physical side length (meters).
    pub size: Scalar,

    /// Edge stiffness `k`, shared by every constraint.
    pub stiffness: Scalar,

    /// Mass of each vertex (kg).
    pub vertex_mass: Scalar,

    /// Local/global iterations per frame.
    pub local_iterations: u32,
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            resolution: 20,
            size: 1.0,
            stiffness: 500.0,
            vertex_mass: DEFAULT_VERTEX_MASS,
            local_iterations: DEFAULT_LOCAL_ITERATIONS,
        }
    }
}

impl ClothConfig {
    /// Rejects values that would make the system matrix singular or the grid empty.
    pub fn validate(&self) -> DrapeResult<()> {
        if self.resolution < 2 {
            return Err(DrapeError::InvalidConfig(format!(
                "resolution must be at least 2, got {}",
                self.resolution
            )));
        }
        positive("size", self.size)?;
        positive("stiffness", self.stiffness)?;
        positive("vertex_mass", self.vertex_mass)?;
        if self.local_iterations == 0 {
            return Err(DrapeError::InvalidConfig(
                "local_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Run-wide simulation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Timestep (seconds).
    pub dt: Scalar,

    /// Signed acceleration along the vertical (Y) axis, m/s².
    pub gravity: Scalar,

    /// Momentum blend for inertial prediction, in `[0, 1]`.
    ///
    /// `y = (2 − p)·x − (1 − p)·x_prev`: `0` keeps full velocity,
    /// `1` discards it.
    pub preservation: Scalar,

    /// Global step backend.
    pub solver: GlobalSolverKind,

    /// Stopping criteria when `solver` is conjugate gradient.
    pub cg: CgConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            gravity: -GRAVITY,
            preservation: DEFAULT_PRESERVATION,
            solver: GlobalSolverKind::default(),
            cg: CgConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Loose CG tolerance with a hard cap, for quick interactive runs.
    pub fn debug() -> Self {
        Self {
            cg: CgConfig {
                tolerance: 1e-4,
                max_iterations: Some(50),
            },
            ..Default::default()
        }
    }

    /// Direct solves, so every global step is exact to round-off.
    pub fn high_quality() -> Self {
        Self {
            solver: GlobalSolverKind::Cholesky,
            cg: CgConfig {
                tolerance: 1e-10,
                max_iterations: None,
            },
            ..Default::default()
        }
    }

    pub fn dt_squared(&self) -> Scalar {
        self.dt * self.dt
    }

    pub fn validate(&self) -> DrapeResult<()> {
        positive("dt", self.dt)?;
        if self.dt > 1.0 {
            return Err(DrapeError::InvalidConfig(
                "Timestep dt > 1.0 is unreasonably large".into(),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(DrapeError::InvalidConfig("gravity must be finite".into()));
        }
        if !(0.0..=1.0).contains(&self.preservation) {
            return Err(DrapeError::InvalidConfig(format!(
                "preservation must lie in [0, 1], got {}",
                self.preservation
            )));
        }
        positive("cg.tolerance", self.cg.tolerance)?;
        Ok(())
    }
}

/// Both configuration layers, as one TOML document:
///
/// ```toml
/// [cloth]
/// resolution = 20
/// size = 1.0
/// stiffness = 500.0
/// vertex_mass = 1.0
/// local_iterations = 10
///
/// [simulation]
/// dt = 0.016666666666666666
/// gravity = -9.81
/// preservation = 0.01
/// solver = "conjugate_gradient"
///
/// [simulation.cg]
/// tolerance = 1e-6
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrapeConfig {
    #[serde(default)]
    pub cloth: ClothConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl DrapeConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> DrapeResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| DrapeError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> DrapeResult<String> {
        toml::to_string(self).map_err(|e| DrapeError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> DrapeResult<()> {
        self.cloth.validate()?;
        self.simulation.validate()
    }
}

fn positive(name: &str, value: Scalar) -> DrapeResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(DrapeError::InvalidConfig(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}
