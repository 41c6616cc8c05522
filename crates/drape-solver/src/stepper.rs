//! Frame stepper: the local/global loop.
//!
//! One frame:
//! 1. **Predict**: `y = (2 − p)·x − (1 − p)·x_prev`, then `x_prev ← x`
//! 2. **Local step**: project every constraint onto its rest length
//! 3. **Global step**: assemble `b`, solve `Y·x = b`
//! 4. **Repeat** steps 2–3 for the configured number of iterations
//! 5. **Pin**: overwrite pinned vertices with their captured positions
//!
//! The stepper owns every buffer it touches. The linear solver only
//! holds the system matrix; `b` is passed to it on each solve.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use drape_math::{
    ConjugateGradient, CsrMatrix, DVec3, FaerCholesky, LinearSolver, SolveReport,
};
use drape_mesh::Topology;
use drape_types::{DrapeError, DrapeResult, Scalar, VertexId};

use crate::assembly::{assemble_rhs, SystemBuilder};
use crate::config::{ClothConfig, GlobalSolverKind, SimulationConfig};
use crate::local::local_step;
use crate::state::ClothState;

/// A vertex held at a fixed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pin {
    pub vertex: VertexId,
    pub target: DVec3,
}

/// Summary of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Local/global iterations performed.
    pub local_iterations: u32,
    /// Sum of linear-solver iterations over all global steps.
    pub solver_iterations_total: usize,
    /// Largest linear-solver iteration count of any single global step.
    pub solver_iterations_max: usize,
    /// Largest final residual of any global step.
    pub residual_max: Scalar,
    /// Whether every global step reached its tolerance.
    pub converged: bool,
    /// Degenerate (zero-length) constraints summed over local steps.
    pub degenerate_constraints: usize,
    /// Largest per-vertex position change across the frame.
    pub max_displacement: Scalar,
    /// Wall-clock time for this frame (seconds).
    pub wall_time: f64,
}

/// Data that only exists once the system is assembled.
struct Ready {
    topology: Topology,
    projection: CsrMatrix,
    solver: Box<dyn LinearSolver>,
    state: ClothState,
    pins: Vec<Pin>,
}

/// Projective-dynamics cloth stepper.
///
/// Starts uninitialized; [`init`](Self::init) builds the topology,
/// assembles the system, and binds the linear solver. Pinning and
/// stepping before that return [`DrapeError::Uninitialized`].
pub struct Stepper {
    cloth: ClothConfig,
    simulation: SimulationConfig,
    ready: Option<Ready>,
}

impl Stepper {
    /// Validates both configs. The stepper is not ready until [`init`](Self::init).
    pub fn new(cloth: ClothConfig, simulation: SimulationConfig) -> DrapeResult<Self> {
        cloth.validate()?;
        simulation.validate()?;
        Ok(Self {
            cloth,
            simulation,
            ready: None,
        })
    }

    /// Convenience: `new` followed by `init`.
    pub fn ready(cloth: ClothConfig, simulation: SimulationConfig) -> DrapeResult<Self> {
        let mut stepper = Self::new(cloth, simulation)?;
        stepper.init()?;
        Ok(stepper)
    }

    /// Generates topology, assembles `Y` and `J`, initializes the state
    /// vectors, and binds the global solver.
    ///
    /// Calling again rebuilds from scratch and drops existing pins.
    #[tracing::instrument(level = "debug", skip_all, fields(resolution = self.cloth.resolution))]
    pub fn init(&mut self) -> DrapeResult<()> {
        let topology = Topology::grid(self.cloth.resolution, self.cloth.size)?;
        let assembled = SystemBuilder::new(&topology, &self.cloth, &self.simulation).build()?;

        let matrix = Arc::new(assembled.system_matrix);
        let solver: Box<dyn LinearSolver> = match self.simulation.solver {
            GlobalSolverKind::ConjugateGradient => {
                Box::new(ConjugateGradient::new(matrix, self.simulation.cg)?)
            }
            GlobalSolverKind::Cholesky => Box::new(FaerCholesky::from_matrix(matrix)?),
        };
        debug!(solver = solver.name(), dimension = solver.dimension(), "bound global solver");

        self.ready = Some(Ready {
            topology,
            projection: assembled.projection,
            solver,
            state: assembled.state,
            pins: Vec::new(),
        });
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_some()
    }

    fn ready_ref(&self, action: &str) -> DrapeResult<&Ready> {
        self.ready
            .as_ref()
            .ok_or_else(|| DrapeError::Uninitialized(format!("cannot {action} before init()")))
    }

    fn ready_mut(&mut self, action: &str) -> DrapeResult<&mut Ready> {
        self.ready
            .as_mut()
            .ok_or_else(|| DrapeError::Uninitialized(format!("cannot {action} before init()")))
    }

    /// Pins grid vertex `(row, col)` at its current simulated position.
    ///
    /// The target is captured now, not taken from the rest grid: pinning
    /// after some frames holds the vertex where it has moved to.
    pub fn add_fixed(&mut self, row: usize, col: usize) -> DrapeResult<VertexId> {
        let ready = self.ready_mut("add a fixed vertex")?;
        if !ready.topology.contains(row, col) {
            return Err(DrapeError::InvalidConfig(format!(
                "pin ({row}, {col}) is outside the {n}×{n} grid",
                n = ready.topology.resolution()
            )));
        }

        let vertex = ready.topology.vertex_id(row, col);
        let target = ready.state.position(vertex);
        ready.pins.push(Pin { vertex, target });
        debug!(row, col, ?target, "pinned vertex");
        Ok(vertex)
    }

    /// Advances the simulation by one frame.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn step(&mut self) -> DrapeResult<FrameReport> {
        let iterations = self.cloth.local_iterations;
        let mass = self.cloth.vertex_mass;
        let preservation = self.simulation.preservation;
        let dt2 = self.simulation.dt_squared();
        let ready = self.ready_mut("step")?;

        let start = Instant::now();
        let Ready {
            topology,
            projection,
            solver,
            state,
            pins,
        } = ready;

        // 1. Inertial prediction; x_prev now holds the pre-frame positions.
        state.predict(preservation);

        let mut report = FrameReport {
            local_iterations: iterations,
            solver_iterations_total: 0,
            solver_iterations_max: 0,
            residual_max: 0.0,
            converged: true,
            degenerate_constraints: 0,
            max_displacement: 0.0,
            wall_time: 0.0,
        };

        // 2. Local/global iterations
        for _ in 0..iterations {
            report.degenerate_constraints +=
                local_step(topology.constraints(), &state.x, &mut state.d)?;

            assemble_rhs(
                projection,
                &state.d,
                &state.f_external,
                &state.y,
                mass,
                dt2,
                &mut state.b,
            )?;

            let solve: SolveReport = solver.solve(&state.b, &mut state.x)?;
            report.solver_iterations_total += solve.iterations;
            report.solver_iterations_max = report.solver_iterations_max.max(solve.iterations);
            report.residual_max = report.residual_max.max(solve.residual);
            report.converged &= solve.converged;
        }

        // 3. Pins are reasserted every frame rather than built into Y.
        for pin in pins.iter() {
            state.set_position(pin.vertex, pin.target);
        }

        report.max_displacement = state.max_displacement();
        report.wall_time = start.elapsed().as_secs_f64();

        if !report.converged {
            warn!(
                residual = report.residual_max,
                iterations = report.solver_iterations_max,
                "global solve stopped at its iteration cap"
            );
        }
        if report.degenerate_constraints > 0 {
            debug!(
                count = report.degenerate_constraints,
                "zero-length constraints projected to zero"
            );
        }
        debug!(
            solver_iterations = report.solver_iterations_total,
            max_displacement = report.max_displacement,
            wall_time = report.wall_time,
            "frame complete"
        );

        Ok(report)
    }

    /// Current positions, interleaved `[x0, y0, z0, x1, ...]`.
    pub fn positions(&self) -> DrapeResult<&[Scalar]> {
        Ok(&self.ready_ref("read positions")?.state.x)
    }

    pub fn position(&self, vertex: VertexId) -> DrapeResult<DVec3> {
        let ready = self.ready_ref("read positions")?;
        if vertex.index() >= ready.state.vertex_count {
            return Err(DrapeError::dimension(
                "vertex index",
                ready.state.vertex_count,
                vertex.index(),
            ));
        }
        Ok(ready.state.position(vertex))
    }

    pub fn state(&self) -> DrapeResult<&ClothState> {
        Ok(&self.ready_ref("read state")?.state)
    }

    pub fn topology(&self) -> DrapeResult<&Topology> {
        Ok(&self.ready_ref("read topology")?.topology)
    }

    pub fn pins(&self) -> &[Pin] {
        match &self.ready {
            Some(ready) => &ready.pins,
            None => &[],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.cloth.resolution * self.cloth.resolution
    }

    pub fn cloth_config(&self) -> &ClothConfig {
        &self.cloth
    }

    pub fn simulation_config(&self) -> &SimulationConfig {
        &self.simulation
    }
}
