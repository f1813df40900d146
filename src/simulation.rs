//! The simulation driver: owns the particle state and coordinates the
//! worker ranks through the per-step phase machine.
//!
//! Particle properties use a structure-of-arrays layout: `rx`/`ry` store
//! positions, `vx`/`vy` velocities, `fx`/`fy` the per-step force
//! accumulators, and `m` the masses, index-aligned across arrays.
//!
//! # Example
//!
//! ```
//! use starmesh::{GalaxySystem, Simulation, DEFAULT_SIM_CONSTANTS};
//!
//! // Two bodies on the x-axis with opposing velocities.
//! let system = GalaxySystem::new(
//!     vec![-100.0, 100.0],
//!     vec![0.0, 0.0],
//!     vec![0.0, 0.0],
//!     vec![1.0e-3, -1.0e-3],
//!     vec![1.0e15, 1.0e15],
//!     1000.0,
//! ).expect("valid system");
//!
//! let mut sim = Simulation::new(system, DEFAULT_SIM_CONSTANTS, 2)
//!     .expect("valid configuration");
//! sim.advance(10).expect("simulation failed");
//! ```

use std::collections::HashMap;
use std::thread;

use log::debug;

use crate::cluster::{
    collect_results, distribute, round_robin, run_worker, CellTask, StepResult, WorkMessage,
    WorkerComm,
};
use crate::constants_config::SimConstants;
use crate::errors::SimError;
use crate::mesh::{aggregate, particles_in_cell, refine_cell, Cell, MacroBody, MeshSpec};

/// Particle state of a run, structure-of-arrays, owned by the driver for
/// the duration of the run and mutated in place by `advance`.
#[derive(Debug, Clone)]
pub struct GalaxySystem {
    pub rx: Vec<f64>,
    pub ry: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    pub fx: Vec<f64>,
    pub fy: Vec<f64>,
    pub m: Vec<f64>,
    /// Half-width of the square domain; positions are expected to stay
    /// within `[-radius, radius]` on both axes.
    pub radius: f64,
}

impl GalaxySystem {
    /// Builds a system from caller-loaded arrays. Force accumulators start
    /// at zero.
    ///
    /// # Errors
    ///
    /// Returns `SimError::MismatchedArrays` if the arrays disagree in
    /// length, or `SimError::InvalidGridParameters` if `radius` is not
    /// positive.
    pub fn new(
        rx: Vec<f64>,
        ry: Vec<f64>,
        vx: Vec<f64>,
        vy: Vec<f64>,
        m: Vec<f64>,
        radius: f64,
    ) -> Result<Self, SimError> {
        let count = rx.len();
        if ry.len() != count || vx.len() != count || vy.len() != count || m.len() != count {
            return Err(SimError::MismatchedArrays);
        }
        if radius <= 0.0 {
            return Err(SimError::InvalidGridParameters);
        }
        Ok(Self {
            rx,
            ry,
            vx,
            vy,
            fx: vec![0.0; count],
            fy: vec![0.0; count],
            m,
            radius,
        })
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Sum of all particle masses.
    pub fn total_mass(&self) -> f64 {
        self.m.iter().sum()
    }

    /// Total linear momentum `(sum m*vx, sum m*vy)`.
    pub fn total_momentum(&self) -> (f64, f64) {
        let px = self.m.iter().zip(self.vx.iter()).map(|(m, v)| m * v).sum();
        let py = self.m.iter().zip(self.vy.iter()).map(|(m, v)| m * v).sum();
        (px, py)
    }

    fn validate_masses(&self) -> Result<(), SimError> {
        if self.m.iter().any(|&mass| mass <= 0.0) {
            return Err(SimError::InvalidMass);
        }
        Ok(())
    }
}

/// Phases of one simulation step, in order. The compute and integrate
/// phases run on the worker ranks; the driver transitions through them as
/// it waits for and merges the ranks' results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    BuildMesh,
    Aggregate,
    Distribute,
    ComputeLocal,
    ComputeCoarse,
    Integrate,
    Barrier,
    Done,
}

impl StepPhase {
    /// The successor phase; `Done` is terminal.
    pub fn next(self) -> StepPhase {
        match self {
            StepPhase::BuildMesh => StepPhase::Aggregate,
            StepPhase::Aggregate => StepPhase::Distribute,
            StepPhase::Distribute => StepPhase::ComputeLocal,
            StepPhase::ComputeLocal => StepPhase::ComputeCoarse,
            StepPhase::ComputeCoarse => StepPhase::Integrate,
            StepPhase::Integrate => StepPhase::Barrier,
            StepPhase::Barrier => StepPhase::Done,
            StepPhase::Done => StepPhase::Done,
        }
    }
}

/// Per-cell plan produced by the aggregate phase.
struct CellPlan {
    cell_index: usize,
    members: Vec<usize>,
    /// Leaf memberships of a refined cell, as offsets into `members`.
    leaves: Vec<Vec<usize>>,
}

/// Coordinates a [`GalaxySystem`] through barrier-synchronized steps
/// across a set of worker ranks.
pub struct Simulation {
    system: GalaxySystem,
    constants: SimConstants,
    workers: usize,
}

impl Simulation {
    /// Validates the configuration up front: a zero worker count or
    /// degenerate mesh parameters are rejected here, before any step runs.
    pub fn new(
        system: GalaxySystem,
        constants: SimConstants,
        workers: usize,
    ) -> Result<Self, SimError> {
        if workers == 0 {
            return Err(SimError::InvalidWorkerCount);
        }
        MeshSpec::new(constants.fanout, system.radius)?;
        Ok(Self {
            system,
            constants,
            workers,
        })
    }

    pub fn system(&self) -> &GalaxySystem {
        &self.system
    }

    /// Consumes the simulation and hands the particle state back.
    pub fn into_system(self) -> GalaxySystem {
        self.system
    }

    /// Advances the system by `steps` time steps, mutating the particle
    /// arrays in place.
    ///
    /// Spawns the worker ranks for the duration of the call. Distribution
    /// of step `t + 1` never begins before step `t`'s barrier has been
    /// satisfied by every rank - the only cross-step ordering guarantee.
    ///
    /// # Errors
    ///
    /// `SimError::InvalidMass` if any mass is zero or negative (checked at
    /// the top of every step); worker communication errors as described in
    /// the `cluster` module. A failed step leaves the arrays at their
    /// pre-step state.
    pub fn advance(&mut self, steps: usize) -> Result<(), SimError> {
        let workers = self.workers;
        let constants = self.constants;
        let mut comms = WorkerComm::create_communicators(workers + 1);
        let mut coordinator = comms.remove(0);

        thread::scope(|scope| {
            for mut comm in comms {
                scope.spawn(move || run_worker(&mut comm, constants));
            }

            let mut outcome = Ok(());
            for step in 0..steps {
                debug!("step {} of {}", step + 1, steps);
                if let Err(e) = self.run_step(&mut coordinator) {
                    outcome = Err(e);
                    break;
                }
            }

            for rank in 1..=workers {
                // A rank that already exited is not an error at shutdown.
                let _ = coordinator.work_channel.tx[rank].send(WorkMessage::Shutdown);
            }
            outcome
        })
    }

    /// Runs one step through the phase machine.
    fn run_step(&mut self, comm: &mut WorkerComm) -> Result<(), SimError> {
        self.system.validate_masses()?;

        let mut phase = StepPhase::BuildMesh;
        debug!("phase {:?}", phase);
        let spec = MeshSpec::new(self.constants.fanout, self.system.radius)?;
        let cells: Vec<Cell> = spec.cells().collect();
        let memberships: Vec<Vec<usize>> = cells
            .iter()
            .map(|cell| particles_in_cell(&self.system.rx, &self.system.ry, cell))
            .collect();

        phase = phase.next();
        debug!("phase {:?}", phase);
        let (plans, macro_bodies) = self.aggregate(&cells, memberships)?;

        phase = phase.next();
        debug!("phase {:?}", phase);
        let tasks: Vec<CellTask> = plans
            .iter()
            .map(|plan| CellTask {
                cell_index: plan.cell_index,
                indices: plan.members.clone(),
                rx: gather(&self.system.rx, &plan.members),
                ry: gather(&self.system.ry, &plan.members),
                vx: gather(&self.system.vx, &plan.members),
                vy: gather(&self.system.vy, &plan.members),
                m: gather(&self.system.m, &plan.members),
                leaves: plan.leaves.clone(),
            })
            .collect();
        let expected: Vec<usize> = round_robin(tasks.len(), self.workers)?
            .iter()
            .map(|positions| positions.len())
            .collect();
        distribute(comm, tasks, &macro_bodies, self.workers)?;

        // The ranks run their local pairwise kernels and the coarse pass
        // on their own copies during these two phases.
        phase = phase.next();
        debug!("phase {:?}", phase);
        phase = phase.next();
        debug!("phase {:?}", phase);

        phase = phase.next();
        debug!("phase {:?}", phase);
        let results = collect_results(comm, self.workers)?;
        // Every rank has reported and is waiting at the barrier, so the
        // barrier must run even if the merge rejects a payload; otherwise
        // the ranks would never be released.
        let merged = self.merge_updates(results, &expected);

        phase = phase.next();
        debug!("phase {:?}", phase);
        comm.barrier().map_err(|_| SimError::BarrierFailed)?;
        merged?;

        phase = phase.next();
        debug_assert_eq!(phase, StepPhase::Done);
        Ok(())
    }

    /// Aggregate phase: refine over-dense cells, then reduce every
    /// non-empty cell to its macro-body. Cells with zero total mass are
    /// silently excluded (no macro-body, no work assignment).
    fn aggregate(
        &self,
        cells: &[Cell],
        memberships: Vec<Vec<usize>>,
    ) -> Result<(Vec<CellPlan>, Vec<MacroBody>), SimError> {
        let mut plans = Vec::new();
        let mut macro_bodies = Vec::new();
        for (cell_index, members) in memberships.into_iter().enumerate() {
            if members.is_empty() {
                continue;
            }
            let leaves = if members.len() > self.constants.refine_threshold {
                let leaf_cells = refine_cell(
                    cells[cell_index],
                    members.clone(),
                    &self.system.rx,
                    &self.system.ry,
                    self.constants.fanout,
                    self.constants.refine_threshold,
                )?;
                let offsets: HashMap<usize, usize> = members
                    .iter()
                    .enumerate()
                    .map(|(offset, &index)| (index, offset))
                    .collect();
                leaf_cells
                    .into_iter()
                    .map(|leaf| leaf.members.iter().map(|index| offsets[index]).collect())
                    .collect()
            } else {
                Vec::new()
            };
            match aggregate(
                &members,
                &self.system.rx,
                &self.system.ry,
                &self.system.m,
                cell_index,
            ) {
                Some(body) => macro_bodies.push(body),
                None => continue,
            }
            plans.push(CellPlan {
                cell_index,
                members,
                leaves,
            });
        }
        Ok((plans, macro_bodies))
    }

    /// Integrate phase, driver side: verify that every rank reported
    /// exactly its assignment, then merge the integrated state back into
    /// the system arrays. Nothing is written until every result has been
    /// checked, so a failed step discards the ranks' work wholesale.
    fn merge_updates(
        &mut self,
        results: Vec<StepResult>,
        expected: &[usize],
    ) -> Result<(), SimError> {
        let count = self.system.len();
        for result in &results {
            let want = result
                .rank
                .checked_sub(1)
                .and_then(|i| expected.get(i).copied());
            let malformed = match want {
                Some(want) => result.updates.len() != want,
                None => true,
            };
            let out_of_range = result.updates.iter().any(|update| {
                update.indices.iter().any(|&i| i >= count)
                    || update.rx.len() != update.indices.len()
                    || update.ry.len() != update.indices.len()
                    || update.vx.len() != update.indices.len()
                    || update.vy.len() != update.indices.len()
                    || update.fx.len() != update.indices.len()
                    || update.fy.len() != update.indices.len()
            });
            if malformed || out_of_range {
                return Err(SimError::MalformedPayload { rank: result.rank });
            }
        }
        for result in results {
            for update in result.updates {
                for (slot, &index) in update.indices.iter().enumerate() {
                    self.system.rx[index] = update.rx[slot];
                    self.system.ry[index] = update.ry[slot];
                    self.system.vx[index] = update.vx[slot];
                    self.system.vy[index] = update.vy[slot];
                    self.system.fx[index] = update.fx[slot];
                    self.system.fy[index] = update.fy[slot];
                }
            }
        }
        Ok(())
    }
}

/// Copies the selected elements of one particle array.
fn gather(values: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|&i| values[i]).collect()
}
