use log::{debug, error};

use crate::constants_config::SimConstants;
use crate::errors::SimError;
use crate::kernel::{accumulate_forces, apply_uniform, force_on_body, integrate, reset_forces};
use crate::mesh::{aggregate, MacroBody};

use super::comm::{recv_blocking, CellTask, CellUpdate, StepAssignment, StepResult, WorkMessage, WorkerComm};

/// Worker rank main loop: receive an assignment, compute and integrate its
/// cells, report the integrated state, and arrive at the step barrier.
///
/// Exits on a `Shutdown` message or on losing the assignment channel. A
/// compute error is logged and reported as an empty result: the count
/// mismatch fails the step at the coordinator's merge without wedging the
/// other ranks mid-barrier.
pub fn run_worker(comm: &mut WorkerComm, constants: SimConstants) {
    loop {
        let message = match recv_blocking(&mut comm.work_channel.rx) {
            Ok(message) => message,
            Err(_) => return,
        };
        let assignment = match message {
            WorkMessage::Assign(assignment) => assignment,
            WorkMessage::Shutdown => return,
        };
        debug!(
            "rank {} received {} cells",
            comm.rank,
            assignment.cells.len()
        );
        let updates = match compute_and_integrate(&assignment, &constants) {
            Ok(updates) => updates,
            Err(e) => {
                error!("rank {} failed to compute its assignment: {}", comm.rank, e);
                Vec::new()
            }
        };
        if comm
            .result_channel
            .tx[0]
            .send(StepResult {
                rank: comm.rank,
                updates,
            })
            .is_err()
        {
            return;
        }
        if comm.barrier().is_err() {
            return;
        }
    }
}

/// Computes one step for every cell of an assignment and returns the
/// integrated per-cell state.
///
/// Per cell: reset the force accumulators, run the pairwise kernel (per
/// leaf for a refined cell, with an intra-parent coarse pass over the leaf
/// macro-bodies), add the top-level coarse perturbation, then integrate.
/// All work happens on the assignment's own copies.
pub fn compute_and_integrate(
    assignment: &StepAssignment,
    constants: &SimConstants,
) -> Result<Vec<CellUpdate>, SimError> {
    // Macro-body set for the top-level coarse pass, shared by all cells.
    let macro_rx: Vec<f64> = assignment.macro_bodies.iter().map(|b| b.center_x).collect();
    let macro_ry: Vec<f64> = assignment.macro_bodies.iter().map(|b| b.center_y).collect();
    let macro_m: Vec<f64> = assignment
        .macro_bodies
        .iter()
        .map(|b| b.total_mass)
        .collect();

    let mut updates = Vec::with_capacity(assignment.cells.len());
    let mut fx = Vec::new();
    let mut fy = Vec::new();
    for task in &assignment.cells {
        let count = task.indices.len();
        fx.resize(count, 0.0);
        fy.resize(count, 0.0);
        reset_forces(&mut fx, &mut fy);

        if task.leaves.is_empty() {
            accumulate_forces(&task.rx, &task.ry, &task.m, &mut fx, &mut fy, constants);
        } else {
            accumulate_refined(task, &mut fx, &mut fy, constants);
        }

        // Top-level coarse pass: force on this cell's macro-body from all
        // other macro-bodies, applied identically to every member.
        let own = assignment
            .macro_bodies
            .iter()
            .position(|b| b.cell_index == task.cell_index);
        if let Some(target) = own {
            let (dfx, dfy) = force_on_body(target, &macro_rx, &macro_ry, &macro_m, constants);
            apply_uniform(&mut fx, &mut fy, dfx, dfy);
        }

        let mut rx = task.rx.clone();
        let mut ry = task.ry.clone();
        let mut vx = task.vx.clone();
        let mut vy = task.vy.clone();
        integrate(&mut rx, &mut ry, &mut vx, &mut vy, &fx, &fy, &task.m, constants)?;
        updates.push(CellUpdate {
            indices: task.indices.clone(),
            rx,
            ry,
            vx,
            vy,
            fx: fx.clone(),
            fy: fy.clone(),
        });
    }
    Ok(updates)
}

/// Local force pass for a refined cell: each leaf gets its own pairwise
/// kernel, then the leaves interact through their macro-bodies
/// (perturbation broadcast to each leaf's members), mirroring the coarse
/// pass one level down.
fn accumulate_refined(task: &CellTask, fx: &mut [f64], fy: &mut [f64], constants: &SimConstants) {
    for members in &task.leaves {
        let leaf_rx: Vec<f64> = members.iter().map(|&i| task.rx[i]).collect();
        let leaf_ry: Vec<f64> = members.iter().map(|&i| task.ry[i]).collect();
        let leaf_m: Vec<f64> = members.iter().map(|&i| task.m[i]).collect();
        let mut leaf_fx = vec![0.0; members.len()];
        let mut leaf_fy = vec![0.0; members.len()];
        accumulate_forces(&leaf_rx, &leaf_ry, &leaf_m, &mut leaf_fx, &mut leaf_fy, constants);
        for (slot, &i) in members.iter().enumerate() {
            fx[i] += leaf_fx[slot];
            fy[i] += leaf_fy[slot];
        }
    }

    let bodies: Vec<(usize, MacroBody)> = task
        .leaves
        .iter()
        .enumerate()
        .filter_map(|(leaf, members)| {
            aggregate(members, &task.rx, &task.ry, &task.m, leaf).map(|body| (leaf, body))
        })
        .collect();
    let leaf_rx: Vec<f64> = bodies.iter().map(|(_, b)| b.center_x).collect();
    let leaf_ry: Vec<f64> = bodies.iter().map(|(_, b)| b.center_y).collect();
    let leaf_m: Vec<f64> = bodies.iter().map(|(_, b)| b.total_mass).collect();
    for (target, (leaf, _)) in bodies.iter().enumerate() {
        let (dfx, dfy) = force_on_body(target, &leaf_rx, &leaf_ry, &leaf_m, constants);
        for &i in &task.leaves[*leaf] {
            fx[i] += dfx;
            fy[i] += dfy;
        }
    }
}
