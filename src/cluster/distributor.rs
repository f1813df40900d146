use std::thread;
use std::time::Duration;

use log::{error, warn};

use crate::errors::SimError;
use crate::mesh::MacroBody;

use super::comm::{recv_blocking, CellTask, StepAssignment, StepResult, WorkMessage, WorkerComm};

/// Delivery attempts per rank before the step is abandoned.
const MAX_SEND_ATTEMPTS: u32 = 5;
/// Backoff before the first retry; doubles on each further attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(1);

/// Round-robin cell assignment: position `k` in the non-empty cell
/// sequence goes to rank `(k % workers) + 1`.
///
/// Returns, per worker, the positions assigned to it, in generation
/// order. The mapping deliberately ignores per-cell particle counts - see
/// DESIGN.md.
///
/// # Errors
///
/// Returns `SimError::InvalidWorkerCount` when `workers` is zero.
pub fn round_robin(cell_count: usize, workers: usize) -> Result<Vec<Vec<usize>>, SimError> {
    if workers == 0 {
        return Err(SimError::InvalidWorkerCount);
    }
    let mut assigned = vec![Vec::new(); workers];
    for k in 0..cell_count {
        assigned[k % workers].push(k);
    }
    Ok(assigned)
}

/// Delivers one rank's assignment, retrying with exponential backoff.
///
/// After the final attempt the step fails, naming the unreachable rank;
/// there is no partial-step recovery beyond that.
pub fn send_assignment(
    comm: &WorkerComm,
    rank: usize,
    assignment: StepAssignment,
) -> Result<(), SimError> {
    let mut message = WorkMessage::Assign(assignment);
    let mut backoff = INITIAL_BACKOFF;
    for attempt in 1..=MAX_SEND_ATTEMPTS {
        match comm.work_channel.tx[rank].send(message) {
            Ok(()) => return Ok(()),
            Err(returned) => {
                warn!(
                    "rank {} unreachable (attempt {}/{}); retrying in {:?}",
                    rank, attempt, MAX_SEND_ATTEMPTS, backoff
                );
                message = returned.message;
                thread::sleep(backoff);
                backoff *= 2;
            }
        }
    }
    error!(
        "rank {} unreachable after {} attempts; abandoning step",
        rank, MAX_SEND_ATTEMPTS
    );
    Err(SimError::WorkerUnreachable { rank })
}

/// Fans the step's cell tasks out across the worker ranks.
///
/// Tasks are consumed in generation order and bucketed by [`round_robin`];
/// each rank receives its bucket plus the full macro-body list in a single
/// [`StepAssignment`]. Ranks whose bucket is empty still receive an
/// assignment, so every rank participates in the step's barrier.
pub fn distribute(
    comm: &WorkerComm,
    tasks: Vec<CellTask>,
    macro_bodies: &[MacroBody],
    workers: usize,
) -> Result<(), SimError> {
    let positions = round_robin(tasks.len(), workers)?;
    let mut buckets: Vec<Vec<CellTask>> = positions
        .iter()
        .map(|cells| Vec::with_capacity(cells.len()))
        .collect();
    for (k, task) in tasks.into_iter().enumerate() {
        buckets[k % workers].push(task);
    }
    for (i, bucket) in buckets.into_iter().enumerate() {
        let assignment = StepAssignment {
            cells: bucket,
            macro_bodies: macro_bodies.to_vec(),
        };
        send_assignment(comm, i + 1, assignment)?;
    }
    Ok(())
}

/// Gathers every rank's [`StepResult`] for the current step.
///
/// Blocks until all `workers` ranks have reported. If the result channel
/// collapses first, the lowest rank that never reported is named in the
/// error.
pub fn collect_results(comm: &mut WorkerComm, workers: usize) -> Result<Vec<StepResult>, SimError> {
    let mut results = Vec::with_capacity(workers);
    for _ in 0..workers {
        match recv_blocking(&mut comm.result_channel.rx) {
            Ok(result) => results.push(result),
            Err(_) => {
                let reported: Vec<usize> = results.iter().map(|r| r.rank).collect();
                let missing = (1..=workers)
                    .find(|rank| !reported.contains(rank))
                    .unwrap_or(0);
                error!("result channel closed; rank {} never reported", missing);
                return Err(SimError::WorkerUnreachable { rank: missing });
            }
        }
    }
    Ok(results)
}
