//! Point-to-point channels and the collective barrier connecting the
//! coordinator (rank 0) with the worker ranks (1..=W).
//!
//! Every rank holds its own receivers plus sender clones for every other
//! rank, so any rank can message any rank directly. Messages carry owned
//! copies of the data they describe; ranks never share mutable state.

use itertools::izip;
use lockfree::channel::mpsc::{self, Receiver, Sender};
use lockfree::channel::RecvErr;

use crate::mesh::MacroBody;

/// Everything a worker needs to compute one assigned cell for one step.
#[derive(Debug, Clone)]
pub struct CellTask {
    /// Index of the cell in the step mesh's generation order.
    pub cell_index: usize,
    /// Global particle indices of the cell's members, ascending.
    pub indices: Vec<usize>,
    pub rx: Vec<f64>,
    pub ry: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    pub m: Vec<f64>,
    /// Leaf decomposition of an over-dense cell, each leaf given as
    /// offsets into the task arrays. Empty when the cell was not refined.
    pub leaves: Vec<Vec<usize>>,
}

/// One step's work for a single rank: its cells plus the macro-bodies of
/// every non-empty cell (needed for the coarse pass). Built fresh each
/// step, sent once, discarded after the step's barrier.
#[derive(Debug, Clone)]
pub struct StepAssignment {
    pub cells: Vec<CellTask>,
    pub macro_bodies: Vec<MacroBody>,
}

/// Payload of the assignment channel.
#[derive(Debug)]
pub enum WorkMessage {
    Assign(StepAssignment),
    Shutdown,
}

/// Integrated state a worker hands back for one cell.
#[derive(Debug, Clone)]
pub struct CellUpdate {
    pub indices: Vec<usize>,
    pub rx: Vec<f64>,
    pub ry: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    pub fx: Vec<f64>,
    pub fy: Vec<f64>,
}

/// A rank's complete result for one step.
#[derive(Debug)]
pub struct StepResult {
    pub rank: usize,
    pub updates: Vec<CellUpdate>,
}

#[derive(Debug)]
pub struct WorkChannel {
    pub rx: Receiver<WorkMessage>,
    pub tx: Vec<Sender<WorkMessage>>,
}

#[derive(Debug)]
pub struct ResultChannel {
    pub rx: Receiver<StepResult>,
    pub tx: Vec<Sender<StepResult>>,
}

#[derive(Debug)]
pub struct SyncChannel {
    pub rx: Receiver<bool>,
    pub tx: Vec<Sender<bool>>,
}

#[derive(Debug)]
pub struct WorkerComm {
    pub rank: usize,
    // Total number of ranks, coordinator included.
    pub size: usize,
    // Channel for shipping step assignments to workers.
    pub work_channel: WorkChannel,
    // Channel for gathering step results in rank 0.
    pub result_channel: ResultChannel,
    // Channel for the step barrier.
    pub sync_channel: SyncChannel,
}

impl WorkerComm {
    /// Creates the fully-connected communicator set for `number` ranks.
    /// Index 0 is the coordinator, 1..number the workers.
    pub fn create_communicators(number: usize) -> Vec<WorkerComm> {
        let (work_senders, work_receivers): (Vec<_>, Vec<_>) =
            (0..number).map(|_| mpsc::create()).unzip();
        let (result_senders, result_receivers): (Vec<_>, Vec<_>) =
            (0..number).map(|_| mpsc::create()).unzip();
        let (sync_senders, sync_receivers): (Vec<_>, Vec<_>) =
            (0..number).map(|_| mpsc::create()).unzip();

        let mut communicators: Vec<WorkerComm> = vec![];
        for (i, (work_receiver, result_receiver, sync_receiver)) in
            izip!(work_receivers, result_receivers, sync_receivers).enumerate()
        {
            let comm = WorkerComm {
                rank: i,
                size: number,
                work_channel: WorkChannel {
                    rx: work_receiver,
                    tx: work_senders.clone(),
                },
                result_channel: ResultChannel {
                    rx: result_receiver,
                    tx: result_senders.clone(),
                },
                sync_channel: SyncChannel {
                    rx: sync_receiver,
                    tx: sync_senders.clone(),
                },
            };
            communicators.push(comm);
        }
        communicators
    }

    /// Blocking barrier across every rank in the communicator set.
    ///
    /// # Returns
    /// Returns Ok(_) if successful or Err(RecvErr::NoSender) if one of the
    /// connections got disconnected.
    pub fn barrier(&mut self) -> Result<(), RecvErr> {
        // Announce arrival to every rank.
        for sender in &self.sync_channel.tx {
            if sender.send(true).is_err() {
                return Err(RecvErr::NoSender);
            }
        }

        // Wait until every rank has announced.
        for _ in 0..self.size {
            loop {
                match self.sync_channel.rx.recv() {
                    Ok(_msg) => {
                        break;
                    }
                    Err(RecvErr::NoMessage) => std::thread::yield_now(),
                    Err(RecvErr::NoSender) => return Err(RecvErr::NoSender),
                }
            }
        }

        Ok(())
    }
}

/// Blocks until a message arrives. The channels are non-blocking by
/// construction, so an empty mailbox is polled with a scheduler yield in
/// between.
pub fn recv_blocking<T>(rx: &mut Receiver<T>) -> Result<T, RecvErr> {
    loop {
        match rx.recv() {
            Ok(message) => return Ok(message),
            Err(RecvErr::NoMessage) => std::thread::yield_now(),
            Err(RecvErr::NoSender) => return Err(RecvErr::NoSender),
        }
    }
}
