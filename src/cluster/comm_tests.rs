use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::cluster::{recv_blocking, StepResult, WorkMessage, WorkerComm};

#[test]
fn test_create_communicators_assigns_ranks() {
    let comms = WorkerComm::create_communicators(3);
    assert_eq!(comms.len(), 3);
    for (i, comm) in comms.iter().enumerate() {
        assert_eq!(comm.rank, i);
        assert_eq!(comm.size, 3);
        assert_eq!(comm.work_channel.tx.len(), 3);
        assert_eq!(comm.result_channel.tx.len(), 3);
        assert_eq!(comm.sync_channel.tx.len(), 3);
    }
}

#[test]
fn test_work_channel_roundtrip() {
    let mut comms = WorkerComm::create_communicators(2);
    comms[0].work_channel.tx[1]
        .send(WorkMessage::Shutdown)
        .expect("rank 1 reachable");
    let received = recv_blocking(&mut comms[1].work_channel.rx).expect("message arrives");
    assert!(matches!(received, WorkMessage::Shutdown));
}

#[test]
fn test_result_channel_reports_rank() {
    let mut comms = WorkerComm::create_communicators(2);
    comms[1].result_channel.tx[0]
        .send(StepResult {
            rank: 1,
            updates: vec![],
        })
        .expect("rank 0 reachable");
    let result = recv_blocking(&mut comms[0].result_channel.rx).expect("result arrives");
    assert_eq!(result.rank, 1);
    assert!(result.updates.is_empty());
}

#[test]
fn test_barrier_waits_for_every_rank() {
    let size = 4;
    let mut comms = WorkerComm::create_communicators(size);
    let arrived = AtomicUsize::new(0);
    thread::scope(|s| {
        for mut comm in comms.drain(..) {
            let arrived = &arrived;
            s.spawn(move || {
                arrived.fetch_add(1, Ordering::SeqCst);
                comm.barrier().expect("all ranks alive");
                // Nobody passes the barrier before everyone arrived.
                assert_eq!(arrived.load(Ordering::SeqCst), size);
            });
        }
    });
}

#[test]
fn test_barrier_survives_repeated_use() {
    let size = 3;
    let mut comms = WorkerComm::create_communicators(size);
    thread::scope(|s| {
        for mut comm in comms.drain(..) {
            s.spawn(move || {
                for _ in 0..5 {
                    comm.barrier().expect("all ranks alive");
                }
            });
        }
    });
}
