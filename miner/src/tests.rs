use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use shared::{Candidate, SearchError, TaskDescriptor, Witness};

use crate::{
    predicate::{sha256_hex_predicate, Evaluator},
    search,
    Coordinator,
    SearchConfig,
    StopReason,
    StopSignal,
    WorkerState,
};

fn never(_: &TaskDescriptor, _: Candidate) -> anyhow::Result<Option<Witness>> {
    Ok(None)
}

#[test]
fn block1_difficulty_two() {
    let task = TaskDescriptor::new("block1", 2);
    let config = SearchConfig::default().with_deadline(Duration::from_secs(30));

    let witness = search(task.clone(), 4, sha256_hex_predicate(), &config).unwrap();

    assert!(witness.proof_hex().starts_with("00"), "{witness}");
    // independent re-check
    let again = sha256_hex_predicate().evaluate(&task, witness.candidate).unwrap();
    assert_eq!(again, Some(witness));
}

#[test]
fn multiple_solutions_yield_one_witness() {
    let every_third = |_: &TaskDescriptor, nonce: Candidate| -> anyhow::Result<Option<Witness>> {
        Ok((nonce % 3 == 0).then(|| Witness::new(nonce, nonce.to_le_bytes())))
    };
    let signal = StopSignal::new();
    let coordinator = Coordinator::new(every_third, SearchConfig::default().with_candidate_limit(10_000))
        .with_signal(signal.clone());

    let report = coordinator.run(TaskDescriptor::new("", 0), 6).unwrap();

    assert!(signal.is_raised());
    assert_eq!(report.witness.candidate % 3, 0);
    assert_eq!(report.exits.len(), 6);
    assert_eq!(report.exits.iter().filter(|exit| exit.published).count(), 1);

    let winner = report.exits.iter().find(|exit| exit.published).unwrap();
    assert_eq!(winner.id, report.worker);
    assert_eq!(winner.state, WorkerState::Found);
    assert!(report.hashes >= 1);
}

#[test]
fn never_succeeding_search_times_out() {
    let config = SearchConfig::default().with_deadline(Duration::from_millis(200));
    let start = Instant::now();

    let err = search(TaskDescriptor::new("block1", 0), 3, never, &config).unwrap_err();

    assert_eq!(err, SearchError::Timeout(Duration::from_millis(200)));
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
}

#[test]
fn zero_workers_is_rejected_without_evaluating() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = {
        let calls = calls.clone();
        move |_: &TaskDescriptor, _: Candidate| -> anyhow::Result<Option<Witness>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    };

    let err = search(TaskDescriptor::new("block1", 2), 0, counted, &SearchConfig::default()).unwrap_err();

    assert!(matches!(err, SearchError::InvalidConfiguration(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unreachable_difficulty_is_rejected() {
    let err = search(TaskDescriptor::new("block1", 65), 2, sha256_hex_predicate(), &SearchConfig::default())
        .unwrap_err();
    assert!(matches!(err, SearchError::InvalidConfiguration(_)));
}

#[test]
fn empty_candidate_space_is_rejected() {
    let config = SearchConfig::default().with_candidate_limit(0);
    let err = search(TaskDescriptor::new("", 0), 2, never, &config).unwrap_err();
    assert!(matches!(err, SearchError::InvalidConfiguration(_)));
}

#[test]
fn bounded_space_is_exhausted() {
    let coordinator = Coordinator::new(never, SearchConfig::default().with_candidate_limit(1_000));
    let err = coordinator.run(TaskDescriptor::new("", 0), 4).unwrap_err();
    assert_eq!(err, SearchError::Exhausted { limit: 1_000 });
}

#[test]
fn all_faulting_workers_fail_the_search() {
    let broken = |_: &TaskDescriptor, nonce: Candidate| -> anyhow::Result<Option<Witness>> {
        anyhow::bail!("cannot evaluate {nonce}")
    };

    let err = search(TaskDescriptor::new("", 0), 3, broken, &SearchConfig::default()).unwrap_err();

    assert_eq!(err, SearchError::AllWorkersFailed { workers: 3 });
}

#[test]
fn all_faulting_workers_with_deadline_time_out() {
    let broken = |_: &TaskDescriptor, nonce: Candidate| -> anyhow::Result<Option<Witness>> {
        anyhow::bail!("cannot evaluate {nonce}")
    };
    let config = SearchConfig::default().with_deadline(Duration::from_millis(200));

    let err = search(TaskDescriptor::new("", 0), 3, broken, &config).unwrap_err();

    assert_eq!(err, SearchError::Timeout(Duration::from_millis(200)));
}

// stripe 1 of 4 faults at nonce 1, so nonce 5 is never tried
fn faults_before_solution(_: &TaskDescriptor, nonce: Candidate) -> anyhow::Result<Option<Witness>> {
    anyhow::ensure!(nonce != 1, "flaky nonce {nonce}");
    Ok((nonce == 5).then(|| Witness::new(nonce, vec![5])))
}

#[test]
fn partly_faulted_bounded_space_is_not_exhausted() {
    let config = SearchConfig::default().with_candidate_limit(100);

    let err = search(TaskDescriptor::new("", 0), 4, faults_before_solution, &config).unwrap_err();

    assert_eq!(err, SearchError::AllWorkersFailed { workers: 4 });
}

#[test]
fn partly_faulted_bounded_space_with_deadline_times_out() {
    let config = SearchConfig::default().with_candidate_limit(100).with_deadline(Duration::from_secs(5));

    let err = search(TaskDescriptor::new("", 0), 4, faults_before_solution, &config).unwrap_err();

    assert_eq!(err, SearchError::Timeout(Duration::from_secs(5)));
}

#[test]
fn faulting_worker_does_not_stop_the_others() {
    // stripe 1 of 4 faults on its first candidate, stripe 2 holds the answer
    let flaky = |_: &TaskDescriptor, nonce: Candidate| -> anyhow::Result<Option<Witness>> {
        anyhow::ensure!(nonce % 4 != 1, "flaky nonce {nonce}");
        Ok((nonce == 42).then(|| Witness::new(nonce, vec![42])))
    };
    let coordinator = Coordinator::new(flaky, SearchConfig::default().with_deadline(Duration::from_secs(30)));

    let report = coordinator.run(TaskDescriptor::new("", 0), 4).unwrap();

    assert_eq!(report.witness, Witness::new(42, vec![42]));
    assert_eq!(report.worker, 2);
    assert_eq!(report.exits[1].state, WorkerState::Stopped(StopReason::Faulted));
}

#[test]
fn raising_the_signal_cancels_the_search() {
    let signal = StopSignal::new();
    let coordinator = Coordinator::new(never, SearchConfig::default()).with_signal(signal.clone());

    let remote = signal.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        remote.raise();
    });

    let err = coordinator.run(TaskDescriptor::new("", 0), 2).unwrap_err();
    canceller.join().unwrap();

    assert_eq!(err, SearchError::Cancelled);
}

#[test]
fn fresh_signal_per_run_without_external_one() {
    let coordinator = Coordinator::new(sha256_hex_predicate(), SearchConfig::default());
    let task = TaskDescriptor::new("block1", 1);

    let first = coordinator.run(task.clone(), 2).unwrap();
    let second = coordinator.run(task, 2).unwrap();

    assert!(first.witness.proof_hex().starts_with('0'));
    assert!(second.witness.proof_hex().starts_with('0'));
}

#[test]
fn single_worker_finds_smallest_solution() {
    let task = TaskDescriptor::new("block1", 1);
    let witness = search(task.clone(), 1, sha256_hex_predicate(), &SearchConfig::default()).unwrap();

    let predicate = sha256_hex_predicate();
    for nonce in 0..witness.candidate {
        assert_eq!(predicate.evaluate(&task, nonce).unwrap(), None);
    }
}

#[test]
fn pinned_workers_still_search() {
    let config = SearchConfig::default().with_pin_cores(true).with_deadline(Duration::from_secs(30));
    let witness = search(TaskDescriptor::new("block1", 1), 2, sha256_hex_predicate(), &config).unwrap();
    assert!(witness.proof_hex().starts_with('0'));
}
