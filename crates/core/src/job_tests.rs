use super::*;
use proptest::prelude::*;
use yare::parameterized;

fn job(id: &str, status: JobStatus, created_at: i64, sequence: i64) -> SendJob {
    SendJob {
        id: JobId::new(id),
        command: "agent.send".to_string(),
        session: "s".to_string(),
        agent: None,
        status,
        error: None,
        sequence,
        created_at,
        updated_at: created_at,
        completed_at: None,
    }
}

#[parameterized(
        pending_to_running = { JobStatus::Pending, JobStatus::Running, true },
        pending_to_canceled = { JobStatus::Pending, JobStatus::Canceled, true },
        pending_to_failed = { JobStatus::Pending, JobStatus::Failed, true },
        running_to_completed = { JobStatus::Running, JobStatus::Completed, true },
        running_to_failed = { JobStatus::Running, JobStatus::Failed, true },
        pending_to_completed = { JobStatus::Pending, JobStatus::Completed, false },
        running_to_canceled = { JobStatus::Running, JobStatus::Canceled, false },
        completed_to_anything = { JobStatus::Completed, JobStatus::Pending, false },
        failed_to_anything = { JobStatus::Failed, JobStatus::Running, false },
        canceled_to_anything = { JobStatus::Canceled, JobStatus::Pending, false },
        self_transition = { JobStatus::Running, JobStatus::Running, false },
    )]
fn transition_table(from: JobStatus, to: JobStatus, expected: bool) {
    assert_eq!(can_transition(from, to), expected);
}

#[test]
fn set_status_from_terminal_is_a_silent_no_op() {
    let mut j = job("j1", JobStatus::Completed, 100, 1);
    j.set_status(JobStatus::Running, None, 200);
    assert_eq!(j.status, JobStatus::Completed);
    assert_eq!(j.updated_at, 100, "untouched on illegal transition");
}

#[test]
fn set_status_records_completed_at_on_terminal_transition() {
    let mut j = job("j1", JobStatus::Running, 100, 1);
    j.set_status(JobStatus::Completed, None, 200);
    assert_eq!(j.status, JobStatus::Completed);
    assert_eq!(j.completed_at, Some(200));
}

#[test]
fn running_ranks_before_non_running() {
    let running = job("b", JobStatus::Running, 500, 2);
    let pending = job("a", JobStatus::Pending, 100, 1);
    assert_eq!(compare_for_head(&running, &pending), Ordering::Less);
}

#[test]
fn earlier_created_at_wins_when_running_state_ties() {
    let first = job("b", JobStatus::Pending, 100, 2);
    let second = job("a", JobStatus::Pending, 200, 1);
    assert_eq!(compare_for_head(&first, &second), Ordering::Less);
}

#[test]
fn sequence_breaks_created_at_ties_when_both_positive() {
    let first = job("b", JobStatus::Pending, 100, 1);
    let second = job("a", JobStatus::Pending, 100, 2);
    assert_eq!(compare_for_head(&first, &second), Ordering::Less);
}

#[test]
fn id_breaks_remaining_ties() {
    let first = job("a", JobStatus::Pending, 100, 0);
    let second = job("b", JobStatus::Pending, 100, 0);
    assert_eq!(compare_for_head(&first, &second), Ordering::Less);
}

fn arb_job() -> impl Strategy<Value = SendJob> {
    (
        "[a-z]{1,8}",
        prop_oneof![
            Just(JobStatus::Pending),
            Just(JobStatus::Running),
            Just(JobStatus::Completed),
            Just(JobStatus::Failed),
            Just(JobStatus::Canceled),
        ],
        0i64..1000,
        0i64..1000,
    )
        .prop_map(|(id, status, created_at, sequence)| job(&id, status, created_at, sequence))
}

proptest! {
    #[test]
    fn comparator_is_antisymmetric(a in arb_job(), b in arb_job()) {
        let fwd = compare_for_head(&a, &b);
        let bwd = compare_for_head(&b, &a);
        prop_assert_eq!(fwd, bwd.reverse());
    }

    #[test]
    fn comparator_is_transitive(a in arb_job(), b in arb_job(), c in arb_job()) {
        let ab = compare_for_head(&a, &b);
        let bc = compare_for_head(&b, &c);
        if ab != Ordering::Greater && bc != Ordering::Greater {
            prop_assert_ne!(compare_for_head(&a, &c), Ordering::Greater);
        }
    }

    #[test]
    fn comparator_is_reflexive(a in arb_job()) {
        prop_assert_eq!(compare_for_head(&a, &a), Ordering::Equal);
    }
}
