use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use reqflow_batch::{BatchConfig, BatchExecutor, Repository, ToastReporter};
use reqflow_model::{
    LevelNumber, OverallReviewStatus, Requirement, RequirementPatch, ReviewStatus,
};
use reqflow_review::{compute_overall_status, set_level_status};
use reqflow_test_utils::{pending_review_items, RecordingNotifier, ScriptedRepository, ToastKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn toast_executor() -> (BatchExecutor, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let executor = BatchExecutor::new(Arc::new(ToastReporter::new(notifier.clone())));
    (executor, notifier)
}

async fn approve_level_one(
    repo: Arc<ScriptedRepository<Requirement>>,
    item: Requirement,
) -> anyhow::Result<()> {
    let review = set_level_status(&item, LevelNumber::First, ReviewStatus::Approved, None)?;
    let patch: RequirementPatch = review.into();
    repo.apply(&item.id, &patch).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_chunks_settle_before_next_chunk_starts() {
    let executor = BatchExecutor::headless();
    let log: Arc<Mutex<Vec<(usize, Instant, Instant)>>> = Arc::new(Mutex::new(Vec::new()));
    let config = BatchConfig::new("Tag").with_batch_size(3);

    executor
        .execute(
            (0..8).collect(),
            |n: usize| {
                let log = log.clone();
                async move {
                    let start = Instant::now();
                    // Later items in a chunk finish sooner
                    tokio::time::sleep(Duration::from_millis(30 - 3 * (n as u64 % 3))).await;
                    log.lock().push((n, start, Instant::now()));
                    Ok(())
                }
            },
            &config,
        )
        .await
        .unwrap();

    let log = log.lock().clone();
    assert_eq!(log.len(), 8);

    let chunk_of = |n: usize| n / 3;
    for chunk in 0..2 {
        let last_end = log
            .iter()
            .filter(|(n, _, _)| chunk_of(*n) == chunk)
            .map(|(_, _, end)| *end)
            .max()
            .unwrap();
        let next_start = log
            .iter()
            .filter(|(n, _, _)| chunk_of(*n) == chunk + 1)
            .map(|(_, start, _)| *start)
            .min()
            .unwrap();
        assert!(next_start >= last_end + config.delay());
    }

    // Items within a chunk start together
    let first_chunk_starts: Vec<Instant> = log
        .iter()
        .filter(|(n, _, _)| chunk_of(*n) == 0)
        .map(|(_, start, _)| *start)
        .collect();
    assert!(first_chunk_starts.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_no_delay_after_last_chunk() {
    let executor = BatchExecutor::headless();
    let config = BatchConfig::new("Tag").with_batch_size(2).with_delay_ms(100);
    let started = Instant::now();

    executor
        .execute(vec![1, 2, 3, 4], |_| async { Ok(()) }, &config)
        .await
        .unwrap();

    assert_eq!(started.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_failures_isolated_for_every_batch_size() {
    let failing = [2usize, 5, 7];

    for batch_size in 1..=11 {
        let executor = BatchExecutor::headless();
        let config = BatchConfig::new("Isolate")
            .with_batch_size(batch_size)
            .with_delay_ms(1);

        let result = executor
            .execute(
                (0..10).collect(),
                |n: usize| async move {
                    if failing.contains(&n) {
                        anyhow::bail!("item {n} failed");
                    }
                    Ok(())
                },
                &config,
            )
            .await
            .unwrap();

        let failed: Vec<usize> = result.failed().iter().map(|f| f.item).collect();
        let expected: Vec<usize> = (0..10).filter(|n| !failing.contains(n)).collect();
        assert_eq!(result.succeeded(), expected.as_slice(), "batch size {batch_size}");
        assert_eq!(failed, failing.to_vec(), "batch size {batch_size}");
        assert_eq!(result.total(), 10);
    }
}

#[tokio::test]
async fn test_empty_selection_short_circuits() {
    let (executor, notifier) = toast_executor();
    let calls = AtomicUsize::new(0);

    let result = executor
        .execute(
            Vec::<Requirement>::new(),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
            &BatchConfig::new("Approve"),
        )
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.total(), 0);
    assert_eq!(result.success_count(), 0);
    assert_eq!(result.fail_count(), 0);

    let outcomes = notifier.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].kind, ToastKind::Error);
    assert_eq!(outcomes[0].message, "Approve: nothing selected");
}

#[tokio::test(start_paused = true)]
async fn test_review_batch_end_to_end() {
    let items = pending_review_items(3);
    let repo = Arc::new(ScriptedRepository::new(items.clone()));
    let (executor, notifier) = toast_executor();
    let config = BatchConfig::new("Approve").with_batch_size(2);

    let result = executor
        .execute(
            items,
            |item| approve_level_one(repo.clone(), item),
            &config,
        )
        .await
        .unwrap();

    assert_eq!(result.success_count(), 3);
    assert_eq!(result.fail_count(), 0);

    // Start plus one progress toast per chunk
    let loading: Vec<String> = notifier
        .of_kind(ToastKind::Loading)
        .into_iter()
        .map(|t| t.message)
        .collect();
    assert_eq!(
        loading,
        vec!["Approve: 0/3", "Approve: 2/3", "Approve: 3/3"]
    );
    assert_eq!(notifier.of_kind(ToastKind::Dismiss).len(), 3);

    for item in repo.inner().snapshot() {
        assert_eq!(
            compute_overall_status(&item),
            OverallReviewStatus::Level1Approved
        );
    }

    let outcomes = notifier.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].kind, ToastKind::Success);
    assert!(outcomes[0].message.contains('3'));
}

#[tokio::test(start_paused = true)]
async fn test_items_without_review_are_reported_failures() {
    let mut items = pending_review_items(2);
    items.push(Requirement::new("REQ-X", "Never scheduled"));
    let repo = Arc::new(ScriptedRepository::new(items.clone()));
    let (executor, notifier) = toast_executor();

    let result = executor
        .execute(
            items,
            |item| approve_level_one(repo.clone(), item),
            &BatchConfig::new("Approve"),
        )
        .await
        .unwrap();

    assert_eq!(result.success_count(), 2);
    assert_eq!(result.failed()[0].item.id.as_str(), "REQ-X");
    assert_eq!(
        result.failed()[0].error.to_string(),
        "item REQ-X has no review data"
    );

    let outcomes = notifier.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].kind, ToastKind::Warning);
    assert_eq!(
        outcomes[0].message,
        "Approve partially completed: 2 succeeded, 1 failed"
    );
}

#[tokio::test(start_paused = true)]
async fn test_total_failure_reports_first_error() {
    let items = pending_review_items(3);
    let repo = Arc::new(ScriptedRepository::new(items.clone()).rejecting_all());
    let (executor, notifier) = toast_executor();

    let result = executor
        .execute(
            items,
            |item| approve_level_one(repo.clone(), item),
            &BatchConfig::new("Approve"),
        )
        .await
        .unwrap();

    assert_eq!(result.fail_count(), 3);

    let outcomes = notifier.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].kind, ToastKind::Error);
    assert_eq!(outcomes[0].message, "Approve failed");
    assert_eq!(
        outcomes[0].description.as_deref(),
        Some("REQ-1 rejected by store (and 2 more failures)")
    );
}

#[tokio::test]
async fn test_zero_batch_size_is_reported_and_returned() {
    let (executor, notifier) = toast_executor();

    let err = executor
        .execute(
            vec![1, 2, 3],
            |_| async { Ok(()) },
            &BatchConfig::new("Approve").with_batch_size(0),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "batch size must be at least 1");
    let errors = notifier.of_kind(ToastKind::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Approve aborted");
}

#[tokio::test(start_paused = true)]
async fn test_panicking_closure_keeps_chunk_and_toasts_intact() {
    let (executor, notifier) = toast_executor();

    let result = executor
        .execute(
            vec![1, 2, 3, 4],
            |n: i32| {
                if n == 2 {
                    panic!("closure failed before returning");
                }
                async { Ok(()) }
            },
            &BatchConfig::new("Tag").with_batch_size(2),
        )
        .await
        .unwrap();

    assert_eq!(result.succeeded(), &[1, 3, 4]);
    assert_eq!(result.fail_count(), 1);
    assert_eq!(
        notifier.of_kind(ToastKind::Loading).len(),
        notifier.of_kind(ToastKind::Dismiss).len()
    );

    let outcomes = notifier.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].message,
        "Tag partially completed: 3 succeeded, 1 failed"
    );
}

#[tokio::test(start_paused = true)]
async fn test_same_named_runs_dismiss_only_their_own_progress() {
    let (executor, notifier) = toast_executor();
    let config = BatchConfig::new("Approve").with_batch_size(1).with_delay_ms(10);
    let slow = |_: i32| async {
        tokio::time::sleep(Duration::from_millis(3)).await;
        Ok(())
    };

    let (first, second) = tokio::join!(
        executor.execute(vec![1, 2], slow, &config),
        executor.execute(vec![1, 2, 3], slow, &config),
    );
    assert_eq!(first.unwrap().success_count(), 2);
    assert_eq!(second.unwrap().success_count(), 3);

    // Every loading toast is dismissed exactly once
    let loading = notifier.of_kind(ToastKind::Loading).len();
    let mut dismissed: Vec<u64> = notifier
        .of_kind(ToastKind::Dismiss)
        .into_iter()
        .map(|t| t.message.parse().unwrap())
        .collect();
    dismissed.sort_unstable();
    assert_eq!(dismissed, (0..loading as u64).collect::<Vec<_>>());
}
