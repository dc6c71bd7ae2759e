use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use taskforge::{
    AsyncExecutor, BatchOptions, BatchPolicy, Callable, Event, EventKind, ExecutionMode, ExecutorConfig, ExecutorError,
    MonitorConfig, QueueLimits, RateLimitConfig, Subscribe, TaskConfig, TaskContext, TaskError, TaskPriority, TaskSpec,
    TaskStatus, WaitMode,
};
use tokio::sync::mpsc;

const WAIT: Option<Duration> = Some(Duration::from_secs(10));

fn config(workers: usize) -> ExecutorConfig {
    ExecutorConfig {
        workers,
        grace: Duration::from_secs(5),
        monitor: MonitorConfig {
            enabled: false,
            ..MonitorConfig::default()
        },
        log_events: false,
        ..ExecutorConfig::default()
    }
}

fn quick_retries(max: u32) -> TaskConfig {
    TaskConfig::default().with_retries(max, Duration::from_millis(10), 1.0)
}

fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Callable {
    let log = Arc::clone(log);
    Callable::from_fn(move |_ctx: TaskContext| {
        let log = Arc::clone(&log);
        async move {
            log.lock().push(name);
            Ok::<_, TaskError>(name)
        }
    })
}

fn sleeper(d: Duration) -> Callable {
    Callable::from_fn(move |ctx: TaskContext| async move {
        tokio::select! {
            _ = tokio::time::sleep(d) => Ok(()),
            _ = ctx.cancelled() => Err(TaskError::Canceled),
        }
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn higher_priority_runs_first() {
    let exec = AsyncExecutor::new(config(1));
    let log = Arc::new(Mutex::new(Vec::new()));

    let order = [
        ("low", TaskPriority::Low),
        ("urgent", TaskPriority::Urgent),
        ("normal", TaskPriority::Normal),
    ];
    let mut ids = Vec::new();
    for (name, priority) in order {
        let cfg = TaskConfig::default().with_priority(priority);
        ids.push(exec.submit_task(name, recorder(&log, name), cfg).unwrap());
    }
    exec.start().unwrap();

    let results = exec.wait_for_batch(&ids, WAIT, WaitMode::AllCompleted).await.unwrap();
    assert!(results.iter().all(|r| r.is_successful()));
    assert_eq!(results[0].task_id, "low");
    assert_eq!(*log.lock(), vec!["urgent", "normal", "low"]);
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn retries_are_bounded() {
    let exec = AsyncExecutor::new(config(2));
    exec.start().unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&attempts);
    let always_fail = Callable::from_fn(move |_ctx: TaskContext| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TaskError::fail("upstream unavailable"))
        }
    });
    let id = exec.submit_task("flaky", always_fail, quick_retries(2)).unwrap();
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.retries, 2);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(!result.is_successful());
    assert_eq!(exec.get_performance_stats().retries, 2);
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fatal_errors_are_not_retried() {
    let exec = AsyncExecutor::new(config(1));
    exec.start().unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&attempts);
    let fatal = Callable::from_fn(move |_ctx: TaskContext| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TaskError::fatal("bad input"))
        }
    });
    let id = exec.submit_task("fatal", fatal, quick_retries(5)).unwrap();
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.retries, 0);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn attempt_timeout_is_reported() {
    let exec = AsyncExecutor::new(config(1));
    exec.start().unwrap();

    let cfg = quick_retries(0).with_timeout(Some(Duration::from_millis(50)));
    let started = Instant::now();
    let id = exec.submit_task("slow", sleeper(Duration::from_secs(5)), cfg).unwrap();
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();

    assert_eq!(result.status, TaskStatus::Timeout);
    assert!(matches!(result.error, Some(TaskError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn inline_blocking_work_respects_the_timeout() {
    let exec = AsyncExecutor::new(config(1));
    exec.start().unwrap();

    let slow = Callable::blocking(|_ctx: TaskContext| {
        std::thread::sleep(Duration::from_secs(1));
        Ok::<_, TaskError>(())
    });
    let cfg = quick_retries(0)
        .with_mode(ExecutionMode::Inline)
        .with_timeout(Some(Duration::from_millis(50)));
    let started = Instant::now();
    let id = exec.submit_task("slow-inline", slow, cfg).unwrap();
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();

    assert_eq!(result.status, TaskStatus::Timeout);
    assert!(started.elapsed() < Duration::from_millis(900));
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timed_out_attempts_are_retried() {
    let exec = AsyncExecutor::new(config(1));
    exec.start().unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&attempts);
    let hangs = Callable::from_fn(move |ctx: TaskContext| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.cancelled().await;
            Err::<(), _>(TaskError::Canceled)
        }
    });
    let cfg = quick_retries(2).with_timeout(Some(Duration::from_millis(50)));
    let id = exec.submit_task("hangs", hangs, cfg).unwrap();
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();

    assert_eq!(result.status, TaskStatus::Timeout);
    assert_eq!(result.retries, 2);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(exec.get_performance_stats().retries, 2);
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_interrupts_retry_backoff() {
    let exec = AsyncExecutor::new(config(1));
    let mut events = exec.subscribe();
    exec.start().unwrap();

    let always_fail = Callable::from_fn(|_ctx: TaskContext| async move {
        Err::<(), _>(TaskError::fail("upstream unavailable"))
    });
    let cfg = TaskConfig::default().with_retries(1, Duration::from_secs(30), 1.0);
    let id = exec.submit_task("backing-off", always_fail, cfg).unwrap();

    loop {
        let ev = events.recv().await.unwrap();
        if ev.kind == EventKind::RetryScheduled {
            break;
        }
    }
    let started = Instant::now();
    assert!(exec.cancel_task(&id));
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();

    assert_eq!(result.status, TaskStatus::Cancelled);
    assert_eq!(result.retries, 1);
    assert!(started.elapsed() < Duration::from_secs(5));
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_level_rejects_without_blocking() {
    let mut cfg = config(1);
    cfg.queue_limits = QueueLimits::uniform(2);
    let exec = AsyncExecutor::new(cfg);

    for i in 0..2 {
        exec.submit_task(format!("t{i}"), sleeper(Duration::ZERO), TaskConfig::default())
            .unwrap();
    }
    let err = exec
        .submit_task("t2", sleeper(Duration::ZERO), TaskConfig::default())
        .unwrap_err();
    assert!(matches!(err, ExecutorError::QueueFull { capacity: 2, .. }));

    let urgent = TaskConfig::default().with_priority(TaskPriority::Urgent);
    exec.submit_task("t3", sleeper(Duration::ZERO), urgent).unwrap();

    let stats = exec.get_performance_stats();
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.rejected, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn queue_stats_track_depth() {
    let exec = AsyncExecutor::new(config(1));
    for i in 0..2 {
        let cfg = TaskConfig::default().with_priority(TaskPriority::Low);
        exec.submit_task(format!("low-{i}"), sleeper(Duration::ZERO), cfg).unwrap();
    }
    let cfg = TaskConfig::default().with_priority(TaskPriority::High);
    exec.submit_task("high", sleeper(Duration::ZERO), cfg).unwrap();

    let stats = exec.get_queue_stats();
    assert_eq!(stats.depth(TaskPriority::Low), 2);
    assert_eq!(stats.depth(TaskPriority::High), 1);
    assert_eq!(stats.depth(TaskPriority::Urgent), 0);
    assert_eq!(stats.total(), 3);

    exec.start().unwrap();
    exec.wait_for_batch(&["low-0", "low-1", "high"], WAIT, WaitMode::AllCompleted)
        .await
        .unwrap();
    assert_eq!(exec.get_queue_stats().total(), 0);
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_batches_bound_concurrency_and_keep_order() {
    let exec = AsyncExecutor::new(config(4));
    exec.start().unwrap();
    let live = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let (l, p) = (Arc::clone(&live), Arc::clone(&peak));
    let processor = move |chunk: Vec<u32>| {
        let (live, peak) = (Arc::clone(&l), Arc::clone(&p));
        async move {
            let now = live.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            live.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, TaskError>(chunk.into_iter().map(|n| n * 10).collect::<Vec<u32>>())
        }
    };

    let out = exec
        .process_parallel_batches((1..=100).collect(), processor, 10, 3)
        .await
        .unwrap();
    assert_eq!(out.len(), 100);
    assert_eq!(out, (1..=100).map(|n| n * 10).collect::<Vec<u32>>());
    assert!(peak.load(Ordering::SeqCst) <= 3);
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn batch_policies_handle_failed_chunks() {
    let exec = AsyncExecutor::new(config(2));
    exec.start().unwrap();
    let processor = |chunk: Vec<u32>| async move {
        if chunk.contains(&6) {
            return Err(TaskError::fatal("poisoned row 6"));
        }
        Ok(chunk)
    };

    let best = exec
        .process_batches_with((1..=20).collect(), processor, BatchOptions::new(5, 1))
        .await
        .unwrap();
    assert_eq!(best, (1..=5).chain(11..=20).collect::<Vec<u32>>());

    let opts = BatchOptions::new(5, 1)
        .with_policy(BatchPolicy::FailFast)
        .with_config(quick_retries(0));
    let err = exec
        .process_batches_with((1..=20).collect(), processor, opts)
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::BatchFailed { chunk: 1, .. }));
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn batches_need_a_running_executor() {
    let exec = AsyncExecutor::new(config(1));
    let err = exec
        .process_parallel_batches(vec![1u8], |c: Vec<u8>| async move { Ok::<_, TaskError>(c) }, 1, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::NotAccepting));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_a_pending_task() {
    let exec = AsyncExecutor::new(config(1));
    let id = exec
        .submit_task("queued", sleeper(Duration::ZERO), TaskConfig::default())
        .unwrap();
    assert_eq!(exec.task_status(&id), Some(TaskStatus::Pending));

    assert!(exec.cancel_task(&id));
    assert_eq!(exec.get_queue_stats().total(), 0);
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();
    assert_eq!(result.status, TaskStatus::Cancelled);
    assert_eq!(result.error, Some(TaskError::Canceled));

    assert!(!exec.cancel_task(&id));
    assert!(!exec.cancel_task("never-submitted"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wait_timeout_leaves_the_task_running() {
    let exec = AsyncExecutor::new(config(1));
    exec.start().unwrap();
    let id = exec
        .submit_task("long", sleeper(Duration::from_secs(30)), TaskConfig::default())
        .unwrap();

    let err = exec
        .wait_for_task(&id, Some(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::WaitTimeout { .. }));
    assert!(!exec.task_status(&id).unwrap().is_terminal());

    assert!(exec.cancel_task(&id));
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();
    assert_eq!(result.status, TaskStatus::Cancelled);
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicate_in_flight_ids_are_rejected() {
    let exec = AsyncExecutor::new(config(1));
    exec.submit_task("job", sleeper(Duration::ZERO), TaskConfig::default())
        .unwrap();
    let err = exec
        .submit_task("job", sleeper(Duration::ZERO), TaskConfig::default())
        .unwrap_err();
    assert!(matches!(err, ExecutorError::DuplicateTask { .. }));

    exec.start().unwrap();
    exec.wait_for_task("job", WAIT).await.unwrap();
    exec.submit_task("job", sleeper(Duration::ZERO), TaskConfig::default())
        .unwrap();
    assert!(exec.wait_for_task("job", WAIT).await.unwrap().is_successful());
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_completed_returns_early() {
    let exec = AsyncExecutor::new(config(2));
    exec.start().unwrap();
    let fast = exec
        .submit_task("fast", sleeper(Duration::from_millis(10)), TaskConfig::default())
        .unwrap();
    let slow = exec
        .submit_task("slow", sleeper(Duration::from_secs(30)), TaskConfig::default())
        .unwrap();

    let results = exec
        .wait_for_batch(&[&fast, &slow], WAIT, WaitMode::FirstCompleted)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].task_id, "fast");

    assert!(exec.cancel_task(&slow));
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panics_fail_the_task_not_the_worker() {
    let exec = AsyncExecutor::new(config(1));
    exec.start().unwrap();

    let boom = Callable::from_fn(|ctx: TaskContext| async move {
        if ctx.attempt() > 0 {
            panic!("index out of range");
        }
        Ok::<(), TaskError>(())
    });
    let id = exec.submit_task("boom", boom, quick_retries(3)).unwrap();
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();
    assert_eq!(result.status, TaskStatus::Failed);
    assert!(matches!(result.error, Some(TaskError::Panicked { .. })));

    let ok = Callable::from_fn(|_ctx: TaskContext| async { Ok::<_, TaskError>(7u8) });
    let id = exec.submit_task("after", ok, TaskConfig::default()).unwrap();
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();
    assert_eq!(result.value_as::<u8>(), Some(&7));
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_work_runs_on_the_thread_pool() {
    let exec = AsyncExecutor::new(config(2));
    exec.start().unwrap();

    let hash = Callable::blocking(|_ctx: TaskContext| {
        std::thread::sleep(Duration::from_millis(20));
        Ok::<_, TaskError>((1u64..=1000).sum::<u64>())
    });
    let cfg = TaskConfig::default().with_mode(ExecutionMode::ThreadPool);
    let id = exec.submit_task("sum", hash, cfg).unwrap();
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();
    assert_eq!(result.value_as::<u64>(), Some(&500_500));
    exec.stop().await.unwrap();
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn process_pool_runs_commands_only() {
    use taskforge::{CommandOutput, CommandSpec};

    let exec = AsyncExecutor::new(config(1));
    exec.start().unwrap();
    let cfg = TaskConfig::default().with_mode(ExecutionMode::ProcessPool);

    let echo = Callable::command(CommandSpec::new("echo").arg("hello"));
    let id = exec.submit_task("echo", echo, cfg.clone()).unwrap();
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();
    let out = result.value_as::<CommandOutput>().unwrap();
    assert_eq!(out.stdout.trim(), "hello");
    assert_eq!(out.code, Some(0));

    let err = exec
        .submit_task("closure", sleeper(Duration::ZERO), cfg)
        .unwrap_err();
    assert!(matches!(err, ExecutorError::UnsupportedMode { .. }));
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submissions_after_stop_are_rejected() {
    let exec = AsyncExecutor::new(config(1));
    exec.start().unwrap();
    exec.stop().await.unwrap();

    assert!(!exec.is_running());
    let err = exec
        .submit_task("late", sleeper(Duration::ZERO), TaskConfig::default())
        .unwrap_err();
    assert!(matches!(err, ExecutorError::NotAccepting));
    assert!(matches!(exec.start(), Err(ExecutorError::AlreadyStarted)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_cancels_queued_tasks() {
    let exec = AsyncExecutor::new(config(1));
    let id = exec
        .submit_task("never-started", sleeper(Duration::ZERO), TaskConfig::default())
        .unwrap();
    exec.stop().await.unwrap();

    let result = exec.wait_for_task(&id, WAIT).await.unwrap();
    assert_eq!(result.status, TaskStatus::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_reports_attempts_stuck_past_grace() {
    let mut cfg = config(1);
    cfg.grace = Duration::from_millis(50);
    let exec = AsyncExecutor::new(cfg);
    exec.start().unwrap();

    let stubborn = Callable::from_fn(|_ctx: TaskContext| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<(), TaskError>(())
    });
    let id = exec.submit_task("stubborn", stubborn, TaskConfig::default()).unwrap();
    while exec.task_status(&id) != Some(TaskStatus::Running) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    match exec.stop().await {
        Err(ExecutorError::GraceExceeded { stuck, .. }) => assert_eq!(stuck, vec!["stubborn".to_string()]),
        other => panic!("expected GraceExceeded, got {other:?}"),
    }
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();
    assert_eq!(result.status, TaskStatus::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_batch_is_all_or_nothing() {
    let mut cfg = config(1);
    cfg.queue_limits = QueueLimits::uniform(2);
    let exec = AsyncExecutor::new(cfg);

    let specs = (0..3)
        .map(|i| TaskSpec::new(format!("b{i}"), sleeper(Duration::ZERO)))
        .collect();
    let err = exec.submit_batch(specs).unwrap_err();
    assert!(matches!(err, ExecutorError::QueueFull { .. }));
    assert_eq!(exec.get_queue_stats().total(), 0);
    assert_eq!(exec.task_status("b0"), None);

    let specs = (0..2)
        .map(|i| TaskSpec::new(format!("b{i}"), sleeper(Duration::ZERO)))
        .collect();
    let ids = exec.submit_batch(specs).unwrap();
    assert_eq!(ids, vec!["b0", "b1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rate_limited_tasks_share_the_window() {
    let mut cfg = config(4);
    cfg.rate_limit = RateLimitConfig {
        max_calls: 5,
        window: Duration::from_millis(500),
    };
    let exec = AsyncExecutor::new(cfg);
    exec.start().unwrap();

    let started = Instant::now();
    let ids: Vec<String> = (0..6)
        .map(|i| {
            let cfg = TaskConfig::default().rate_limited(true);
            exec.submit_task(format!("call-{i}"), sleeper(Duration::ZERO), cfg)
                .unwrap()
        })
        .collect();
    let results = exec.wait_for_batch(&ids, WAIT, WaitMode::AllCompleted).await.unwrap();

    assert!(results.iter().all(|r| r.is_successful()));
    assert!(started.elapsed() >= Duration::from_millis(500));
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn retained_results_stay_until_pruned() {
    let mut cfg = config(1);
    cfg.retain_results = true;
    let exec = AsyncExecutor::new(cfg);
    exec.start().unwrap();

    let id = exec
        .submit_task("kept", sleeper(Duration::ZERO), TaskConfig::default().with_tag("report"))
        .unwrap();
    let result = exec.wait_for_task(&id, WAIT).await.unwrap();
    assert_eq!(result.tags, vec!["report".to_string()]);
    assert!(exec.try_result(&id).is_some());

    assert_eq!(exec.prune_results(), 1);
    assert!(exec.try_result(&id).is_none());
    exec.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unclaimed_results_are_bounded() {
    let mut cfg = config(1);
    cfg.max_retained_results = 2;
    let exec = AsyncExecutor::new(cfg);
    exec.start().unwrap();

    let ids: Vec<String> = (0..5)
        .map(|i| {
            exec.submit_task(format!("fire-{i}"), sleeper(Duration::ZERO), TaskConfig::default())
                .unwrap()
        })
        .collect();
    tokio::time::timeout(Duration::from_secs(5), async {
        while exec.get_performance_stats().completed < 5 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let kept: Vec<bool> = ids.iter().map(|id| exec.try_result(id).is_some()).collect();
    assert_eq!(kept, [false, false, false, true, true]);
    exec.stop().await.unwrap();
}

struct Forward(mpsc::UnboundedSender<EventKind>);

#[async_trait]
impl Subscribe for Forward {
    async fn on_event(&self, ev: &Event) {
        let _ = self.0.send(ev.kind);
    }
    fn name(&self) -> &'static str {
        "forward"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribers_are_flushed_when_the_executor_drops() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let exec = AsyncExecutor::builder(config(1))
        .with_subscriber(Arc::new(Forward(tx)))
        .build();
    exec.start().unwrap();

    let id = exec.submit_task("observed", sleeper(Duration::ZERO), TaskConfig::default()).unwrap();
    exec.wait_for_task(&id, WAIT).await.unwrap();
    exec.stop().await.unwrap();
    drop(exec);

    let mut seen = Vec::new();
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(kind) = rx.recv().await {
            seen.push(kind);
        }
    })
    .await;

    assert!(closed.is_ok(), "subscriber was never released");
    assert!(seen.contains(&EventKind::TaskCompleted));
    assert!(seen.contains(&EventKind::WorkerStopped));
}
