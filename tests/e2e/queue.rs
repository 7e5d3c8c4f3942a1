use std::sync::Arc;
use std::time::Duration;

use shellq::{
    Client, JobSpec, JobState, PoolOptions, RuntimeConfig, ShellExecutor, Store, WorkerPool,
};

use crate::utils;

#[tokio::test]
async fn enqueue_claim_and_complete() {
    let Some(url) = utils::postgres_url() else {
        return;
    };
    let local = "enqueue_claim_and_complete";
    utils::drop_schema(&url, local).await.unwrap();

    let c = Client::builder().schema(local).connect_to(&url).await.unwrap();
    c.enqueue(
        JobSpec::builder()
            .id("first")
            .command("echo from-postgres")
            .build(),
    )
    .await
    .unwrap();

    let pool = WorkerPool::with_options(
        c.store(),
        Arc::new(ShellExecutor),
        RuntimeConfig::default(),
        PoolOptions {
            poll_interval: Duration::from_millis(50),
            shutdown_timeout: Duration::from_secs(5),
        },
    );
    pool.start(2).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let job = c.get_job("first").await.unwrap().unwrap();
        if job.state == JobState::Completed {
            assert_eq!(job.output.as_deref(), Some("from-postgres"));
            assert_eq!(job.attempts, 1);
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "job never completed");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    pool.stop().await;
}

#[tokio::test]
async fn claim_respects_priority_and_fifo() {
    let Some(url) = utils::postgres_url() else {
        return;
    };
    let local = "claim_respects_priority_and_fifo";
    utils::drop_schema(&url, local).await.unwrap();

    let c = Client::builder().schema(local).connect_to(&url).await.unwrap();
    c.enqueue(JobSpec::builder().id("old-low").command("true").build())
        .await
        .unwrap();
    c.enqueue(
        JobSpec::builder()
            .id("new-high")
            .command("true")
            .priority(10)
            .build(),
    )
    .await
    .unwrap();
    c.enqueue(JobSpec::builder().id("new-low").command("true").build())
        .await
        .unwrap();

    let store = c.store();
    let first = store.claim_next().await.unwrap().unwrap();
    assert_eq!(first.id, "new-high");
    let second = store.claim_next().await.unwrap().unwrap();
    assert_eq!(second.id, "old-low");
    let third = store.claim_next().await.unwrap().unwrap();
    assert_eq!(third.id, "new-low");
    assert!(store.claim_next().await.unwrap().is_none());
}

#[tokio::test]
async fn dead_job_roundtrip() {
    let Some(url) = utils::postgres_url() else {
        return;
    };
    let local = "dead_job_roundtrip";
    utils::drop_schema(&url, local).await.unwrap();

    let c = Client::builder().schema(local).connect_to(&url).await.unwrap();
    c.enqueue(
        JobSpec::builder()
            .id("fragile")
            .command("exit 2")
            .max_retries(1)
            .build(),
    )
    .await
    .unwrap();

    let pool = WorkerPool::with_options(
        c.store(),
        Arc::new(ShellExecutor),
        RuntimeConfig::default(),
        PoolOptions {
            poll_interval: Duration::from_millis(50),
            shutdown_timeout: Duration::from_secs(5),
        },
    );
    pool.start(1).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let job = c.get_job("fragile").await.unwrap().unwrap();
        if job.state == JobState::Dead {
            assert_eq!(job.attempts, 1);
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "job never died");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    pool.stop().await;

    assert_eq!(c.dead_letter_jobs().await.unwrap().len(), 1);
    c.requeue_dead("fragile").await.unwrap();
    let job = c.get_job("fragile").await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Pending);
    assert_eq!(job.attempts, 0);
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let Some(url) = utils::postgres_url() else {
        return;
    };
    let local = "duplicate_ids_are_rejected";
    utils::drop_schema(&url, local).await.unwrap();

    let c = Client::builder().schema(local).connect_to(&url).await.unwrap();
    c.enqueue(JobSpec::builder().id("only").command("echo one").build())
        .await
        .unwrap();
    let err = c
        .enqueue(JobSpec::builder().id("only").command("echo two").build())
        .await
        .unwrap_err();
    assert!(matches!(err, shellq::Error::DuplicateId { .. }));

    let kept = c.get_job("only").await.unwrap().unwrap();
    assert_eq!(kept.command, "echo one");
}
