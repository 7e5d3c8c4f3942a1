use shellq::{ConfigUpsert, Error, JobSpec, JobState};

use crate::utils;

#[tokio::test]
async fn duplicate_id_is_rejected_and_original_kept() {
    let (client, _store) = utils::memory_client();
    client
        .enqueue(
            JobSpec::builder()
                .id("nightly")
                .command("echo original")
                .build(),
        )
        .await
        .unwrap();

    let err = client
        .enqueue(
            JobSpec::builder()
                .id("nightly")
                .command("echo impostor")
                .build(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateId { id } if id == "nightly"));

    let kept = client.get_job("nightly").await.unwrap().unwrap();
    assert_eq!(kept.command, "echo original");
}

#[tokio::test]
async fn specs_without_id_or_command_are_rejected() {
    let (client, _store) = utils::memory_client();

    let err = client
        .enqueue(JobSpec::builder().command("true").build())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSpec { .. }));

    let err = client
        .enqueue(JobSpec::builder().id("empty").command("  ").build())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSpec { .. }));

    assert!(client.list_jobs(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn requeue_of_non_dead_job_is_not_found() {
    let (client, _store) = utils::memory_client();
    client
        .enqueue(JobSpec::builder().id("alive").command("true").build())
        .await
        .unwrap();

    let err = client.requeue_dead("alive").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    let err = client.requeue_dead("missing").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    // untouched
    let job = client.get_job("alive").await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Pending);
}

#[tokio::test]
async fn job_log_returns_last_capture() {
    let (client, store) = utils::memory_client();
    client
        .enqueue(
            JobSpec::builder()
                .id("chatty")
                .command("echo out; echo err >&2")
                .build(),
        )
        .await
        .unwrap();

    let pool = utils::fast_pool(store);
    pool.start(1).await;
    assert!(utils::wait_for_state(&client, "chatty", JobState::Completed).await);
    pool.stop().await;

    let log = client.job_log("chatty").await.unwrap();
    assert_eq!(log.output.as_deref(), Some("out"));
    assert_eq!(log.error.as_deref(), Some("err"));

    let err = client.job_log("missing").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn status_reports_counts_and_pool_liveness() {
    let (client, store) = utils::memory_client();
    client
        .enqueue(JobSpec::builder().id("one").command("true").build())
        .await
        .unwrap();
    client
        .enqueue(JobSpec::builder().id("two").command("true").build())
        .await
        .unwrap();

    let status = client.status().await.unwrap();
    assert_eq!(status.counts.pending, 2);
    assert_eq!(status.counts.total(), 2);
    assert!(status.pool.is_none());

    let pool = utils::fast_pool(store);
    pool.start(2).await;
    let status = client.status().await.unwrap();
    let info = status.pool.expect("liveness recorded");
    assert!(info.running);
    assert_eq!(info.workers, 2);

    pool.stop().await;
    let status = client.status().await.unwrap();
    assert!(!status.pool.expect("liveness recorded").running);
}

#[tokio::test]
async fn config_set_distinguishes_insert_from_update() {
    let (client, _store) = utils::memory_client();
    assert_eq!(
        client.set_config("max_retries", "5").await.unwrap(),
        ConfigUpsert::Inserted
    );
    assert_eq!(
        client.set_config("max_retries", "7").await.unwrap(),
        ConfigUpsert::Updated
    );
    assert_eq!(
        client.get_config("max_retries").await.unwrap().as_deref(),
        Some("7")
    );
}
