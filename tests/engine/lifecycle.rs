use std::time::Duration;

use chrono::Utc;
use shellq::{JobSpec, JobState, Store};

use crate::utils;

#[tokio::test]
async fn failing_job_ends_in_the_dlq() {
    let (client, store) = utils::memory_client();
    client
        .enqueue(
            JobSpec::builder()
                .id("doomed")
                .command("echo giving up >&2; exit 1")
                .build(),
        )
        .await
        .unwrap();

    let pool = utils::fast_pool(store);
    pool.start(1).await;
    assert!(utils::wait_for_state(&client, "doomed", JobState::Dead).await);
    pool.stop().await;

    let job = client.get_job("doomed").await.unwrap().unwrap();
    assert_eq!(job.attempts, 3);
    let error = job.error.unwrap();
    assert!(error.contains("exited with status 1"), "got: {error}");
    assert!(error.contains("giving up"), "got: {error}");
}

#[tokio::test]
async fn job_recovers_on_the_third_attempt() {
    let (client, store) = utils::memory_client();
    let marker = utils::scratch_path("recovers");
    let command = format!(
        "n=$(cat {path} 2>/dev/null || echo 0); n=$((n+1)); printf %s \"$n\" > {path}; \
         if [ \"$n\" -ge 3 ]; then echo recovered; else exit 1; fi",
        path = marker.display()
    );
    client
        .enqueue(JobSpec::builder().id("flaky").command(command).build())
        .await
        .unwrap();

    let pool = utils::fast_pool(store);
    pool.start(1).await;
    assert!(utils::wait_for_state(&client, "flaky", JobState::Completed).await);
    pool.stop().await;

    let job = client.get_job("flaky").await.unwrap().unwrap();
    // two failed attempts plus the successful one
    assert_eq!(job.attempts, 3);
    assert_eq!(job.output.as_deref(), Some("recovered"));
    let _ = std::fs::remove_file(marker);
}

#[tokio::test]
async fn timed_out_job_is_annotated_distinctly() {
    let (client, store) = utils::memory_client();
    client
        .enqueue(
            JobSpec::builder()
                .id("slow")
                .command("sleep 30")
                .timeout(Duration::from_millis(100))
                .max_retries(1)
                .build(),
        )
        .await
        .unwrap();

    let pool = utils::fast_pool(store);
    pool.start(1).await;
    assert!(utils::wait_for_state(&client, "slow", JobState::Dead).await);
    pool.stop().await;

    let job = client.get_job("slow").await.unwrap().unwrap();
    let error = job.error.unwrap();
    assert!(error.contains("timed out after 100ms"), "got: {error}");
}

#[tokio::test]
async fn dead_job_requeues_and_becomes_claimable() {
    let (client, store) = utils::memory_client();
    client
        .enqueue(
            JobSpec::builder()
                .id("condemned")
                .command("exit 7")
                .max_retries(1)
                .build(),
        )
        .await
        .unwrap();

    let pool = utils::fast_pool(store.clone());
    pool.start(1).await;
    assert!(utils::wait_for_state(&client, "condemned", JobState::Dead).await);
    pool.stop().await;

    let before = Utc::now();
    client.requeue_dead("condemned").await.unwrap();

    let job = client.get_job("condemned").await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Pending);
    assert_eq!(job.attempts, 0);
    assert!(job.run_at <= Utc::now() && job.run_at >= before - chrono::Duration::seconds(1));

    // claimable right away
    let claimed = store.claim_next().await.unwrap().unwrap();
    assert_eq!(claimed.id, "condemned");
}

#[tokio::test]
async fn stop_waits_for_the_job_in_flight() {
    let (client, store) = utils::memory_client();
    client
        .enqueue(
            JobSpec::builder()
                .id("inflight")
                .command("sleep 0.4 && echo done")
                .build(),
        )
        .await
        .unwrap();

    let pool = utils::fast_pool(store);
    pool.start(1).await;
    assert!(utils::wait_for_state(&client, "inflight", JobState::Processing).await);

    // a stop request must let the running job finish and persist
    assert!(pool.stop().await);
    let job = client.get_job("inflight").await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Completed);
    assert_eq!(job.output.as_deref(), Some("done"));
}
