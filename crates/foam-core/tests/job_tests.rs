//! End-to-end generation runs through the job manager.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockBackend, balanced_histogram, generator};
use foam_adapter_sim::SimulatorBackend;
use foam_core::{Config, Error, ExecutionEngine, JobManager, JobStatus, KeyGenerator};
use foam_extract::CertificatePolicy;
use foam_hal::{BasisSet, PollPolicy};

fn patient() -> PollPolicy {
    PollPolicy::new(Duration::from_millis(50), 200)
}

fn is_lower_hex(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

#[tokio::test(start_paused = true)]
async fn test_balanced_run_completes() {
    let backend = Arc::new(MockBackend::new(balanced_histogram()));
    let manager = JobManager::new(Arc::new(generator(backend, 256)));

    let id = manager.create_job().await;
    let job = manager.wait_for(&id, patient()).await.unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.error.is_none());

    let result = job.result.unwrap();
    assert_eq!(result.key_hex.len(), 64);
    assert!(is_lower_hex(&result.key_hex));
    assert_eq!(result.extracted_bit_count, 256);
    assert_eq!(result.raw_bit_count, 900);
    assert_eq!(result.surviving_bases, 9);
    assert!(result.failed_bases.is_empty());
    assert_eq!(result.shots_per_basis, 50);
    assert!(result.foam_strength.abs() < 1e-9);
    assert!((0.0..=1.0).contains(&result.randomness_score));
    assert!(result.extraction_ratio <= 0.5);
    assert_eq!(result.hash_fallback, result.whitening.is_fallback());
    assert!(result.certificate.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stuck_basis_is_dropped() {
    let backend = Arc::new(MockBackend::new(balanced_histogram()).stuck("YY"));
    let generator = generator(backend, 256);

    let result = generator.generate().await.unwrap();

    assert_eq!(result.key_hex.len(), 64);
    assert_eq!(result.surviving_bases, 8);
    assert_eq!(result.raw_bit_count, 800);
    assert_eq!(result.failed_bases.len(), 1);
    assert_eq!(result.failed_bases[0].label, "YY");
    assert!(result.failed_bases[0].error.contains("not ready"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_submission_still_completes_job() {
    let backend = Arc::new(MockBackend::new(balanced_histogram()).failing("XY"));
    let manager = JobManager::new(Arc::new(generator(backend.clone(), 256)));

    let id = manager.create_job().await;
    let job = manager.wait_for(&id, patient()).await.unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.error.is_none());
    assert_eq!(backend.submissions(), 9);

    let result = job.result.unwrap();
    assert_eq!(result.key_hex.len(), 64);
    assert!(is_lower_hex(&result.key_hex));
    assert_eq!(result.surviving_bases, 8);
    assert_eq!(result.raw_bit_count, 800);
    assert_eq!(result.failed_bases.len(), 1);
    assert_eq!(result.failed_bases[0].label, "XY");
    assert!(result.failed_bases[0].error.contains("rejected"));
}

#[tokio::test(start_paused = true)]
async fn test_all_bases_failing_fails_job() {
    let mut backend = MockBackend::new(balanced_histogram());
    for basis in &BasisSet::standard() {
        backend = backend.failing(basis.label());
    }
    let manager = JobManager::new(Arc::new(generator(Arc::new(backend), 256)));

    let id = manager.create_job().await;
    let job = manager.wait_for(&id, patient()).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.result.is_none());
    assert!(job.error.unwrap().starts_with("Insufficient entropy"));
}

#[tokio::test]
async fn test_too_few_raw_bits() {
    let backend = Arc::new(MockBackend::new(balanced_histogram()));
    let generator = generator(backend, 1024);

    match generator.generate().await {
        Err(Error::InsufficientEntropy {
            surviving_bases,
            raw_bits,
            required_bits,
        }) => {
            assert_eq!(surviving_bases, 9);
            assert_eq!(raw_bits, 900);
            assert_eq!(required_bits, 2048);
        }
        other => panic!("expected insufficient entropy, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_panicking_backend_fails_job() {
    let backend = Arc::new(MockBackend::new(balanced_histogram()).panicking());
    let manager = JobManager::new(Arc::new(generator(backend, 256)));

    let id = manager.create_job().await;
    let job = manager.wait_for(&id, patient()).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    let message = job.error.unwrap();
    assert!(message.contains("panicked"), "{message}");
    assert!(message.contains("mock backend crashed"), "{message}");
}

#[tokio::test(start_paused = true)]
async fn test_create_job_returns_before_run() {
    let mut backend = MockBackend::new(balanced_histogram());
    for basis in &BasisSet::standard() {
        backend = backend.with_latency(basis.label(), Duration::from_secs(2));
    }
    let manager = JobManager::new(Arc::new(generator(Arc::new(backend), 256)));

    let id = manager.create_job().await;
    let job = manager.get_job(&id).await.unwrap();
    assert!(!job.status.is_terminal());
    assert!(job.result.is_none());
    assert_eq!(manager.active_tasks(), 1);

    let job = manager.wait_for(&id, patient()).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.updated_at >= job.created_at);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_gives_up_with_snapshot() {
    let mut backend = MockBackend::new(balanced_histogram());
    for basis in &BasisSet::standard() {
        backend = backend.with_latency(basis.label(), Duration::from_secs(60));
    }
    let manager = JobManager::new(Arc::new(generator(Arc::new(backend), 256)));

    let id = manager.create_job().await;
    let job = manager
        .wait_for(&id, PollPolicy::new(Duration::from_millis(10), 3))
        .await
        .unwrap();
    assert!(!job.status.is_terminal());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_jobs() {
    let backend = Arc::new(MockBackend::new(balanced_histogram()));
    let manager = JobManager::new(Arc::new(generator(backend, 256)));

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(manager.create_job().await);
    }
    manager.shutdown().await;

    assert_eq!(manager.active_tasks(), 0);
    assert_eq!(manager.store().len().await, 3);
    for id in &ids {
        let job = manager.get_job(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }
}

#[tokio::test]
async fn test_job_runs_only_once() {
    let backend = Arc::new(MockBackend::new(balanced_histogram()));
    let manager = JobManager::new(Arc::new(generator(backend, 256)));

    let id = manager.store().insert_pending().await;
    manager.run_job(&id).await.unwrap();
    assert_eq!(
        manager.get_job(&id).await.unwrap().status,
        JobStatus::Completed
    );

    assert!(matches!(
        manager.run_job(&id).await,
        Err(Error::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_unknown_job() {
    let backend = Arc::new(MockBackend::new(balanced_histogram()));
    let manager = JobManager::new(Arc::new(generator(backend, 256)));

    assert!(matches!(
        manager.get_job(&"missing".into()).await,
        Err(Error::JobNotFound(_))
    ));
}

#[tokio::test]
async fn test_simulator_run_with_certificate() {
    let mut config = Config::default();
    config.generator.issue_certificate = true;

    let engine = ExecutionEngine::new(Arc::new(SimulatorBackend::new()), config.engine_config());
    let generator = KeyGenerator::new(engine, config.generator_config("simulator")).unwrap();

    let result = generator.generate().await.unwrap();
    assert_eq!(result.key_hex.len(), 64);
    assert_eq!(result.surviving_bases, 9);
    assert!(result.foam_strength > 0.1);

    let certificate = result.certificate.as_ref().unwrap();
    assert_eq!(certificate.n_bases, 9);
    assert_eq!(certificate.device, "simulator");
    assert_eq!(certificate.theta_deg, Some(config.backend.theta_deg));
    assert!(certificate.verify(&CertificatePolicy::default()).is_ok());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["key_hex"].as_str().unwrap().len(), 64);
    assert!(json["certificate"]["fingerprint"].is_string());
    assert_eq!(json["certificate"]["theta_deg"].as_f64(), Some(45.0));
}
