//! End-to-end lifecycle tests against the in-memory service.

use knob_engine::{CancellationToken, DesiredState, ReconcileError, Reconciler, ReconcilerConfig};
use knob_identity::{IdentityCodec, ResourcePathCodec, SettingRef, TrackedId};
use knob_remote::{MemoryRemote, MemoryRemoteConfig, RemoteClient, RemoteError};
use proptest::prelude::*;
use std::time::Duration;

fn shared_buffers() -> SettingRef {
    SettingRef::new("rg1", "server1", "shared_buffers")
}

fn reconciler_for(remote: &MemoryRemote) -> Reconciler<MemoryRemote> {
    Reconciler::new(
        remote.clone(),
        ReconcilerConfig::new().with_poll_interval(Duration::from_millis(1)),
    )
}

fn postgres_server() -> MemoryRemote {
    let remote = MemoryRemote::new(MemoryRemoteConfig::new().with_polls_to_complete(2));
    remote.seed_setting(&shared_buffers(), "128MB");
    remote.seed_setting(&SettingRef::new("rg1", "server1", "work_mem"), "4MB");
    remote
}

#[tokio::test]
async fn apply_read_reset_read() {
    let remote = postgres_server();
    let reconciler = reconciler_for(&remote);
    let cancel = CancellationToken::new();

    let desired = DesiredState {
        name: "shared_buffers".into(),
        scope_id: "rg1".into(),
        parent_name: "server1".into(),
        value: "512MB".into(),
    };

    let tracked = reconciler.apply(&desired, &cancel).await.unwrap();

    let state = reconciler.read(&tracked, &cancel).await.unwrap().unwrap();
    assert_eq!(state.value, "512MB");
    assert_eq!(state, desired);

    reconciler.reset_to_default(&tracked, &cancel).await.unwrap();

    let state = reconciler.read(&tracked, &cancel).await.unwrap().unwrap();
    assert_eq!(state.value, "128MB");
    assert_ne!(state.value, desired.value);
}

#[tokio::test]
async fn apply_is_idempotent() {
    let remote = postgres_server();
    let reconciler = reconciler_for(&remote);
    let cancel = CancellationToken::new();
    let desired = DesiredState::new(shared_buffers(), "256MB");

    let first = reconciler.apply(&desired, &cancel).await.unwrap();
    let second = reconciler.apply(&desired, &cancel).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(remote.value(&shared_buffers()).unwrap(), "256MB");
    assert_eq!(remote.completed_count(), 2);
}

#[tokio::test]
async fn operation_failure_mid_wait_leaves_value_unchanged() {
    let remote = postgres_server();
    let reconciler = reconciler_for(&remote);
    let cancel = CancellationToken::new();

    remote.fail_next_operation("server restarting");
    let err = reconciler
        .apply(&DesiredState::new(shared_buffers(), "512MB"), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_remote_operation());
    assert!(matches!(
        err.remote_source(),
        Some(RemoteError::OperationFailed { .. })
    ));

    let object = remote.get(&shared_buffers()).await.unwrap();
    assert_eq!(object.value, "128MB");
}

#[tokio::test]
async fn read_after_out_of_band_removal_is_absent() {
    let remote = postgres_server();
    let reconciler = reconciler_for(&remote);
    let cancel = CancellationToken::new();

    let tracked = reconciler
        .apply(&DesiredState::new(shared_buffers(), "512MB"), &cancel)
        .await
        .unwrap();
    assert!(remote.remove_server("rg1", "server1"));

    assert_eq!(reconciler.read(&tracked, &cancel).await.unwrap(), None);
}

#[tokio::test]
async fn reset_of_absent_setting_succeeds() {
    let remote = postgres_server();
    let reconciler = reconciler_for(&remote);
    let cancel = CancellationToken::new();

    let tracked = ResourcePathCodec::default()
        .encode(&SettingRef::new("rg1", "gone", "shared_buffers"))
        .unwrap();

    reconciler.reset_to_default(&tracked, &cancel).await.unwrap();
    assert_eq!(remote.submit_count(), 0);
}

#[tokio::test]
async fn reset_uses_default_read_at_reset_time() {
    let remote = postgres_server();
    let reconciler = reconciler_for(&remote);
    let cancel = CancellationToken::new();
    let work_mem = SettingRef::new("rg1", "server1", "work_mem");

    let tracked = reconciler
        .apply(&DesiredState::new(work_mem.clone(), "64MB"), &cancel)
        .await
        .unwrap();

    // The service changes its documented default after the apply.
    remote.seed_setting(&work_mem, "8MB");
    remote.set_value(&work_mem, "64MB");

    let reads_before = remote.get_count();
    reconciler.reset_to_default(&tracked, &cancel).await.unwrap();
    assert_eq!(remote.get_count(), reads_before + 1);
    assert_eq!(remote.value(&work_mem).unwrap(), "8MB");

    let state = reconciler.read(&tracked, &cancel).await.unwrap().unwrap();
    assert_eq!(state.value, "8MB");
}

#[tokio::test]
async fn malformed_identity_is_surfaced() {
    let remote = postgres_server();
    let reconciler = reconciler_for(&remote);
    let cancel = CancellationToken::new();
    let garbage = TrackedId::new("not/a/valid/identity/at/all/x");

    assert!(matches!(
        reconciler.read(&garbage, &cancel).await,
        Err(ReconcileError::Identity(_))
    ));
    assert!(matches!(
        reconciler.reset_to_default(&garbage, &cancel).await,
        Err(ReconcileError::Identity(_))
    ));
}

#[tokio::test]
async fn concurrent_applies_last_write_wins() {
    let remote = MemoryRemote::new(MemoryRemoteConfig::new().with_polls_to_complete(0));
    remote.seed_setting(&shared_buffers(), "128MB");
    let reconciler = reconciler_for(&remote);
    let cancel = CancellationToken::new();

    let a = DesiredState::new(shared_buffers(), "256MB");
    let b = DesiredState::new(shared_buffers(), "1GB");
    let (ra, rb) = tokio::join!(reconciler.apply(&a, &cancel), reconciler.apply(&b, &cancel));

    assert_eq!(ra.unwrap(), rb.unwrap());
    let value = remote.value(&shared_buffers()).unwrap();
    assert!(value == "256MB" || value == "1GB");
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9]{1,5}(kB|MB|GB)?").expect("Invalid regex")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn apply_then_read_round_trips(value in value_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let read_back = runtime.block_on(async {
            let remote = postgres_server();
            let reconciler = reconciler_for(&remote);
            let cancel = CancellationToken::new();

            let desired = DesiredState::new(shared_buffers(), value.clone());
            let tracked = reconciler.apply(&desired, &cancel).await.unwrap();
            reconciler.read(&tracked, &cancel).await.unwrap()
        });

        prop_assert_eq!(read_back.map(|state| state.value), Some(value));
    }
}
