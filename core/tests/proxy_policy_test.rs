mod common;

use common::{ManualSource, Recorder, local_and_remote, sources};
use sourcerouter::prelude::*;

fn proxy(
    set: SourceSet<u32, u32>,
    policy: Policy,
    recorder: &Recorder<u32>,
) -> RequestProxy<u32, u32> {
    RequestProxy::new(set, policy, recorder.callback(), &RouterConfig::default()).unwrap()
}

#[test]
fn test_local_failure_falls_back_to_remote() {
    let (local, remote) = local_and_remote();
    let recorder = Recorder::new();
    let proxy = proxy(
        sources(&[&local, &remote]),
        Policy::LocalFirstThenRemote,
        &recorder,
    );

    proxy.request(7);
    assert_eq!(local.requests(), 1);
    assert_eq!(remote.requests(), 0);

    local.fail("not cached");
    assert_eq!(recorder.count(), 0, "Intermediate failures must be absorbed");
    assert_eq!(remote.requests(), 1);

    remote.succeed(42);
    assert_eq!(recorder.results(), vec![Ok(42)]);
    assert_eq!(proxy.statuses(), vec![StepStatus::Done, StepStatus::Done]);
    assert!(!proxy.is_busy());
}

#[test]
fn test_local_success_never_asks_remote() {
    let (local, remote) = local_and_remote();
    let recorder = Recorder::new();
    let proxy = proxy(
        sources(&[&local, &remote]),
        Policy::LocalFirstThenRemote,
        &recorder,
    );

    proxy.request(1);
    local.succeed(5);

    assert_eq!(recorder.results(), vec![Ok(5)]);
    assert_eq!(remote.requests(), 0);
    assert_eq!(proxy.statuses(), vec![StepStatus::Done, StepStatus::Done]);
}

#[test]
fn test_every_step_failing_delivers_last_message() {
    let (local, remote) = local_and_remote();
    let recorder = Recorder::new();
    let proxy = proxy(
        sources(&[&local, &remote]),
        Policy::LocalFirstThenRemote,
        &recorder,
    );

    proxy.request(1);
    local.fail("not cached");
    remote.fail("offline");

    assert_eq!(recorder.results(), vec![Err("offline".to_owned())]);
}

#[test]
fn test_remote_first_mirrors_local_first() {
    let (local, remote) = local_and_remote();
    let recorder = Recorder::new();
    let proxy = proxy(
        sources(&[&local, &remote]),
        Policy::RemoteFirstThenLocal,
        &recorder,
    );

    proxy.request(1);
    assert_eq!(remote.requests(), 1);
    assert_eq!(local.requests(), 0);

    remote.fail("offline");
    assert_eq!(local.requests(), 1);
    local.succeed(9);

    assert_eq!(recorder.results(), vec![Ok(9)]);
    assert_eq!(proxy.statuses(), vec![StepStatus::Done, StepStatus::Done]);
}

#[test]
fn test_single_source_policies() {
    for (policy, source) in [
        (Policy::OnlyRemote, SourceId::Remote),
        (Policy::OnlyLocal, SourceId::Local),
    ] {
        let task = ManualSource::new(source);
        let recorder = Recorder::new();
        let proxy = proxy(sources(&[&task]), policy, &recorder);

        proxy.request(3);
        task.fail("broken");
        assert_eq!(recorder.results(), vec![Err("broken".to_owned())]);

        proxy.request(3);
        task.succeed(4);
        assert_eq!(
            recorder.results(),
            vec![Err("broken".to_owned()), Ok(4)],
            "A finished card may be requested again"
        );
        assert_eq!(task.requests(), 2);
    }
}

#[test]
fn test_single_source_policy_ignores_the_other_source() {
    let (local, remote) = local_and_remote();
    let recorder = Recorder::new();
    let proxy = proxy(sources(&[&local, &remote]), Policy::OnlyRemote, &recorder);

    proxy.request(3);
    assert_eq!(local.requests(), 0);
    assert_eq!(remote.requests(), 1);
    assert_eq!(proxy.statuses(), vec![StepStatus::InFlight]);
}

#[test]
fn test_parallel_delivers_every_source() {
    let (local, remote) = local_and_remote();
    let recorder = Recorder::new();
    let proxy = proxy(sources(&[&local, &remote]), Policy::Parallel, &recorder);

    proxy.request(1);
    assert_eq!(local.requests(), 1);
    assert_eq!(remote.requests(), 1);
    assert_eq!(
        proxy.statuses(),
        vec![StepStatus::InFlight, StepStatus::InFlight]
    );

    remote.succeed(2);
    assert_eq!(recorder.results(), vec![Ok(2)]);
    assert_eq!(proxy.statuses(), vec![StepStatus::InFlight, StepStatus::Done]);

    local.fail("not cached");
    assert_eq!(
        recorder.results(),
        vec![Ok(2), Err("not cached".to_owned())]
    );
    assert_eq!(proxy.statuses(), vec![StepStatus::Done, StepStatus::Done]);
}

#[test]
fn test_parallel_with_one_source_delivers_once() {
    let remote = ManualSource::<u32, u32>::new(SourceId::Remote);
    let recorder = Recorder::new();
    let config = RouterConfig::builder().require_all_sources(false).build();
    let proxy = RequestProxy::new(
        sources(&[&remote]),
        Policy::Parallel,
        recorder.callback(),
        &config,
    )
    .unwrap();

    proxy.request(1);
    assert_eq!(proxy.statuses(), vec![StepStatus::Done, StepStatus::InFlight]);
    assert_eq!(recorder.count(), 0, "A missing parallel source never delivers");

    remote.succeed(8);
    assert_eq!(recorder.results(), vec![Ok(8)]);
}

#[test]
fn test_missing_step_fails_like_a_source() {
    let local = ManualSource::<u32, u32>::new(SourceId::Local);
    let recorder = Recorder::new();
    let config = RouterConfig::builder().require_all_sources(false).build();
    let proxy = RequestProxy::new(
        sources(&[&local]),
        Policy::LocalFirstThenRemote,
        recorder.callback(),
        &config,
    )
    .unwrap();

    proxy.request(1);
    local.fail("not cached");

    assert_eq!(recorder.results(), vec![Err("dispatch failed".to_owned())]);
    assert_eq!(proxy.statuses(), vec![StepStatus::Done, StepStatus::Done]);
}

#[test]
fn test_missing_first_step_moves_on() {
    let remote = ManualSource::<u32, u32>::new(SourceId::Remote);
    let recorder = Recorder::new();
    let config = RouterConfig::builder()
        .require_all_sources(false)
        .dispatch_failure_message("no task")
        .build();
    let proxy = RequestProxy::new(
        sources(&[&remote]),
        Policy::LocalFirstThenRemote,
        recorder.callback(),
        &config,
    )
    .unwrap();

    proxy.request(1);
    assert_eq!(remote.requests(), 1);
    assert_eq!(recorder.count(), 0);

    remote.fail("offline");
    assert_eq!(recorder.results(), vec![Err("offline".to_owned())]);
}

#[test]
fn test_inline_sources() {
    let local = ManualSource::<u32, u32>::inline(SourceId::Local, |_| Err("not cached".to_owned()));
    let remote = ManualSource::<u32, u32>::inline(SourceId::Remote, |card| Ok(card * 10));
    let recorder = Recorder::new();
    let proxy = proxy(
        sources(&[&local, &remote]),
        Policy::LocalFirstThenRemote,
        &recorder,
    );

    proxy.request(4);
    assert_eq!(recorder.results(), vec![Ok(40)]);

    proxy.request(5);
    assert_eq!(recorder.results(), vec![Ok(40), Ok(50)]);
    assert_eq!(local.requests(), 2);
    assert_eq!(remote.requests(), 2);
}

#[tokio::test]
async fn test_channel_callback() {
    let (local, remote) = local_and_remote::<u32, u32>();
    let (callback, mut results) = ChannelCallback::channel();
    let proxy = RequestProxy::new(
        sources(&[&local, &remote]),
        Policy::RemoteFirstThenLocal,
        callback,
        &RouterConfig::default(),
    )
    .unwrap();

    proxy.request(1);
    remote.succeed(11);

    assert_eq!(results.recv().await, Some(Ok(11)));
    assert!(results.try_recv().is_err());
}
