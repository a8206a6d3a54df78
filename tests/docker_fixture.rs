//! Fixtures against a real engine.
//!
//! These require a running Docker daemon and network access, and are marked
//! `#[ignore]`. Run with: `cargo test -- --ignored`

use fixtainer::{ContainerSpec, ContainerState, DockerCli, Reconciler, RuntimeDriver};

fn engine() -> DockerCli {
    fixtainer::docker::ensure_available("docker").expect("docker daemon not available");
    DockerCli::default()
}

#[test]
#[ignore]
fn start_mysql() {
    let spec = ContainerSpec::new("mysql:5.7", "papua_test")
        .publish("127.0.0.1", 33060, 3306)
        .env("MYSQL_USER", "user")
        .env("MYSQL_ROOT_PASSWORD", "pass")
        .env("MYSQL_DATABASE", "kurio_db");

    let mut fixture = Reconciler::new(spec, engine());
    fixture.start().expect("mysql should start");
    assert!(!fixture.handle().id().is_empty());

    let state = fixture.driver().status(fixture.spec()).unwrap();
    assert!(state.is_running(), "unexpected state: {state:?}");

    fixture.stop().expect("mysql should stop");
}

#[test]
#[ignore]
fn start_fluentd_twice_converges() {
    let spec = ContainerSpec::new("fluent/fluentd:v0.12.32", "charon_test").publish(
        "127.0.0.1",
        24224,
        24224,
    );

    let mut fixture = Reconciler::new(spec, engine());
    fixture.start().expect("first start");
    let id = fixture.handle().id().clone();

    fixture.start().expect("second start");
    assert_eq!(fixture.handle().id(), &id);

    fixture.stop().expect("stop");
    assert_eq!(
        fixture.refresh().unwrap(),
        ContainerState::Created(id.clone())
    );
}
