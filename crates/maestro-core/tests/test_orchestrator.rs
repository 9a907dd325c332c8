#![cfg(unix)]

use std::{collections::BTreeMap, time::Duration};

use maestro_core::{Error, Orchestrator, OrchestratorEvent, Status, UnixProcessManager};
use maestro_types::{Actor, Registry, ServiceDefinition};
use tokio::{sync::mpsc::Receiver, time::timeout};

fn service(name: &str, script: &str) -> ServiceDefinition {
    ServiceDefinition {
        name: name.to_owned(),
        cmd: vec!["sh".to_owned(), "-c".to_owned(), script.to_owned()],
        cwd: None,
        env: BTreeMap::new(),
    }
}

fn admin() -> Actor {
    Actor::new("u1", "Admin")
}

async fn wait_for(
    events: &mut Receiver<OrchestratorEvent>,
    pred: impl Fn(&OrchestratorEvent) -> bool,
) -> OrchestratorEvent {
    timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_studio_scenario() {
    let registry: Registry = vec![service("Studio", "exec sleep 30")].into_iter().collect();
    let (orchestrator, _events) = Orchestrator::new(registry, UnixProcessManager::new());

    let message = orchestrator
        .execute("start", "Studio", &admin())
        .await
        .unwrap();
    assert!(message.contains("Studio started by Admin"), "{message}");

    let err = orchestrator
        .execute("start", "Studio", &admin())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyRunning(_)));

    let message = orchestrator
        .execute("stop", "Studio", &admin())
        .await
        .unwrap();
    assert!(message.contains("Studio stopped by Admin"), "{message}");

    let err = orchestrator
        .execute("stop", "Studio", &admin())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotRunning(_)));
}

#[tokio::test]
async fn test_self_terminating_service_is_observed() {
    let registry: Registry = vec![service("Deploy", "echo building; exit 2")]
        .into_iter()
        .collect();
    let (orchestrator, mut events) = Orchestrator::new(registry, UnixProcessManager::new());

    orchestrator
        .execute("start", "Deploy", &admin())
        .await
        .unwrap();

    // Output and exit notifications travel on different tasks, so collect
    // until both have been seen.
    let mut seen = Vec::new();
    while !(seen.iter().any(|e| matches!(e, OrchestratorEvent::Log { .. }))
        && seen.iter().any(|e| matches!(e, OrchestratorEvent::Exited { .. })))
    {
        seen.push(
            wait_for(&mut events, |e| {
                matches!(
                    e,
                    OrchestratorEvent::Log { .. } | OrchestratorEvent::Exited { .. }
                )
            })
            .await,
        );
    }

    assert!(seen.contains(&OrchestratorEvent::Log {
        service: "Deploy".to_owned(),
        message: "building\n".to_owned(),
    }));
    assert!(seen.contains(&OrchestratorEvent::Exited {
        service: "Deploy".to_owned(),
        code: Some(2),
    }));

    let status = orchestrator.status().await.unwrap();
    assert_eq!(status[0].status, Status::Stopped);

    let err = orchestrator
        .execute("stop", "Deploy", &admin())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotRunning(_)));
}

#[tokio::test]
async fn test_restart_replaces_process() {
    let registry: Registry = vec![service("Dashboard", "exec sleep 30")]
        .into_iter()
        .collect();
    let (orchestrator, _events) = Orchestrator::new(registry, UnixProcessManager::new());

    orchestrator
        .execute("start", "Dashboard", &admin())
        .await
        .unwrap();
    let before = orchestrator.status().await.unwrap()[0].pid;

    let message = orchestrator
        .execute("restart", "Dashboard", &admin())
        .await
        .unwrap();
    assert!(message.contains("Dashboard restarted by Admin"), "{message}");

    // Give the old process time to die; its exit must not clear the new one.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let status = orchestrator.status().await.unwrap();
    assert_eq!(status[0].status, Status::Running);
    assert!(before.is_some());
    assert_ne!(status[0].pid, before);

    orchestrator
        .execute("stop", "Dashboard", &admin())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_spawn_failure_is_reported() {
    let registry: Registry = vec![ServiceDefinition {
        name: "Broken".to_owned(),
        cmd: vec!["./no-such-dev-server".to_owned()],
        cwd: None,
        env: BTreeMap::new(),
    }]
    .into_iter()
    .collect();
    let (orchestrator, _events) = Orchestrator::new(registry, UnixProcessManager::new());

    let err = orchestrator
        .execute("start", "Broken", &admin())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Spawn { .. }));
    assert!(err.to_string().starts_with("cannot start service `Broken`"));
}
