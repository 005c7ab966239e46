//! Concurrent initiation and ordering properties of the dispatcher.

use nodegate_dispatch::testing::MemoryHostPlatform;
use nodegate_dispatch::{WorkflowDispatcher, WorkflowFactoryRegistry};
use nodegate_types::{ParamSchema, RunId, WorkflowDescriptor};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

const WORKFLOW: &str = "com.example.Echo";

fn setup() -> (Arc<MemoryHostPlatform>, Arc<WorkflowDispatcher>) {
    let mut factories = WorkflowFactoryRegistry::new();
    factories
        .register_plain(WORKFLOW, ParamSchema::empty(), true)
        .unwrap();
    let host = Arc::new(MemoryHostPlatform::new());
    let dispatcher = Arc::new(WorkflowDispatcher::new(host.clone(), factories));
    (host, dispatcher)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_initiation_tracks_every_workflow() {
    const TASKS: usize = 8;
    const PER_TASK: usize = 25;

    let (host, dispatcher) = setup();

    let mut tasks = Vec::new();
    for _ in 0..TASKS {
        let dispatcher = dispatcher.clone();
        tasks.push(tokio::spawn(async move {
            let mut handles = Vec::new();
            for _ in 0..PER_TASK {
                let handle = dispatcher
                    .initiate(&WorkflowDescriptor::new(WORKFLOW).with_progress(true))
                    .await
                    .unwrap();
                handles.push(handle);
            }
            handles
        }));
    }

    let mut handles = Vec::new();
    for task in tasks {
        handles.extend(task.await.unwrap());
    }

    let run_ids: HashSet<RunId> = handles.iter().map(|h| h.run_id()).collect();
    assert_eq!(run_ids.len(), TASKS * PER_TASK);
    assert_eq!(dispatcher.active_count(), TASKS * PER_TASK);
    for run_id in &run_ids {
        assert!(dispatcher.lookup(run_id).is_some());
    }

    // finish them from several tasks at once
    let mut finishers = Vec::new();
    for chunk in handles.chunks(PER_TASK) {
        let host = host.clone();
        let ids: Vec<RunId> = chunk.iter().map(|h| h.run_id()).collect();
        finishers.push(tokio::spawn(async move {
            for id in ids {
                assert!(host.complete(id, Ok(json!(id.to_string()))));
            }
        }));
    }
    for finisher in finishers {
        finisher.await.unwrap();
    }

    for handle in &handles {
        assert_eq!(
            handle.outcome().await,
            Ok(json!(handle.run_id().to_string()))
        );
    }
    assert_eq!(dispatcher.active_count(), 0);
    assert!(dispatcher.active_run_ids().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A subscriber that joined before the first step sees every step, in order.
    #[test]
    fn prop_progress_preserves_emission_order(
        steps in prop::collection::vec("[A-Za-z ]{1,20}", 0..40)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let received = runtime.block_on(async {
            let (host, dispatcher) = setup();
            let handle = dispatcher
                .initiate(&WorkflowDescriptor::new(WORKFLOW).with_progress(true))
                .await
                .unwrap();
            let mut subscription = handle.progress();

            for step in &steps {
                host.emit(handle.run_id(), step.clone());
            }
            host.complete(handle.run_id(), Ok(json!(steps.len())));

            let mut received = Vec::new();
            while let Some(event) = subscription.next().await {
                received.push(event.step);
            }
            prop_assert_eq!(handle.outcome().await, Ok(json!(steps.len())));
            Ok(received)
        })?;

        prop_assert_eq!(received, steps);
    }

    /// Outcomes never cross between workflows, whatever order they finish in.
    #[test]
    fn prop_outcomes_route_to_their_own_handles(
        order in Just((0..12usize).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let (host, dispatcher) = setup();
            let mut handles = Vec::new();
            for _ in 0..order.len() {
                handles.push(
                    dispatcher
                        .initiate(&WorkflowDescriptor::new(WORKFLOW))
                        .await
                        .unwrap(),
                );
            }

            for &i in &order {
                host.complete(handles[i].run_id(), Ok(json!(i)));
            }
            for (i, handle) in handles.iter().enumerate() {
                prop_assert_eq!(handle.outcome().await, Ok(json!(i)));
            }
            prop_assert_eq!(dispatcher.active_count(), 0);
            Ok(())
        })?;
    }
}
