use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use taskgraph::graph::action::FnAction;
use taskgraph::{Action, Graph, NodeId, Pool, Scheduler};
use tokio_util::sync::CancellationToken;

fn step(label: &'static str) -> Arc<dyn Action> {
    Arc::new(FnAction::new(move |_cancel| {
        Box::pin(async move {
            println!("  running '{label}'");
            Ok(())
        }) as Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
    }))
}

fn failing_step(label: &'static str) -> Arc<dyn Action> {
    Arc::new(FnAction::new(move |_cancel| {
        Box::pin(async move {
            println!("  running '{label}' (will fail)");
            Err(anyhow::anyhow!("{label} blew up"))
        }) as Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
    }))
}

fn print_outcomes(graph: &Graph, labels: &[(&str, NodeId)]) {
    for (label, id) in labels {
        let node = graph.get(*id).unwrap();
        let failure = node
            .failure()
            .map(|e| format!(" ({e})"))
            .unwrap_or_default();
        println!("  {label}: {:?}{failure}", node.state());
    }
}

/// Demo showing a diamond dependency (fetch -> [transform, validate] -> publish) with
/// a named pool bounding the transform/validate fan-out to 1 concurrent run.
async fn run_diamond_demo() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Diamond dependency, bounded pool ===\n");

    let graph = Graph::new();
    let cpu_bound = Pool::new(1);

    let fetch = graph.add_node(10, Pool::default_pool(), step("fetch"));
    let transform = graph.add_node(5, cpu_bound.clone(), step("transform"));
    let validate = graph.add_node(8, cpu_bound, step("validate"));
    let publish = graph.add_node(0, Pool::default_pool(), step("publish"));

    graph.add_predecessor(transform, fetch)?;
    graph.add_predecessor(validate, fetch)?;
    graph.add_predecessor(publish, transform)?;
    graph.add_predecessor(publish, validate)?;

    Scheduler::execute(&graph, 4, false, CancellationToken::new()).await?;

    println!("\nOutcomes:");
    print_outcomes(
        &graph,
        &[
            ("fetch", fetch),
            ("transform", transform),
            ("validate", validate),
            ("publish", publish),
        ],
    );

    Ok(())
}

/// Demo showing failure propagation: a chain where the middle step fails, skipping
/// everything downstream while an unrelated node still completes normally.
async fn run_failure_propagation_demo() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Failure propagation ===\n");

    let graph = Graph::new();
    let ingest = graph.add_node(0, Pool::default_pool(), step("ingest"));
    let enrich = graph.add_node(0, Pool::default_pool(), failing_step("enrich"));
    let store = graph.add_node(0, Pool::default_pool(), step("store"));
    let metrics = graph.add_node(0, Pool::default_pool(), step("metrics"));

    graph.add_predecessor(enrich, ingest)?;
    graph.add_predecessor(store, enrich)?;

    Scheduler::execute(&graph, 4, false, CancellationToken::new()).await?;

    println!("\nOutcomes:");
    print_outcomes(
        &graph,
        &[
            ("ingest", ingest),
            ("enrich", enrich),
            ("store", store),
            ("metrics (unrelated)", metrics),
        ],
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    run_diamond_demo().await?;
    run_failure_propagation_demo().await?;
    println!("\nDemo completed successfully!");
    Ok(())
}
