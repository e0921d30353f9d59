// Example walking through admission, queueing, and drain order
use gate_admission::AdmissionController;
use gate_core::{AdmissionConfig, ExecutionOutcome, FunctionName, PluginId, Priority};

fn main() {
    let config = AdmissionConfig::builder()
        .max_concurrent_executions(2)
        .build();
    let controller = AdmissionController::new(config);

    println!("=== Requesting three executions (2 slots) ===");
    let mut tickets = Vec::new();
    for (plugin, priority) in [
        ("chart-widget", Priority::Normal),
        ("data-export", Priority::Normal),
        ("report-runner", Priority::High),
    ] {
        let ticket = controller.request_execution(
            PluginId::new(plugin),
            FunctionName::new("run"),
            priority,
        );
        println!(
            "{plugin}: granted={} reason={:?}",
            ticket.granted, ticket.reason
        );
        tickets.push(ticket);
    }

    println!("\n=== Releasing the first execution ===");
    if let Err(err) = controller.release_execution(&tickets[0].execution_id, ExecutionOutcome::Success)
    {
        println!("release failed: {err}");
    }

    let stats = controller.stats();
    println!("active: {}", stats.current.active);
    println!("queued: {}", stats.current.queued);
    println!("total started: {}", stats.metrics.executions.total);
}
