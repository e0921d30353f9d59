// Example validating plugins of varying risk through the security gate
use gate_core::{DependencyRef, PluginId, PluginManifest, PluginSource, SecurityGateConfig};
use gate_security::{SecurityGate, StaticCodeSource};

fn main() {
    let gate = SecurityGate::new(SecurityGateConfig::default()).with_code_source(
        StaticCodeSource::new()
            .with_code("clean-widget", "function render(d) { return fmt(d); }")
            .with_code("shady-widget", "eval(remotePayload)"),
    );

    let mut shady = PluginManifest::new(
        PluginId::new("shady-widget"),
        "0.1.0",
        PluginSource::Unknown,
    );
    shady.permissions = vec!["network".to_string()];
    shady.dependencies = vec![DependencyRef::new("event-stream", "3.3.6")];

    let plugins = [
        PluginManifest::new(PluginId::new("clean-widget"), "1.2.0", PluginSource::Official),
        shady,
    ];

    for manifest in &plugins {
        let verdict = gate.validate_plugin(manifest);
        println!("=== {} ===", manifest.id);
        println!("approved: {}", verdict.approved);
        println!("risk: {} ({})", verdict.risk_score, verdict.risk_level);
        for issue in &verdict.issues {
            println!("  [{}] {}", issue.severity, issue.description);
        }
        if let Some(reason) = &verdict.reason {
            println!("rejected: {reason}");
        }
        println!();
    }

    println!("analyses performed: {}", gate.analysis_count());
}
