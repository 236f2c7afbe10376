//! Background monitor example.
//!
//! Starts the revalidation loop for a small module catalog, prints every
//! lifecycle notification and shows which modules are unlocked.
//!
//! # Running
//!
//! ```bash
//! export LICENSE_ENDPOINT="https://licenses.example.com"
//! export LICENSE_TOKEN="your-license-token"   # omit to start a demo
//! RUST_LOG=tierlock=debug cargo run --example monitor
//! ```

use std::sync::Arc;
use std::time::Duration;
use tierlock::{
    LicenseManager, LicenseObserver, LicenseRecord, ModuleCatalog, ModuleDescriptor, ModuleStatus,
    Monitor, Plan, TierlockConfig,
};
use tracing_subscriber::EnvFilter;

struct PrintObserver;

impl LicenseObserver for PrintObserver {
    fn on_valid(&self, record: &LicenseRecord) {
        println!("license valid: {} plan until {}", record.plan, record.expires_at);
    }

    fn on_warning(&self, message: &str) {
        println!("warning: {}", message);
    }

    fn on_blocked(&self, message: &str) {
        println!("blocked: {}", message);
    }

    fn on_module_changed(&self, module_id: &str, status: ModuleStatus) {
        println!("module {} is now {:?}", module_id, status);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tierlock=info")),
        )
        .init();

    let endpoint = std::env::var("LICENSE_ENDPOINT")
        .unwrap_or_else(|_| "https://licenses.example.com".to_string());

    let config = TierlockConfig {
        poll_interval: Duration::from_secs(30),
        ..TierlockConfig::new("tierlock-demo", endpoint)
    };
    let catalog = ModuleCatalog::new([
        ModuleDescriptor::new("inventory", Plan::Demo),
        ModuleDescriptor::new("billing", Plan::Full),
        ModuleDescriptor::new("analytics", Plan::Premium),
    ]);

    let manager = match LicenseManager::builder(config)
        .catalog(catalog)
        .observer(Arc::new(PrintObserver))
        .build()
    {
        Ok(m) => Arc::new(m),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    match std::env::var("LICENSE_TOKEN") {
        Ok(token) => {
            let activating = Arc::clone(&manager);
            let outcome = tokio::task::spawn_blocking(move || activating.activate(&token)).await;
            match outcome {
                Ok(Ok(outcome)) => println!("activation: {:?}", outcome),
                Ok(Err(e)) => eprintln!("activation failed: {}", e),
                Err(e) => eprintln!("activation task failed: {}", e),
            }
        }
        Err(_) => match manager.start_demo() {
            Ok(verdict) => println!("demo: {}", verdict.message),
            Err(e) => println!("demo not started: {}", e),
        },
    }

    let monitor = Monitor::start(Arc::clone(&manager));

    for _ in 0..3 {
        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = manager.snapshot();
        println!(
            "state={:?} offline={} verdict={:?}",
            snapshot.state, snapshot.offline, snapshot.verdict.action
        );
        for (module, status) in &snapshot.modules {
            println!("  {:<10} {:?}", module, status);
        }
    }

    monitor.stop().await;
}
