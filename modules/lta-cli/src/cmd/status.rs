use lta_client::LtaClient;

/// `lta status [component]`: the fleet-wide heartbeat overview, or one
/// component's detail when a name is given. Mirrors the shape
/// `/status`/`/status/{component}` actually return — a component's own
/// JSON carries `component`/`timestamp`/`counters`, not a per-component
/// health verdict; that verdict is only computed fleet-wide.
pub async fn run(client: &LtaClient, component: Option<String>, json: bool) -> anyhow::Result<()> {
    match component {
        Some(name) => {
            let status = client.get_status(&name).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status_line(&status);
            }
        }
        None => {
            let overview = client.status_overview().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
                return Ok(());
            }
            let health = overview.get("health").and_then(|v| v.as_str()).unwrap_or("unknown");
            println!("fleet health: {health}");
            let components = overview.get("components").and_then(|v| v.as_array()).cloned().unwrap_or_default();
            if components.is_empty() {
                println!("no components have reported a heartbeat yet");
                return Ok(());
            }
            for entry in &components {
                print_status_line(entry);
            }
        }
    }
    Ok(())
}

fn print_status_line(status: &serde_json::Value) {
    let name = status.get("component").and_then(|v| v.as_str()).unwrap_or("?");
    let timestamp = status.get("timestamp").and_then(|v| v.as_str()).unwrap_or("?");
    let counters = status.get("counters").cloned().unwrap_or_default();
    println!("{name:<20}  last heartbeat {timestamp}  counters {counters}");
}
