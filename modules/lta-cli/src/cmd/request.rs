use clap::Subcommand;
use lta_client::LtaClient;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum RequestCommand {
    /// List transfer requests, optionally filtered by source site or status.
    Ls {
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Submit a new transfer request.
    New {
        #[arg(long)]
        source: String,
        /// May be repeated for a fan-out to more than one destination site.
        #[arg(long = "dest", required = true)]
        dest: Vec<String>,
        #[arg(long)]
        path: String,
    },
    /// Show one transfer request and its bundles.
    Status { uuid: Uuid },
}

pub async fn run(client: &LtaClient, cmd: RequestCommand, json: bool) -> anyhow::Result<()> {
    match cmd {
        RequestCommand::Ls { source, status } => {
            let requests = client.list_transfer_requests(source.as_deref(), status.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&requests)?);
                return Ok(());
            }
            if requests.is_empty() {
                println!("no transfer requests found");
                return Ok(());
            }
            println!("{:<36}  {:<10}  {:<10}  {:<10}  PATH", "UUID", "SOURCE", "STATUS", "DEST");
            for r in &requests {
                println!(
                    "{:<36}  {:<10}  {:<10}  {:<10}  {}",
                    r.uuid,
                    r.source,
                    serde_json::to_value(r.status)?.as_str().unwrap_or("?"),
                    r.dest.join(","),
                    r.path
                );
            }
        }
        RequestCommand::New { source, dest, path } => {
            let uuid = client.create_transfer_request(&source, dest, &path).await?;
            if json {
                println!("{}", serde_json::json!({ "uuid": uuid }));
            } else {
                println!("created transfer request {uuid}");
            }
        }
        RequestCommand::Status { uuid } => {
            let bundles = client.list_bundles_for_request(uuid).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&bundles)?);
                return Ok(());
            }
            if bundles.is_empty() {
                println!("no bundles yet for request {uuid}");
                return Ok(());
            }
            println!("{:<36}  {:<10}  STATUS", "BUNDLE UUID", "DEST");
            for b in &bundles {
                println!(
                    "{:<36}  {:<10}  {}",
                    b.uuid,
                    b.dest,
                    serde_json::to_value(b.status)?.as_str().unwrap_or("?")
                );
            }
        }
    }
    Ok(())
}
