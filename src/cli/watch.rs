use anyhow::{Context, Result};
use ec2_running::core::settings::interval_from_millis;
use ec2_running::{Client, ClientConfig, Event, Settings};
use std::path::PathBuf;

pub async fn run(
    config: Option<PathBuf>,
    json: bool,
    once: bool,
    interval: Option<u64>,
) -> Result<()> {
    let settings = match config {
        Some(path) => Settings::load_from(&path)?,
        None => Settings::load()?,
    };
    settings.validate()?;

    let mut options = settings
        .options()
        .context("Invalid [query] section in config file")?;
    if let Some(millis) = interval {
        options.interval = Some(interval_from_millis(millis as f64)?);
    }
    if once {
        options.interval = None;
    }

    let client = Client::connect(options, ClientConfig::from(&settings))?;
    let mut events = client.events();
    tracing::info!(tags = client.tags().len(), region = ?client.region(), "Watching for running instances");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                print_event(&event, json)?;
                if once && matches!(event, Event::End(_)) {
                    break;
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Interrupted, stopping");
                client.stop();
                break;
            }
        }
    }

    Ok(())
}

fn print_event(event: &Event, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        Event::Start => println!("Polling started"),
        Event::Stop => println!("Polling stopped"),
        Event::Init(r) => tracing::debug!(request_id = r.request_id, "Query started"),
        Event::Data(data) => {
            println!(
                "[{}] {} running instance(s) at {}",
                data.request_id,
                data.instance_ids.len(),
                data.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            );
            for id in &data.instance_ids {
                println!("  {}", id);
            }
        }
        Event::Error(error) => match error.request_id {
            Some(request_id) => eprintln!(
                "[{}] {} ({})",
                request_id, error.message, error.cause
            ),
            None => eprintln!("{}", error.message),
        },
        Event::End(r) => println!("Query {} ended", r.request_id),
        Event::Pending { count } => tracing::debug!(count, "Pending requests"),
    }

    Ok(())
}
