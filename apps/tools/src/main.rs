use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use coordinator::{Coordinator, CoordinatorConfig, PlantFilter, PlantOrder, PlantStore, WaterTarget};
use shared::domain::{PlantId, Variety};
use storage::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/garden.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plant a new seed, watered now.
    Plant {
        variety: Variety,
    },
    /// Water a plant by id, or the thirstiest live plant when no id is given.
    Water {
        plant_id: Option<String>,
    },
    /// Print the current garden snapshot as JSON.
    Refresh,
    /// List stored plants in planting order.
    List,
    Remove {
        plant_id: PlantId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Plant { variety } => {
            let plant_id = storage.plant(variety, Utc::now()).await?;
            println!("planted plant_id={plant_id} variety={variety}");
        }
        Command::Water { plant_id } => {
            let target = WaterTarget::parse(plant_id.as_deref())?;
            let coordinator = Coordinator::new(storage, CoordinatorConfig::default());
            let outcome = coordinator.water_plant(target, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Refresh => {
            let coordinator = Coordinator::new(storage, CoordinatorConfig::default());
            let snapshot = coordinator.refresh(Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::List => {
            let plants = storage.query(PlantFilter::All, PlantOrder::CreatedAsc).await?;
            if plants.is_empty() {
                println!("no plants");
            }
            for plant in plants {
                println!(
                    "{} {} planted={} watered={}",
                    plant.plant_id,
                    plant.variety,
                    plant.created_at.to_rfc3339(),
                    plant.last_watered_at.to_rfc3339()
                );
            }
        }
        Command::Remove { plant_id } => {
            if storage.remove_plant(plant_id).await? {
                println!("removed plant_id={plant_id}");
            } else {
                println!("no plant with plant_id={plant_id}");
            }
        }
    }

    Ok(())
}
