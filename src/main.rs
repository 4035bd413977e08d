use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use group_scheduler::display::{format_staff_name, print_recommendation, render_capacity, write_recommendation_to_file};
use group_scheduler::form::{export_booking_to_csv, validate_service_duration, GroupBookingSubmission};
use group_scheduler::parser::{load_appointments, load_staff};
use group_scheduler::schedule::{
    check_group_capacity, check_staff_availability, get_scheduling_recommendation, schedule_and_book, Strategy,
};
use group_scheduler::{Config, InMemoryRepository};

#[derive(Parser)]
#[command(name = "group-scheduler")]
#[command(about = "Group appointment scheduling for salon staff")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Staff roster CSV (id,name,specialty,active)
    #[arg(long, global = true, default_value = "data/staff.csv")]
    staff: PathBuf,

    /// Existing appointments CSV (id,staff_id,date,time,service_duration,status)
    #[arg(long, global = true)]
    appointments: Option<PathBuf>,

    /// JSON config file (port, admin_password, policy); env vars still override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(clap::Args, Clone)]
struct GroupArgs {
    /// Date (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,
    /// Requested start time (HH:MM)
    #[arg(long)]
    time: String,
    /// Number of guests
    #[arg(long)]
    party: usize,
    /// Minutes per guest
    #[arg(long, default_value = "60")]
    duration: u32,
    /// parallel, staggered or sequential
    #[arg(long)]
    strategy: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Web {
        #[arg(long, env = "PORT")]
        port: Option<u16>,
        /// Append committed bookings to this CSV
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Show which staff are free for a window
    Availability {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        time: String,
        #[arg(long, default_value = "60")]
        duration: u32,
    },
    /// Recommend how to schedule a group
    Recommend {
        #[command(flatten)]
        group: GroupArgs,
        /// Also write the plan to this file
        #[arg(long)]
        out: Option<String>,
    },
    /// Check whether the group fits at the requested time
    Capacity {
        #[command(flatten)]
        group: GroupArgs,
    },
    /// Recommend and book the group, appending the bookings to a CSV
    Book {
        #[command(flatten)]
        group: GroupArgs,
        #[arg(long, default_value = "bookings.csv")]
        export: PathBuf,
    },
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    match s.to_lowercase().as_str() {
        "parallel" => Ok(Strategy::Parallel),
        "staggered" => Ok(Strategy::Staggered),
        "sequential" => Ok(Strategy::Sequential),
        other => Err(format!("Unknown strategy: {}", other)),
    }
}

impl GroupArgs {
    fn submission(&self) -> Result<GroupBookingSubmission, String> {
        let preferred_strategy = self.strategy.as_deref().map(parse_strategy).transpose()?;
        Ok(GroupBookingSubmission {
            date: self.date,
            start_time: self.time.clone(),
            party_size: self.party,
            service_duration: self.duration,
            preferred_strategy,
        })
    }
}

fn load_repository(cli: &Cli, config: &Config) -> Result<InMemoryRepository, Box<dyn std::error::Error>> {
    let roster = if cli.staff.exists() {
        load_staff(&cli.staff)?
    } else {
        info!(path = %cli.staff.display(), "No staff roster found, starting empty");
        Vec::new()
    };
    let appointments = match &cli.appointments {
        Some(path) => load_appointments(path)?,
        None => Vec::new(),
    };

    println!("Loaded {} staff and {} appointments", roster.len(), appointments.len());
    Ok(InMemoryRepository::with_data(roster, appointments)
        .with_default_service_duration(config.policy.default_service_duration))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env(),
    };
    let repo = load_repository(&cli, &config)?;

    match &cli.command {
        Commands::Web { port, export } => {
            if let Some(port) = port {
                config.port = *port;
            }
            println!("Starting web server on port {}...", config.port);
            println!("Access the API at http://localhost:{}/api", config.port);
            group_scheduler::web::start_server(config, Arc::new(repo), export.clone()).await?;
        }

        Commands::Availability { date, time, duration } => {
            validate_service_duration(*duration)?;
            let staff = check_staff_availability(&repo, *date, time, *duration, &config.policy).await?;
            println!("\n=== Staff availability {} {} ({} min) ===", date, time, duration);
            for entry in staff {
                let label = format_staff_name(&entry.staff.name, entry.staff.specialty.as_deref());
                let status = if entry.available { "available" } else { "busy" };
                println!("  {} -> {}", label, status);
            }
        }

        Commands::Recommend { group, out } => {
            let request = group.submission()?.into_request()?;
            let rec = get_scheduling_recommendation(&repo, &request, &config.policy).await?;
            let title = format!("Group of {} on {} at {}", request.party_size, request.date, request.start_time);
            print_recommendation(&title, &rec);
            if let Some(out) = out {
                write_recommendation_to_file(&title, &rec, out)?;
                println!("Plan saved to: {}", out);
            }
        }

        Commands::Capacity { group } => {
            let request = group.submission()?.into_request()?;
            let check = check_group_capacity(
                &repo,
                request.date,
                &request.start_time,
                request.party_size,
                request.service_duration,
                &config.policy,
            )
            .await?;
            println!("\n{}", render_capacity(&check));
        }

        Commands::Book { group, export } => {
            let request = group.submission()?.into_request()?;
            let booking = schedule_and_book(&repo, &request, &config.policy).await?;
            let title = format!("Booked group of {} on {}", request.party_size, request.date);
            print_recommendation(&title, &booking.recommendation);

            let written = export_booking_to_csv(&booking, export)?;
            println!("{} appointments written to {}", written, export.display());
        }
    }

    Ok(())
}
