use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use procure_flow::{
    AnalysisOutcome, AuthOutcome, ChatAssistant, ClientConfig, GuardDecision, ProcurementReport,
    ProcurementSession, RegisterRequest, StoreConfig, View,
    telemetry::init_tracing,
    view::{GanttLayout, budget_rows, format_inr, material_cost_shares, vendors_by_material, vendors_for},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const GANTT_WIDTH: f64 = 60.0;

#[derive(Parser, Debug)]
#[command(name = "procure", about = "Construction procurement assistant", version)]
struct Cli {
    /// Backend base URL, overrides config and PROCURE_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory for the persisted session
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the user
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        project_type: String,
    },
    /// Forget the user and the stored report
    Logout,
    /// Describe a project and fetch a procurement report
    Analyze { query: Vec<String> },
    Budget,
    Materials,
    Schedule,
    /// Recommended vendors, optionally for one material
    Vendors { material: Option<String> },
    /// Live vendor search for one material
    SearchVendors {
        material: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// Send a chat message
    Chat { message: Vec<String> },
    /// List saved conversations
    Conversations,
    Health,
    /// Show who is signed in and what is loaded
    Status,
}

async fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_yaml_file(path).await?,
        None => ClientConfig::default(),
    };
    config = config.apply_env_from(|key| std::env::var(key).ok())?;

    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(dir) = &cli.store_dir {
        config.store = StoreConfig::File { dir: dir.clone() };
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).await?;
    init_tracing(config.log_format);

    let backend = Arc::new(
        config
            .http_backend()
            .context("failed to build HTTP client")?,
    );
    let store = config.open_store().await.context("failed to open session store")?;
    let session = Arc::new(ProcurementSession::restore(backend, store).await);
    info!(api = %config.api_base_url, phase = ?session.phase(), "Session ready");

    run(cli.command, session).await
}

async fn run(command: Command, session: Arc<ProcurementSession>) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let outcome = session.login(&email, &password).await;
            print_auth(&outcome)?;
            if let Some(user) = outcome.user {
                println!("Signed in as {} <{}>", user.name, user.email);
            }
        }
        Command::Register {
            name,
            email,
            password,
            company,
            project_type,
        } => {
            let request = RegisterRequest {
                name,
                email,
                password,
                company,
                project_type,
            };
            let outcome = session.register(&request).await;
            print_auth(&outcome)?;
            println!("Account created. Run `procure login` to sign in.");
        }
        Command::Logout => {
            session.logout().await;
            println!("Signed out");
        }
        Command::Analyze { query } => {
            // Reports belong to a signed-in user; the result lands on the budget view
            enter(&session, View::Budget)?;
            let query = query.join(" ");
            match session.run_analysis(&query).await {
                AnalysisOutcome::Completed(report) => print_budget(&report),
                AnalysisOutcome::Failed(message) => bail!(message),
                AnalysisOutcome::Superseded => println!("Request was replaced by a newer one"),
            }
        }
        Command::Budget => {
            enter(&session, View::Budget)?;
            print_budget(&require_report(&session)?);
        }
        Command::Materials => {
            enter(&session, View::Materials)?;
            print_materials(&require_report(&session)?);
        }
        Command::Schedule => {
            enter(&session, View::Schedule)?;
            print_schedule(&require_report(&session)?);
        }
        Command::Vendors { material } => {
            let view = material
                .clone()
                .map(View::VendorDetail)
                .unwrap_or(View::Materials);
            enter(&session, view)?;
            let report = require_report(&session)?;
            match material {
                Some(material) => {
                    let vendors = vendors_for(&report, &material);
                    if vendors.is_empty() {
                        println!("No vendors recommended for {material}");
                    }
                    for vendor in vendors {
                        print_vendor(vendor);
                    }
                }
                None => {
                    for group in vendors_by_material(&report) {
                        println!("{}", group.material);
                        if group.is_empty() {
                            println!("  (no vendors)");
                        }
                        for vendor in group.vendors {
                            print_vendor(vendor);
                        }
                    }
                }
            }
        }
        Command::SearchVendors { material, location } => {
            let vendors = session.search_vendors(&material, location.as_deref()).await?;
            if vendors.is_empty() {
                println!("No vendors found for {material}");
            }
            for vendor in &vendors {
                print_vendor(vendor);
            }
        }
        Command::Chat { message } => {
            if !session.is_authenticated() {
                bail!("Sign in to chat. Run `procure login --email <email> --password <password>` first.");
            }
            let assistant = ChatAssistant::new(session.clone());
            let turn = assistant.send(&message.join(" ")).await?;
            println!("{}", turn.reply);
        }
        Command::Conversations => {
            if !session.is_authenticated() {
                bail!("Sign in to see your conversations");
            }
            let conversations = session.refresh_conversations().await?;
            if conversations.is_empty() {
                println!("No conversations yet");
            }
            for conversation in conversations {
                println!(
                    "{}  {}  {}",
                    conversation.created_at.format("%Y-%m-%d %H:%M"),
                    conversation.id,
                    conversation.title
                );
            }
        }
        Command::Health => {
            let health = session.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Command::Status => {
            let state = session.snapshot();
            println!("phase: {:?}", state.phase());
            match &state.user {
                Some(user) => println!("user: {} <{}>", user.name, user.email),
                None => println!("user: (anonymous)"),
            }
            match &state.report {
                Some(report) => println!(
                    "report: {} in {}, total {}",
                    report.project_details.project_type,
                    report.project_details.location,
                    format_inr(report.budget_breakdown.total_cost)
                ),
                None => println!("report: (none)"),
            }
        }
    }
    Ok(())
}

fn enter(session: &ProcurementSession, view: View) -> Result<()> {
    match session.navigate(view) {
        GuardDecision::Allow(_) => Ok(()),
        GuardDecision::RedirectToLogin { from } => {
            bail!("{from} requires sign-in. Run `procure login --email <email> --password <password>` first.")
        }
    }
}

fn require_report(session: &ProcurementSession) -> Result<ProcurementReport> {
    session
        .report()
        .context("No report loaded. Run `procure analyze <project description>` first.")
}

fn print_auth(outcome: &AuthOutcome) -> Result<()> {
    if outcome.success {
        return Ok(());
    }
    bail!(
        "{}",
        outcome.error.as_deref().unwrap_or("Authentication failed")
    )
}

fn print_budget(report: &ProcurementReport) {
    let details = &report.project_details;
    let budget = &report.budget_breakdown;
    println!(
        "{} in {} ({} sqft)",
        details.project_type, details.location, details.built_area
    );
    println!("Total: {}", format_inr(budget.total_cost));
    println!("Per sqft: {}", format_inr(budget.cost_per_sqft));
    for row in budget_rows(budget) {
        println!("  {:<10} {:>16} {:>6.1}%", row.label, row.formatted, row.percentage);
    }
}

fn print_materials(report: &ProcurementReport) {
    if report.material_requirements.is_empty() {
        println!("No material requirements in this report");
        return;
    }
    let shares = material_cost_shares(report);
    for (requirement, share) in report.material_requirements.iter().zip(shares) {
        println!(
            "  {:<20} {:>12} {:<8} {:>16} {:>6.1}%",
            requirement.name,
            requirement.quantity,
            requirement.unit,
            format_inr(requirement.total_cost),
            share.percentage
        );
    }
}

fn print_schedule(report: &ProcurementReport) {
    let layout = GanttLayout::new(&report.project_schedule, GANTT_WIDTH);
    let (Some(start), Some(end)) = (layout.start, layout.end) else {
        println!("No schedule in this report");
        return;
    };
    println!("{start} .. {end} ({} days)", layout.span_days);
    for bar in &layout.bars {
        let offset = bar.offset_px.round() as usize;
        let width = (bar.width_px.round() as usize).max(1);
        println!(
            "  {:<24} {}{} {:.0}%",
            bar.name,
            " ".repeat(offset),
            "#".repeat(width),
            bar.progress
        );
    }
}

fn print_vendor(vendor: &procure_flow::Vendor) {
    let rating = vendor
        .rating
        .map(|r| format!("{r:.1}"))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {:<28} {:<20} {:<16} rating {}",
        vendor.name, vendor.product, vendor.location, rating
    );
    if let Some(contact) = &vendor.contact {
        println!("    contact: {contact}");
    }
}
