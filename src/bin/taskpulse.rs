use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use taskpulse::model::StatusDomain;
use taskpulse::{Priority, TaskPulse, TaskQuery, TaskStatus, TrendWindow};

#[derive(Parser)]
#[command(name = "taskpulse", about = "Task and issue analytics over a local snapshot store")]
struct Cli {
    /// Database path (default: ~/.taskpulse/taskpulse.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a JSON snapshot or task CSV into the store
    Import {
        /// File to read
        file: PathBuf,
        /// Treat the file as task CSV (implied by a .csv extension)
        #[arg(long)]
        csv: bool,
    },
    /// Write the store out as a JSON snapshot or task CSV
    Export {
        /// Output tasks as CSV instead of a JSON snapshot
        #[arg(long)]
        csv: bool,
    },
    /// Show the analytics dashboard
    Dashboard {
        /// Scope to one assignee
        #[arg(long)]
        assignee: Option<String>,
        /// Trend window: 7d, 30d, 4w, wtd, mtd
        #[arg(long)]
        window: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show employee performance scores
    Employees {
        #[arg(long)]
        json: bool,
    },
    /// Show per-tag statistics
    Tags {
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show the daily created/completed trend
    Trend {
        #[arg(long)]
        assignee: Option<String>,
        /// Trend window: 7d, 30d, 4w, wtd, mtd
        #[arg(long, default_value = "30d")]
        window: String,
        #[arg(long)]
        json: bool,
    },
    /// Query tasks with filters
    Tasks {
        /// Filter by assignee id
        #[arg(long)]
        assignee: Option<String>,
        /// Filter by status: not_started, in_progress, completed, blocked
        #[arg(long)]
        status: Option<String>,
        /// Filter by priority: low, medium, high, critical
        #[arg(long)]
        priority: Option<String>,
        /// Filter by tag
        #[arg(long)]
        tag: Option<String>,
        /// Filter overdue tasks only
        #[arg(long)]
        overdue: bool,
        /// Created after date (YYYY-MM-DD)
        #[arg(long)]
        created_after: Option<String>,
        /// Created before date (YYYY-MM-DD)
        #[arg(long)]
        created_before: Option<String>,
        /// Due after date (YYYY-MM-DD)
        #[arg(long)]
        due_after: Option<String>,
        /// Due before date (YYYY-MM-DD)
        #[arg(long)]
        due_before: Option<String>,
        /// Maximum results
        #[arg(long, default_value = "100")]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Output as CSV
        #[arg(long)]
        csv: bool,
        /// Count only (no output rows)
        #[arg(long)]
        count: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show store status
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

/// Filters for the `tasks` command.
struct TaskFilters {
    assignee: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    tag: Option<String>,
    overdue: bool,
    created_after: Option<String>,
    created_before: Option<String>,
    due_after: Option<String>,
    due_before: Option<String>,
    limit: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => taskpulse::Database::open_at(path).await?,
        None => taskpulse::Database::open().await?,
    };
    let pulse = TaskPulse::open(db).await?;

    match cli.command {
        Commands::Import { file, csv } => handle_import(&pulse, &file, csv).await?,
        Commands::Export { csv } => {
            if csv {
                print!("{}", TaskQuery::new().to_csv(pulse.db()).await?);
            } else {
                let snapshot = pulse.export_snapshot().await?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
        }
        Commands::Dashboard {
            assignee,
            window,
            json,
        } => {
            let options = match window {
                Some(w) => pulse.window_options(assignee.as_deref(), TrendWindow::parse(&w)?),
                None => pulse.default_options(assignee.as_deref()),
            };
            let dashboard = pulse.dashboard(&options).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&*dashboard)?);
            } else {
                print_dashboard(&dashboard);
            }
        }
        Commands::Employees { json } => {
            let employees = pulse.employees().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&employees)?);
            } else if employees.is_empty() {
                println!("No profiles found.");
            } else {
                print_employees(&employees);
            }
        }
        Commands::Tags { assignee, json } => {
            let tags = pulse.tags(assignee.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else {
                for t in &tags {
                    println!(
                        "  {:<20} {:>4} tasks  {:>3}% done  {:>3} overdue ({}%)",
                        t.tag, t.total, t.completion_rate, t.overdue, t.overdue_rate
                    );
                }
            }
        }
        Commands::Trend {
            assignee,
            window,
            json,
        } => {
            let window = TrendWindow::parse(&window)?;
            let trend = pulse.trend(assignee.as_deref(), window).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&trend)?);
            } else {
                for p in &trend {
                    println!("  {}  +{:<3} created  {:<3} completed", p.date, p.created, p.completed);
                }
            }
        }
        Commands::Tasks {
            assignee,
            status,
            priority,
            tag,
            overdue,
            created_after,
            created_before,
            due_after,
            due_before,
            limit,
            json,
            csv,
            count,
        } => {
            let filters = TaskFilters {
                assignee,
                status,
                priority,
                tag,
                overdue,
                created_after,
                created_before,
                due_after,
                due_before,
                limit,
            };
            handle_tasks(&pulse, filters, json, csv, count).await?;
        }
        Commands::Config { action } => handle_config(&pulse, action).await?,
        Commands::Status => print_status(&pulse).await?,
    }

    Ok(())
}

async fn handle_import(pulse: &TaskPulse, file: &std::path::Path, csv: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let is_csv = csv
        || file
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let report = if is_csv {
        pulse.import_tasks_csv(&text).await?
    } else {
        pulse.import_snapshot_json(&text).await?
    };

    println!("Import: {}", file.display());
    println!("  Profiles: {}", report.profiles);
    println!("  Tasks:    {}", report.tasks);
    println!("  Issues:   {}", report.issues);
    if report.skipped > 0 {
        println!("  Skipped:  {} rows (run with -v for details)", report.skipped);
    }
    Ok(())
}

async fn handle_tasks(
    pulse: &TaskPulse,
    filters: TaskFilters,
    json: bool,
    csv: bool,
    count: bool,
) -> anyhow::Result<()> {
    let mut builder = TaskQuery::new().limit(filters.limit).descending();

    if let Some(a) = filters.assignee.as_deref() {
        builder = builder.assignee(a);
    }
    if let Some(s) = filters.status.as_deref() {
        let status = TaskStatus::from(s);
        if status == TaskStatus::Unknown {
            anyhow::bail!("unknown status `{s}`");
        }
        builder = builder.status(status);
    }
    if let Some(p) = filters.priority.as_deref() {
        let priority = Priority::from(p);
        if priority == Priority::Unknown {
            anyhow::bail!("unknown priority `{p}`");
        }
        builder = builder.priority(priority);
    }
    if let Some(t) = filters.tag.as_deref() {
        builder = builder.tag(t);
    }
    if filters.overdue {
        builder = builder.overdue(true);
    }
    if let Some(d) = filters.created_after.as_deref() {
        builder = builder.created_after(d);
    }
    if let Some(d) = filters.created_before.as_deref() {
        builder = builder.created_before(d);
    }
    if let Some(d) = filters.due_after.as_deref() {
        builder = builder.due_after(d);
    }
    if let Some(d) = filters.due_before.as_deref() {
        builder = builder.due_before(d);
    }

    let db = pulse.db();
    if count {
        let n = builder.count(db).await?;
        println!("{n}");
    } else if json {
        let output = builder.to_json(db).await?;
        println!("{output}");
    } else if csv {
        let output = builder.to_csv(db).await?;
        print!("{output}");
    } else {
        let rows = builder.tasks(db).await?;
        if rows.is_empty() {
            println!("No tasks found.");
        } else {
            for row in &rows {
                let assignee = row.assigned_to.as_deref().unwrap_or("unassigned");
                let due = row.due_date.as_deref().unwrap_or("no due date");
                println!(
                    "[{}] {} ({}) - {assignee} | {} | due: {due}",
                    row.status.as_str(),
                    row.title,
                    row.id,
                    row.priority.as_str()
                );
            }
            println!("\n{} tasks", rows.len());
        }
    }

    Ok(())
}

async fn handle_config(pulse: &TaskPulse, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match pulse.config_get(&key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            pulse.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = pulse.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

async fn print_status(pulse: &TaskPulse) -> anyhow::Result<()> {
    let status = pulse.status().await?;
    println!("Store Status");
    println!("  Profiles:     {}", status.counts.profiles);
    println!("  Tasks:        {}", status.counts.tasks);
    println!("  Tagged tasks: {}", status.counts.tagged_tasks);
    println!("  Issues:       {}", status.counts.issues);
    println!("  Cache TTL:    {}s", status.settings.cache_ttl_secs);
    println!("  Trend window: {} days", status.settings.trend_days);
    Ok(())
}

fn print_dashboard(d: &taskpulse::DashboardAnalytics) {
    match d.scope.as_deref() {
        Some(who) => println!("Dashboard for {who} ({})", d.generated_at),
        None => println!("Dashboard ({})", d.generated_at),
    }
    println!("  Tasks:");
    println!("    Total:      {}", d.totals.total_tasks);
    println!("    Completed:  {} ({}%)", d.tasks.completed, d.tasks.completion_rate);
    println!("    Overdue:    {}", d.totals.overdue_tasks);
    println!("    Recurring:  {}", d.totals.recurring_tasks);
    println!(
        "    This week:  {} created, {} completed",
        d.totals.created_this_week, d.totals.completed_this_week
    );
    println!("    Open hours: {:.1}", d.totals.open_estimated_hours);

    println!("  By priority:");
    for (priority, n) in &d.tasks.by_priority {
        println!("    {:<12} {n}", priority.as_str());
    }
    println!("  By status:");
    for (status, n) in &d.tasks.by_status {
        println!("    {:<12} {n}", status.as_str());
    }

    println!("  Issues:");
    println!("    Total:           {}", d.issues.breakdown.total);
    println!(
        "    Resolved:        {} ({}%)",
        d.issues.breakdown.completed, d.issues.breakdown.completion_rate
    );
    println!("    Awaiting triage: {}", d.issues.awaiting_triage);
    println!("    Converted:       {}", d.issues.converted);

    print_lead_time(&d.lead_time);

    if !d.problematic_tags.is_empty() {
        println!("  Problematic tags:");
        for t in &d.problematic_tags {
            println!("    {:<20} {}% overdue ({} of {})", t.tag, t.overdue_rate, t.overdue, t.total);
        }
    }

    if !d.employees.is_empty() {
        println!("  Employees:");
        print_employees(&d.employees);
    }

    if !d.insights.is_empty() {
        println!("  Insights:");
        for insight in &d.insights {
            println!("    - {insight}");
        }
    }
}

fn print_employees(employees: &[taskpulse::EmployeeScore]) {
    for e in employees {
        println!(
            "    {:>3}  {:<24} {} tasks, {} done, {} overdue, {} late",
            e.score, e.full_name, e.total_tasks, e.completed_tasks, e.overdue_tasks, e.late_tasks
        );
    }
}

fn print_lead_time(lt: &taskpulse::analytics::DurationStats) {
    println!("  Lead Time:");
    match lt.avg_days {
        Some(avg) => {
            println!("    Average: {avg:.1} days");
            println!("    Median:  {:.1} days", lt.median_days.unwrap_or(0.0));
            println!("    P90:     {:.1} days", lt.p90_days.unwrap_or(0.0));
            println!("    Range:   {}-{} days", lt.min_days.unwrap_or(0), lt.max_days.unwrap_or(0));
        }
        None => println!("    No completed tasks"),
    }
}
