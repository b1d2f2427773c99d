use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use o2d_api::{
    auth::LoginRequest,
    commands::orders::{CreateOrderRequest, StageForm, StageTarget},
    config::{self, AppConfig},
    events::{Event, EventSender},
    models::{Order, OrderDetails, SessionUser, Stage},
    repositories::{CurrentUserRepository, JsonStore},
    services::orders::{OrderQuery, OrderService, OrderTab, OrderView, StageCount},
    AppState,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Login(args) => handle_login(&context, args, cli.json).await?,
        Commands::Logout => handle_logout(&context).await?,
        Commands::Whoami => handle_whoami(&context, cli.json).await?,
        Commands::Orders(command) => handle_orders_command(&context, command, cli.json).await?,
        Commands::Stage(command) => handle_stage_command(&context, command, cli.json).await?,
        Commands::Dashboard => handle_dashboard(&context, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "o2d", about = "Order-to-delivery workflow CLI", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the user for later commands
    Login(LoginArgs),
    /// Forget the current user
    Logout,
    /// Show the current user
    Whoami,
    #[command(subcommand)]
    Orders(OrdersCommands),
    #[command(subcommand)]
    Stage(StageCommands),
    /// Order totals, per-firm revenue and stage counts
    Dashboard,
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long, help = "User id, e.g. admin1")]
    id: String,
    #[arg(long, help = "Password for the user")]
    password: String,
}

#[derive(Subcommand)]
enum OrdersCommands {
    List(ListOrdersArgs),
    Show(OrderRefArgs),
    Create(CreateOrderArgs),
    /// Replace every order with the contents of a JSON file (master only)
    Replace(ReplaceOrdersArgs),
    /// Plan dispatch for today, filling any missing earlier checks
    FastTrack(StageRefArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum TabArg {
    Open,
    Completed,
}

impl From<TabArg> for OrderTab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Open => OrderTab::Open,
            TabArg::Completed => OrderTab::Completed,
        }
    }
}

#[derive(Args)]
struct ListOrdersArgs {
    #[arg(long, help = "Case-insensitive text matched against every field")]
    search: Option<String>,
    #[arg(long, value_enum, help = "Only open or only completed orders")]
    tab: Option<TabArg>,
}

#[derive(Args)]
struct OrderRefArgs {
    #[arg(help = "Order id or serial number, e.g. AAA-001")]
    order: String,
}

#[derive(Args)]
struct StageRefArgs {
    #[arg(help = "Order id or serial number, e.g. AAA-001")]
    order: String,
    #[arg(long, help = "Reject the change unless the order is at this version")]
    expected_version: Option<u64>,
}

#[derive(Args)]
struct CreateOrderArgs {
    #[arg(long, help = "JSON file holding the full order request; other flags are ignored")]
    file: Option<PathBuf>,
    #[arg(long, help = "Firm the order belongs to (required for master)")]
    firm: Option<String>,
    #[arg(long)]
    po_number: Option<String>,
    #[arg(long, help = "Purchase order date (YYYY-MM-DD)")]
    po_date: Option<NaiveDate>,
    #[arg(long)]
    gst: Option<String>,
    #[arg(long)]
    party: Option<String>,
    #[arg(long, help = "Total purchase order value")]
    value: Option<Decimal>,
    #[arg(long)]
    address: Option<String>,
}

#[derive(Args)]
struct ReplaceOrdersArgs {
    #[arg(long, help = "JSON array of orders")]
    file: PathBuf,
}

#[derive(Subcommand)]
enum StageCommands {
    /// Every stage with pending and history counts
    List,
    Pending(StageViewArgs),
    History(StageViewArgs),
    /// Submit the form for one stage of an order
    Submit(SubmitStageArgs),
}

#[derive(Args)]
struct StageViewArgs {
    #[arg(help = "Stage name, e.g. po-check")]
    stage: Stage,
    #[arg(long)]
    search: Option<String>,
}

#[derive(Args)]
struct SubmitStageArgs {
    #[command(flatten)]
    target: StageRefArgs,
    #[arg(long, help = "Stage name, e.g. delivery-check")]
    stage: Stage,
    #[arg(long, conflicts_with = "file", help = "Form as inline JSON")]
    data: Option<String>,
    #[arg(long, help = "Form read from a JSON file")]
    file: Option<PathBuf>,
}

struct CliContext {
    config: AppConfig,
    orders: Arc<OrderService>,
    state: AppState,
    current_user: CurrentUserRepository,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(&config.log_level, config.log_json);
        if config.uses_in_memory_storage() {
            warn!("in-memory storage selected; changes will not outlive this command");
        }

        let (event_tx, mut event_rx) = mpsc::channel::<Event>(config.event_channel_capacity);
        let event_sender = Arc::new(EventSender::new(event_tx));
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                debug!(target: "o2d_cli", event = ?event, "received async event");
            }
        });

        let state = AppState::bootstrap(config.clone(), event_sender)
            .await
            .context("failed to open order store")?;
        let current_user = CurrentUserRepository::new(JsonStore::new(config.data_dir.clone()));

        Ok(Self {
            orders: state.services.orders.clone(),
            state,
            config,
            current_user,
        })
    }

    async fn actor(&self) -> Result<SessionUser> {
        self.current_user
            .current()
            .await
            .context("failed to read current user")?
            .ok_or_else(|| anyhow!("not logged in; run `o2d login --id <id> --password <password>`"))
    }

    /// Accepts an order id or a serial number visible to `actor`.
    async fn resolve_order(&self, actor: &SessionUser, reference: &str) -> Result<Uuid> {
        if let Ok(id) = Uuid::parse_str(reference) {
            return Ok(id);
        }
        self.orders
            .read_orders(actor)
            .await
            .into_iter()
            .find(|order| order.serial_no.eq_ignore_ascii_case(reference))
            .map(|order| order.id)
            .ok_or_else(|| anyhow!("order {} not found", reference))
    }
}

async fn handle_login(context: &CliContext, args: LoginArgs, json: bool) -> Result<()> {
    let response = context
        .state
        .services
        .auth
        .login(&LoginRequest {
            id: args.id,
            password: args.password,
        })
        .await?;

    context
        .current_user
        .set(&response.user)
        .await
        .context("failed to save current user")?;

    if json {
        print_json(&response.user)?;
    } else {
        println!(
            "Logged in as {} ({}, firm {})",
            response.user.name, response.user.role, response.user.firm
        );
    }
    Ok(())
}

async fn handle_logout(context: &CliContext) -> Result<()> {
    context
        .current_user
        .clear()
        .await
        .context("failed to clear current user")?;
    println!("Logged out");
    Ok(())
}

async fn handle_whoami(context: &CliContext, json: bool) -> Result<()> {
    let user = context.actor().await?;
    if json {
        print_json(&user)?;
    } else {
        println!("{} ({}) role {} firm {}", user.name, user.id, user.role, user.firm);
    }
    Ok(())
}

async fn handle_orders_command(
    context: &CliContext,
    command: OrdersCommands,
    json: bool,
) -> Result<()> {
    let actor = context.actor().await?;
    let service = &context.orders;

    match command {
        OrdersCommands::List(args) => {
            let query = OrderQuery {
                search: args.search,
                tab: args.tab.map(Into::into),
            };
            let orders = service
                .list_orders(&actor, &query)
                .await
                .context("failed to list orders")?;
            if json {
                print_json(&orders)?;
            } else if orders.is_empty() {
                println!("No orders");
            } else {
                for order in &orders {
                    render_order(order);
                }
            }
        }
        OrdersCommands::Show(args) => {
            let id = context.resolve_order(&actor, &args.order).await?;
            let order = service.get_order(&actor, id).await?;
            if json {
                print_json(&order)?;
            } else {
                render_order_detail(&order);
            }
        }
        OrdersCommands::Create(args) => {
            let request = create_request(args)?;
            let order = service.create_order(&actor, request).await?;
            if json {
                print_json(&order)?;
            } else {
                println!("Created order {} ({})", order.serial_no, order.id);
            }
        }
        OrdersCommands::Replace(args) => {
            let raw = fs::read_to_string(&args.file)
                .with_context(|| format!("failed to read {}", args.file.display()))?;
            let orders: Vec<Order> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of orders", args.file.display()))?;
            let count = service.replace_orders(&actor, orders).await?;
            if json {
                print_json(&serde_json::json!({ "count": count }))?;
            } else {
                println!("Replaced order list with {} orders", count);
            }
        }
        OrdersCommands::FastTrack(args) => {
            let id = context.resolve_order(&actor, &args.order).await?;
            let target = StageTarget::new(id, actor).expecting_version(args.expected_version);
            let order = service.fast_track_to_dispatch(target).await?;
            if json {
                print_json(&order)?;
            } else {
                println!(
                    "Order {} planned for dispatch as {}",
                    order.serial_no,
                    order.ds_number().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

fn create_request(args: CreateOrderArgs) -> Result<CreateOrderRequest> {
    if let Some(path) = args.file {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a valid order request", path.display()));
    }

    let missing = |flag: &str| anyhow!("--{} is required unless --file is given", flag);
    let mut details = OrderDetails::new(
        args.po_number.ok_or_else(|| missing("po-number"))?,
        args.po_date.ok_or_else(|| missing("po-date"))?,
        args.gst.ok_or_else(|| missing("gst"))?,
        args.party.ok_or_else(|| missing("party"))?,
        args.value.ok_or_else(|| missing("value"))?,
    );
    details.address = args.address;

    Ok(CreateOrderRequest {
        firm_name: args.firm,
        details,
    })
}

async fn handle_stage_command(
    context: &CliContext,
    command: StageCommands,
    json: bool,
) -> Result<()> {
    let actor = context.actor().await?;
    let service = &context.orders;

    match command {
        StageCommands::List => {
            let stages = service.stage_catalogue(&actor).await;
            if json {
                print_json(&stages)?;
            } else {
                for stage in &stages {
                    render_stage_count(stage);
                }
            }
        }
        StageCommands::Pending(args) => {
            let view = service
                .stage_view(&actor, args.stage, args.search.as_deref())
                .await;
            print_orders(&view.pending, json, &format!("Pending for {}", view.title))?;
        }
        StageCommands::History(args) => {
            let view = service
                .stage_view(&actor, args.stage, args.search.as_deref())
                .await;
            print_orders(&view.history, json, &format!("Completed {}", view.title))?;
        }
        StageCommands::Submit(args) => {
            let raw = match (args.data, args.file) {
                (Some(data), _) => data,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => bail!("provide the stage form with --data or --file"),
            };
            let body: serde_json::Value =
                serde_json::from_str(&raw).context("stage form is not valid JSON")?;
            let form = StageForm::from_json(args.stage, body)?;

            let id = context.resolve_order(&actor, &args.target.order).await?;
            let target =
                StageTarget::new(id, actor).expecting_version(args.target.expected_version);
            let order = service.submit_stage(target, form).await?;
            if json {
                print_json(&OrderView::from(order))?;
            } else {
                println!(
                    "{} completed for order {} (version {})",
                    args.stage.title(),
                    order.serial_no,
                    order.version
                );
            }
        }
    }
    Ok(())
}

async fn handle_dashboard(context: &CliContext, json: bool) -> Result<()> {
    let actor = context.actor().await?;
    let summary = context.orders.dashboard(&actor).await;
    if json {
        return print_json(&summary);
    }

    println!(
        "Orders: {} total, {} pending, {} in progress, {} completed",
        summary.total_orders,
        summary.pending_orders,
        summary.in_progress_orders,
        summary.completed_orders
    );
    println!("Total PO value: {}", summary.total_value);
    for firm in &summary.firms {
        println!("- {} • {} orders • revenue {}", firm.firm, firm.orders, firm.revenue);
    }
    for stage in &summary.stages {
        render_stage_count(stage);
    }
    if !summary.recent_orders.is_empty() {
        println!("Recent:");
        for order in &summary.recent_orders {
            println!("- {} • {} • {}", order.serial_no, order.party_name, order.status);
        }
    }
    if context.config.uses_in_memory_storage() {
        println!("(in-memory storage)");
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_orders(orders: &[Order], json: bool, heading: &str) -> Result<()> {
    if json {
        return print_json(&orders);
    }
    println!("{} ({})", heading, orders.len());
    for order in orders {
        println!(
            "- {} • {} • PO {} • value {}",
            order.serial_no, order.details.party_name, order.details.party_po_number, order.details.total_po_value
        );
    }
    Ok(())
}

fn render_order(view: &OrderView) {
    let order = &view.order;
    println!(
        "- {} • {} • {} • status {} • next {}",
        order.serial_no,
        order.firm_name,
        order.details.party_name,
        view.status,
        view.next_stage.map(|s| s.title()).unwrap_or("-")
    );
}

fn render_order_detail(view: &OrderView) {
    let order = &view.order;
    println!("Order {} ({})", order.serial_no, order.id);
    println!("  firm: {}", order.firm_name);
    println!("  party: {}", order.details.party_name);
    println!(
        "  PO: {} dated {}",
        order.details.party_po_number, order.details.party_po_date
    );
    println!("  value: {}", order.details.total_po_value);
    println!("  status: {} (version {})", view.status, order.version);
    for stage in Stage::all() {
        let mark = if order.stage_completed(stage) { "x" } else { " " };
        println!("  [{}] {}", mark, stage.title());
    }
    if let Some(ds) = order.ds_number() {
        println!("  DS number: {}", ds);
    }
    if let Some(lgst) = order.lgst_number() {
        println!("  LGST number: {}", lgst);
    }
}

fn render_stage_count(stage: &StageCount) {
    println!(
        "- {} • pending {} • history {}",
        stage.title, stage.pending, stage.history
    );
}
