use clap::{ArgAction, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use order_reconciler::application::engine::ReconciliationEngine;
use order_reconciler::config::AppConfig;
use order_reconciler::domain::order::{BuyerId, DeliveryAddress, PaymentMethod};
use order_reconciler::domain::ports::{CartStore, CartStoreBox, OrderStoreBox};
use order_reconciler::infrastructure::gateways::PaymentBackends;
use order_reconciler::infrastructure::in_memory::{InMemoryCartStore, InMemoryOrderStore};
use order_reconciler::interfaces::api::{ApiResponse, Identity, OrderApi, PlaceOrderInput};
use order_reconciler::interfaces::csv::line_item_reader::LineItemReader;
use order_reconciler::interfaces::csv::order_writer::OrderWriter;
use order_reconciler::telemetry;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
#[cfg(not(feature = "storage-rocksdb"))]
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Place an order and start its payment
    Place {
        #[arg(long)]
        buyer: BuyerId,
        /// Line items CSV file (name,unit_price,quantity)
        #[arg(long)]
        items: PathBuf,
        /// settlement (cod), hosted-checkout (stripe) or redirect-link (flutterwave)
        #[arg(long)]
        method: PaymentMethod,
        /// Base URL the payment backend redirects back to
        #[arg(long)]
        origin: Option<String>,
        /// Delivery address as JSON
        #[arg(long)]
        address: Option<String>,
        /// Expected order total, checked against the computed one
        #[arg(long)]
        amount: Option<Decimal>,
    },
    /// Start payment again for an unpaid order
    Retry {
        #[arg(long)]
        buyer: BuyerId,
        #[arg(long)]
        order_id: String,
        #[arg(long)]
        origin: String,
    },
    /// Apply the outcome of a hosted checkout redirect
    VerifyHosted {
        #[arg(long)]
        buyer: BuyerId,
        #[arg(long)]
        order_id: String,
        #[arg(long, action = ArgAction::Set)]
        success: bool,
    },
    /// Look up a redirect link transaction and apply its status
    VerifyLink {
        #[arg(long)]
        buyer: BuyerId,
        #[arg(long)]
        transaction_id: String,
        #[arg(long)]
        order_id: String,
    },
    /// List every order as CSV (administrator)
    List,
    /// List one buyer's orders
    MyOrders {
        #[arg(long)]
        buyer: BuyerId,
    },
    /// Set an order's fulfillment status (administrator)
    Status {
        #[arg(long)]
        order_id: String,
        #[arg(long)]
        status: String,
    },
    /// Add an item to a buyer's cart
    CartAdd {
        #[arg(long)]
        buyer: BuyerId,
        #[arg(long)]
        item: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Show a buyer's cart
    CartShow {
        #[arg(long)]
        buyer: BuyerId,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init();
    let cli = Cli::parse();

    let config = AppConfig::from_env().into_diagnostic()?;
    let backends = PaymentBackends::from_config(&config).into_diagnostic()?;
    let (orders, carts) = open_stores(cli.db_path)?;
    let engine = Arc::new(ReconciliationEngine::new(
        orders,
        carts,
        backends,
        config.delivery_fee,
    ));
    let api = OrderApi::new(Arc::clone(&engine));

    match cli.command {
        Command::Place {
            buyer,
            items,
            method,
            origin,
            address,
            amount,
        } => {
            let items = LineItemReader::new(File::open(items).into_diagnostic()?)
                .read_all()
                .into_diagnostic()?;
            let address: DeliveryAddress = match address {
                Some(json) => serde_json::from_str(&json).into_diagnostic()?,
                None => DeliveryAddress::default(),
            };
            let input = PlaceOrderInput {
                items,
                amount,
                address,
                method,
                origin,
            };
            print_response(&api.place_order(&Identity::Buyer(buyer), input).await)
        }
        Command::Retry {
            buyer,
            order_id,
            origin,
        } => print_response(
            &api.retry_payment(&Identity::Buyer(buyer), &order_id, &origin)
                .await,
        ),
        Command::VerifyHosted {
            buyer,
            order_id,
            success,
        } => print_response(
            &api.verify_hosted(&Identity::Buyer(buyer), &order_id, success)
                .await,
        ),
        Command::VerifyLink {
            buyer,
            transaction_id,
            order_id,
        } => print_response(
            &api.verify_link(&Identity::Buyer(buyer), &transaction_id, &order_id)
                .await,
        ),
        Command::List => {
            let response = api.list_all_orders(&Identity::Admin).await;
            if !response.success {
                return print_response(&response);
            }
            let stdout = io::stdout();
            let mut writer = OrderWriter::new(stdout.lock());
            writer
                .write_orders(response.data.unwrap_or_default())
                .into_diagnostic()?;
            Ok(ExitCode::SUCCESS)
        }
        Command::MyOrders { buyer } => {
            print_response(&api.list_my_orders(&Identity::Buyer(buyer)).await)
        }
        Command::Status { order_id, status } => {
            print_response(&api.update_status(&Identity::Admin, &order_id, &status).await)
        }
        Command::CartAdd {
            buyer,
            item,
            quantity,
        } => {
            let mut cart = engine.cart(&buyer).await.into_diagnostic()?;
            cart.add(item, quantity);
            engine.carts().store(cart.clone()).await.into_diagnostic()?;
            print_response(&ApiResponse::ok(cart))
        }
        Command::CartShow { buyer } => {
            let cart = engine.cart(&buyer).await.into_diagnostic()?;
            print_response(&ApiResponse::ok(cart))
        }
    }
}

fn open_stores(db_path: Option<PathBuf>) -> Result<(OrderStoreBox, CartStoreBox)> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            use order_reconciler::infrastructure::rocksdb::RocksDBStore;
            let store = RocksDBStore::open(path).into_diagnostic()?;
            let orders: OrderStoreBox = Box::new(store.clone());
            let carts: CartStoreBox = Box::new(store);
            Ok((orders, carts))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            warn!(
                db_path = %path.display(),
                "Persistent storage requested, but the 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(in_memory_stores())
        }
        None => Ok(in_memory_stores()),
    }
}

fn in_memory_stores() -> (OrderStoreBox, CartStoreBox) {
    (
        Box::new(InMemoryOrderStore::new()),
        Box::new(InMemoryCartStore::new()),
    )
}

fn print_response<T: Serialize>(response: &ApiResponse<T>) -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(response).into_diagnostic()?;
    println!("{json}");
    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
