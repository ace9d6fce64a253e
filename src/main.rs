use clap::{Args, Parser, Subcommand};
use gmo_tran::application::transaction::PaymentTransaction;
use gmo_tran::domain::call::EntryTranResponse;
use gmo_tran::domain::catalogue::ErrorCatalogue;
use gmo_tran::domain::context::{SandboxShop, ShopCredentials};
use gmo_tran::domain::ports::SharedTransport;
use gmo_tran::error::PaymentError;
use gmo_tran::infrastructure::simulated::SimulatedGateway;
use gmo_tran::interfaces::csv::operation_reader::{Operation, OperationReader, OperationType};
use gmo_tran::interfaces::csv::outcome_writer::{Outcome, OutcomeResult, OutcomeWriter};
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    shop: ShopArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ShopArgs {
    /// Production shop id
    #[arg(long, env = "SHOP_ID", default_value = "simulated-shop")]
    shop_id: String,

    /// Production shop password
    #[arg(
        long,
        env = "SHOP_PASSWORD",
        default_value = "simulated-pass",
        hide_env_values = true
    )]
    shop_password: String,

    #[arg(long, env = "SHOP_NAME")]
    shop_name: Option<String>,

    /// Sandbox shop id. When set, every call goes to the sandbox.
    #[arg(long, env = "SANDBOX_SHOP_ID", requires = "sandbox_password")]
    sandbox_shop_id: Option<String>,

    #[arg(
        long,
        env = "SANDBOX_PASSWORD",
        requires = "sandbox_shop_id",
        hide_env_values = true
    )]
    sandbox_password: Option<String>,

    #[arg(long, env = "SANDBOX_SHOP_NAME", default_value = "")]
    sandbox_shop_name: String,
}

impl ShopArgs {
    fn shop(&self) -> ShopCredentials {
        ShopCredentials::new(&self.shop_id, &self.shop_password, self.shop_name.clone())
    }

    fn sandbox(&self) -> Option<SandboxShop> {
        match (&self.sandbox_shop_id, &self.sandbox_password) {
            (Some(id), Some(password)) => {
                Some(SandboxShop::new(id, password, &self.sandbox_shop_name))
            }
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Replays a CSV of operations against the simulated gateway
    Replay {
        /// Operations CSV file (op,payment_id,amount,token,job_code)
        input: PathBuf,

        /// Card token the simulated gateway accepts (repeatable)
        #[arg(long = "token")]
        tokens: Vec<String>,
    },
    /// Prints the catalogue description of each error code
    Explain {
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let catalogue = Arc::new(ErrorCatalogue::builtin().into_diagnostic()?);

    match cli.command {
        Command::Replay { input, tokens } => replay(&cli.shop, catalogue, input, tokens).await,
        Command::Explain { codes } => explain(&catalogue, &codes),
    }
}

async fn replay(
    args: &ShopArgs,
    catalogue: Arc<ErrorCatalogue>,
    input: PathBuf,
    tokens: Vec<String>,
) -> Result<()> {
    let shop = args.shop();
    let sandbox = args.sandbox();

    let mut shops = vec![shop.clone()];
    shops.extend(sandbox.clone().map(|sandbox| sandbox.0));
    let gateway = SimulatedGateway::new(shops);
    for token in tokens {
        gateway.register_token(token).await;
    }
    let transport: SharedTransport = Arc::new(gateway);

    // Access credentials of authorized payments, for later cancels.
    let mut authorized: HashMap<String, EntryTranResponse> = HashMap::new();

    let file = File::open(input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());

    for op_result in reader.operations() {
        let op = match op_result {
            Ok(op) => op,
            Err(e) => {
                error!("Error reading operation: {}", e);
                continue;
            }
        };

        let mut payment =
            PaymentTransaction::new(shop.clone(), transport.clone(), catalogue.clone());
        payment.sandbox = sandbox.clone();
        let outcome = match run(&mut payment, &op, &authorized).await {
            Ok(result) => result,
            Err(e) => {
                error!(payment_id = %op.payment_id, "Error processing operation: {}", e);
                OutcomeResult::Invalid
            }
        };

        if outcome == OutcomeResult::Approved
            && let Some(entry) = payment.entry_response()
        {
            authorized.insert(op.payment_id.clone(), entry.clone());
        }

        let row = Outcome {
            op: match op.op {
                OperationType::Authorize => "authorize".to_string(),
                OperationType::Cancel => "cancel".to_string(),
            },
            payment_id: op.payment_id.clone(),
            result: outcome,
            access_id: payment.access_id.clone().unwrap_or_default(),
            tran_id: payment
                .response()
                .map(|response| response.tran_id.clone())
                .or_else(|| payment.alter_response().map(|alter| alter.tran_id.clone()))
                .unwrap_or_default(),
            errors: payment.error_code().unwrap_or_default().join("|"),
        };
        writer.write_outcome(&row).into_diagnostic()?;
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}

async fn run(
    payment: &mut PaymentTransaction,
    op: &Operation,
    authorized: &HashMap<String, EntryTranResponse>,
) -> Result<OutcomeResult, PaymentError> {
    match op.op {
        OperationType::Authorize => {
            payment.payment_id = Some(op.payment_id.clone());
            payment.amount = op.amount;
            payment.token = op.token.clone();
            Ok(match payment.authorize().await? {
                Some(_) => OutcomeResult::Approved,
                None => OutcomeResult::Declined,
            })
        }
        OperationType::Cancel => {
            if let Some(entry) = authorized.get(&op.payment_id) {
                payment.access_id = Some(entry.access_id.clone());
                payment.access_pass = Some(entry.access_pass.clone());
            }
            payment.job_code = op.job_code;
            Ok(if payment.cancel().await? {
                OutcomeResult::Altered
            } else {
                OutcomeResult::Declined
            })
        }
    }
}

fn explain(catalogue: &ErrorCatalogue, codes: &[String]) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());
    writer
        .write_record(["code", "description"])
        .into_diagnostic()?;
    for code in codes {
        let description = catalogue.describe(code).unwrap_or("unknown");
        writer
            .write_record([code.as_str(), description])
            .into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;
    Ok(())
}
