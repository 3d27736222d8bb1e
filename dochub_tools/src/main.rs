//! Operator tools for poking a running payment server: fire a simulated gateway webhook at it, or ask it for a
//! transaction's settlement status. Useful for verifying a deployment end-to-end without waiting for a real bank
//! transfer.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sepay_tools::calculate_signature;

#[derive(Parser, Debug)]
#[command(version, about = "DocHub payment gateway operator tools")]
pub struct Arguments {
    /// Base URL of the payment server
    #[arg(short = 'u', long = "url", default_value = "http://127.0.0.1:8360")]
    url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "simulate", about = "Deliver a simulated settlement webhook for a payment")]
    Simulate(SimulateParams),
    #[clap(name = "status", about = "Query the settlement status of a transaction")]
    Status(StatusParams),
}

#[derive(Debug, Args)]
pub struct SimulateParams {
    /// The 8-character code suffix shown to the payer (the part after DH)
    #[arg(short = 'c', long = "code")]
    code_suffix: String,
    /// The transfer amount in đồng
    #[arg(short = 'a', long = "amount")]
    amount: i64,
    /// Optional virtual-account prefix to include in the transfer content
    #[arg(short = 'v', long = "virtual-account")]
    virtual_account: Option<String>,
    /// Sign the body with an HMAC header instead of sending the key in the Authorization header
    #[arg(long = "sign")]
    sign: bool,
}

#[derive(Debug, Args)]
pub struct StatusParams {
    /// The transaction id
    #[arg(short = 't', long = "transaction")]
    transaction_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Arguments::parse();
    match args.command {
        Command::Simulate(params) => simulate_webhook(&args.url, params).await,
        Command::Status(params) => check_status(&args.url, params).await,
    }
}

async fn simulate_webhook(base_url: &str, params: SimulateParams) -> Result<()> {
    let secret = std::env::var("SEPAY_SECRET_KEY").context("SEPAY_SECRET_KEY is not set")?;
    let code = format!("DH{}", params.code_suffix.to_uppercase());
    let content = match &params.virtual_account {
        Some(va) => format!("{va} {code}"),
        None => code.clone(),
    };
    let payload = serde_json::json!({
        "id": format!("SIM-{}", std::process::id()),
        "gateway": "SIMULATED",
        "transferType": "in",
        "transferAmount": params.amount,
        "transferContent": content,
        "content": content,
    })
    .to_string();

    println!("Delivering simulated webhook for {code} ({} ₫)", params.amount);
    let client = reqwest::Client::new();
    let mut req = client
        .post(format!("{base_url}/api/webhook/sepay"))
        .header("Content-Type", "application/json")
        .body(payload.clone());
    if params.sign {
        req = req.header("X-Sepay-Signature", calculate_signature(&secret, payload.as_bytes()));
    } else {
        req = req.header("Authorization", format!("Apikey {secret}"));
    }
    let response = req.send().await.context("Could not reach the payment server")?;
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    println!("HTTP {status}");
    println!("{body}");
    if !status.is_success() {
        bail!("webhook delivery was not accepted");
    }
    Ok(())
}

async fn check_status(base_url: &str, params: StatusParams) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base_url}/api/payments/{}/status", params.transaction_id))
        .send()
        .await
        .context("Could not reach the payment server")?;
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    println!("HTTP {status}");
    println!("{body}");
    Ok(())
}
