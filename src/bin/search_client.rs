use anyhow::{anyhow, bail, Context};
use dotenv::dotenv;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::fs;
use std::process;
use std::time::Instant;

// --- ANSI colors ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

const USAGE: &str = "usage: search_client [--server URL] (<CONFIG_JSON> | -f <FILE>)";

#[derive(Deserialize, Debug)]
struct SubmitJobResponse {
    job_id: i64,
}

#[derive(Deserialize, Debug)]
struct CancelJobResponse {
    requested: bool,
}

#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Deserialize, Debug, Default)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, PartialEq)]
enum WaitOutcome {
    Succeeded,
    Cancelled,
    Failed(String),
}

struct Args {
    server: Option<String>,
    config: Value,
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut server = None;
    let mut inline = None;
    let mut file = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--server" => {
                server = Some(iter.next().ok_or_else(|| anyhow!("--server needs a URL"))?.clone())
            }
            "-f" | "--file" => {
                file = Some(iter.next().ok_or_else(|| anyhow!("-f needs a path"))?.clone())
            }
            other if inline.is_none() => inline = Some(other.to_string()),
            other => bail!("unexpected argument `{}`", other),
        }
    }

    let raw = match (inline, file) {
        (Some(_), Some(_)) => bail!("a search config cannot come from the command line AND a file"),
        (None, None) => bail!("no search config given"),
        (Some(raw), None) => raw,
        (None, Some(path)) => {
            fs::read_to_string(&path).with_context(|| format!("failed to read {}", path))?
        }
    };

    let config: Value = serde_json::from_str(&raw).context("search config is not valid JSON")?;
    if !config.is_object() {
        bail!("search config must be a JSON object");
    }

    Ok(Args { server, config })
}

struct SearchJobClient {
    base_url: String,
    client: Client,
}

impl SearchJobClient {
    fn new(base_url: String) -> anyhow::Result<Self> {
        // No request timeout: /wait blocks for as long as the job runs
        let client = Client::builder()
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }

    async fn check_service_health(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn submit(&self, config: &Value) -> anyhow::Result<i64> {
        let response = self
            .client
            .post(format!("{}/jobs", self.base_url))
            .json(config)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {} - {}", status, body);
        }
        Ok(response.json::<SubmitJobResponse>().await?.job_id)
    }

    async fn wait(&self, job_id: i64) -> anyhow::Result<WaitOutcome> {
        let response = self
            .client
            .get(format!("{}/jobs/{}/wait", self.base_url, job_id))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(WaitOutcome::Succeeded);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        match status {
            StatusCode::CONFLICT => Ok(WaitOutcome::Cancelled),
            StatusCode::NOT_FOUND => bail!("search job {} disappeared", job_id),
            _ if body.error.code == "UNEXPECTED_JOB_STATUS" => {
                Ok(WaitOutcome::Failed(body.error.message))
            }
            _ => bail!("HTTP {} - {}", status, body.error.message),
        }
    }

    async fn cancel_if_pending(&self, job_id: i64) -> anyhow::Result<bool> {
        let response = self
            .client
            .post(format!(
                "{}/jobs/{}/cancel?only_pending=true",
                self.base_url, job_id
            ))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<CancelJobResponse>().await?.requested)
    }
}

async fn run(args: Args, base_url: String) -> anyhow::Result<bool> {
    let client = SearchJobClient::new(base_url)?;

    if !client.check_service_health().await {
        println!("{}❌ Service unavailable at {}.{}", RED, client.base_url, RESET);
        return Ok(false);
    }

    let started = Instant::now();
    let job_id = client.submit(&args.config).await?;
    println!("{}Search job_{} submitted.{}", CYAN, job_id, RESET);
    println!("Waiting for updates...");

    let outcome = tokio::select! {
        outcome = client.wait(job_id) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            println!("\n{}Trying to cancel search job_{}.{}", YELLOW, job_id, RESET);
            if !client.cancel_if_pending(job_id).await? {
                println!(
                    "{}Search job already started and will continue to run in the background.{}",
                    YELLOW, RESET
                );
                return Ok(false);
            }
            client.wait(job_id).await?
        }
    };

    let elapsed = started.elapsed().as_secs_f64();
    match outcome {
        WaitOutcome::Succeeded => {
            println!("{}✅ Search finished in {:.2}s.{}", GREEN, elapsed, RESET);
            Ok(true)
        }
        WaitOutcome::Cancelled => {
            println!("{}Search job_{} cancelled.{}", YELLOW, job_id, RESET);
            Ok(false)
        }
        WaitOutcome::Failed(message) => {
            println!("{}❌ Search failed: {}{}", RED, message, RESET);
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let argv: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}{}{}\n{}", BOLD, e, RESET, USAGE);
            process::exit(2);
        }
    };

    let base_url = args
        .server
        .clone()
        .or_else(|| env::var("SEARCH_JOBS_URL").ok())
        .unwrap_or_else(|| "http://localhost:8003".to_string());

    match run(args, base_url).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{}❌ {:#}{}", RED, e, RESET);
            process::exit(1);
        }
    }
}
