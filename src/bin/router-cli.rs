use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Management CLI for the dynamic router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "ROUTER_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check router status
    Status,
    /// List routes in insertion order
    Routes,
    /// Add a static-response route
    Add {
        path: String,
        #[arg(short, long, default_value = "*")]
        domain: String,
        #[arg(short, long, default_value = "*")]
        method: String,
        #[arg(short, long, default_value_t = 200)]
        status: u16,
        #[arg(short, long, default_value = "")]
        body: String,
        #[arg(long, default_value = "text/plain; charset=utf-8")]
        content_type: String,
        /// Fail instead of replacing an existing entry
        #[arg(long)]
        no_overwrite: bool,
        /// Drop the any-method entry for the same domain and path
        #[arg(long)]
        drop_any: bool,
    },
    /// Remove one route
    Remove {
        path: String,
        #[arg(short, long, default_value = "*")]
        domain: String,
        #[arg(short, long, default_value = "*")]
        method: String,
    },
    /// Remove every route registered under a domain pattern
    RemoveDomain { pattern: String },
    /// Remove all routes
    Clear,
    /// List middlewares in execution order
    Middlewares,
    /// Remove the middleware at an index
    RemoveMiddleware { index: usize },
    /// Remove all middlewares
    ClearMiddlewares,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let url = |path: &str| format!("{}/admin/{}", cli.url.trim_end_matches('/'), path);

    let request = match cli.command {
        Commands::Status => client.get(url("status")),
        Commands::Routes => client.get(url("routes")),
        Commands::Add {
            path,
            domain,
            method,
            status,
            body,
            content_type,
            no_overwrite,
            drop_any,
        } => client.post(url("routes")).json(&json!({
            "domain": domain,
            "method": method,
            "path": path,
            "status": status,
            "content_type": content_type,
            "body": body,
            "overwrite": !no_overwrite,
            "preserve_any": !drop_any,
        })),
        Commands::Remove {
            path,
            domain,
            method,
        } => client.post(url("routes/remove")).json(&json!({
            "domain": domain,
            "method": method,
            "path": path,
        })),
        Commands::RemoveDomain { pattern } => client.delete(url(&format!("domains/{pattern}"))),
        Commands::Clear => client.post(url("routes/clear")),
        Commands::Middlewares => client.get(url("middlewares")),
        Commands::RemoveMiddleware { index } => client.delete(url(&format!("middlewares/{index}"))),
        Commands::ClearMiddlewares => client.post(url("middlewares/clear")),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
