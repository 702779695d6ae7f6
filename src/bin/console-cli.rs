use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use console_gateway::assets::{self, AssetStore};
use console_gateway::basepath::{self, BasePath};
use console_gateway::config::AssetsConfig;
use console_gateway::rewrite::{self, ContentKind};

#[derive(Parser)]
#[command(name = "console-cli")]
#[command(about = "Base path tooling and management CLI for the console gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AdminArgs {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "CONSOLE_ADMIN_KEY")]
    key: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical form of a base path
    Normalize { raw: String },
    /// Rewrite one built file for a base path
    Rewrite {
        #[arg(short, long)]
        base_path: String,
        file: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Report what every rewriter does to a build directory
    Check {
        #[arg(short, long)]
        base_path: String,
        dir: PathBuf,
        /// Fail unless some script had the origin or asset base patch applied
        #[arg(long)]
        require_js_patches: bool,
    },
    /// Check gateway status
    Status(AdminArgs),
    /// Show rewrite cache counters
    Cache(AdminArgs),
    /// Drop all cached rewrites
    Purge(AdminArgs),
    /// Run a drift scan on the running gateway
    Drift(AdminArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { raw } => {
            println!("{}", basepath::normalize(Some(&raw)));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Rewrite { base_path, file, out } => rewrite_file(&BasePath::new(base_path), &file, out.as_deref()),
        Commands::Check {
            base_path,
            dir,
            require_js_patches,
        } => check(&BasePath::new(base_path), dir, require_js_patches),
        Commands::Status(admin) => admin_call(reqwest::Method::GET, "/admin/status", &admin).await,
        Commands::Cache(admin) => admin_call(reqwest::Method::GET, "/admin/cache", &admin).await,
        Commands::Purge(admin) => admin_call(reqwest::Method::POST, "/admin/cache/purge", &admin).await,
        Commands::Drift(admin) => admin_call(reqwest::Method::GET, "/admin/drift", &admin).await,
    }
}

fn rewrite_file(
    base_path: &BasePath,
    file: &Path,
    out: Option<&Path>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let kind = ContentKind::from_path(file);
    if !kind.is_rewritable() {
        eprintln!("{}: not an HTML, JavaScript or CSS file", file.display());
        return Ok(ExitCode::FAILURE);
    }

    let text = std::fs::read_to_string(file)?;
    let result = rewrite::rewrite(kind, &text, base_path.as_str());

    match out {
        Some(out) => std::fs::write(out, result.content.as_bytes())?,
        None => print!("{}", result.content),
    }
    eprintln!("{}: {}", file.display(), result.report);
    Ok(ExitCode::SUCCESS)
}

fn check(
    base_path: &BasePath,
    dir: PathBuf,
    require_js_patches: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = AssetStore::new(&AssetsConfig {
        root: dir,
        ..Default::default()
    });
    let report = assets::scan(&store, base_path)?;

    for file in &report.files {
        match &file.skipped {
            Some(reason) => println!("{:<60} skipped ({reason})", file.path),
            None => println!("{:<60} {}", file.path, file.substitutions),
        }
    }
    println!("total: {}", report.totals);

    if require_js_patches && !report.js_patched() {
        eprintln!("Error: no script matched the origin or asset base function patterns; bundler output may have changed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn admin_call(
    method: reqwest::Method,
    path: &str,
    admin: &AdminArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", admin.key))?,
    );

    let url = format!("{}{}", admin.url.trim_end_matches('/'), path);
    let res = client.request(method, url).headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(ExitCode::FAILURE);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(ExitCode::SUCCESS)
}
