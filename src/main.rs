use anyhow::Result;
use chrono::Local;
use clap::Parser;
use dotenvy::dotenv;
use log::info;
use std::{path::PathBuf, time::Duration};

mod helpers;

use helpers::{
    api_client,
    config::{
        Credentials, DEFAULT_API_VERSION, DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE, DEFAULT_TIMEOUT_SECS,
        Settings,
    },
    diagnostics,
    report_writer::{print_banner, print_generated_files},
};

#[derive(Parser, Debug)]
#[command(
    name = "store-probe",
    version,
    about = "Times the subscriptions and orders endpoints of a WooCommerce store for one customer",
    long_about = "Looks up a customer by email, fetches their subscriptions, orders and the orders of each \
                  subscription, then writes every response and a timing summary as JSON files"
)]
struct Args {
    /// Store URL, e.g. https://shop.example
    #[arg(long, env = "STORE_URL")]
    store_url: String,

    /// REST API consumer key
    #[arg(long, env = "CONSUMER_KEY", default_value = "", hide_default_value = true)]
    consumer_key: String,

    /// REST API consumer secret
    #[arg(long, env = "CONSUMER_SECRET", default_value = "", hide_default_value = true, hide_env_values = true)]
    consumer_secret: String,

    /// Customer email to look up
    #[arg(long, env = "USER_EMAIL")]
    email: String,

    /// REST API version
    #[arg(long, env = "API_VERSION", default_value = DEFAULT_API_VERSION)]
    api_version: String,

    /// Items requested per page
    #[arg(long, env = "PER_PAGE", default_value_t = DEFAULT_PER_PAGE)]
    per_page: u32,

    /// Pages fetched per endpoint before giving up
    #[arg(long, env = "MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: u32,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Directory the JSON files are written to
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,
}

impl Args {
    fn into_settings(self) -> Result<Settings> {
        let credentials = Credentials::new(self.consumer_key, self.consumer_secret)?;
        let settings = Settings::new(&self.store_url, &self.api_version, credentials, &self.email)?
            .with_paging(self.per_page, self.max_pages)?
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_output_dir(self.output_dir);
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let settings = args.into_settings()?;
    info!("Store probe started for {}", settings.api_base);

    print_banner(&settings, &Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
    if settings.credentials.looks_like_placeholder() {
        println!("⚠️  WARNING: Consumer key looks like a placeholder. Please set your actual key.");
        println!();
    }

    let client = api_client::create_client(settings.timeout)?;
    diagnostics::run(&client, &settings).await;

    print_generated_files();
    Ok(())
}
