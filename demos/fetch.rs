//! Example fetching a URL and printing the parsed response.
//!
//! ```text
//! RUST_LOG=curlish=debug cargo run --example fetch -- https://httpbin.org/get
//! ```

use color_eyre::Result;
use curlish::ClientBuilder;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://httpbin.org/get".to_string());

    let mut client = ClientBuilder::new()
        .header("Accept", "application/json")
        .timeout(Duration::from_secs(5), Some(Duration::from_secs(30)))
        .build()?;

    let response = client.get(&url, [("source", "curlish")])?;

    // Print the status line, the headers and the body
    println!(
        "HTTP/{} {} {}",
        response.http_version(),
        response.status_code(),
        response.status_text()
    );
    for (name, value) in response.headers() {
        println!("{name}: {value}");
    }
    for cookie in response.cookies() {
        println!("cookie {}={}", cookie.name, cookie.value);
    }
    println!("\n{response}");

    if response.redirect_count() > 0 {
        println!("\nFollowed {} redirect(s).", response.redirect_count());
    }

    Ok(())
}
