//! Interactive mode for the pricing API.
//!
//! Prompts for the bind address, port, and artifact directory before
//! starting the server.

use dialoguer::{Confirm, Input};

/// Runs the pricing API in interactive mode, prompting for configuration.
///
/// Sets `BIND_ADDR`, `PORT`, and `ARTIFACT_DIR` from the answers and
/// delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Getaround Pricing API");
    println!();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default("127.0.0.1".to_string())
        .interact_text()
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let default_port = super::DEFAULT_PORT.to_string();
    let port_str: String = Input::new()
        .with_prompt("Port")
        .default(default_port.clone())
        .interact_text()
        .unwrap_or(default_port);

    let artifact_dir: String = Input::new()
        .with_prompt("Artifact directory")
        .default(std::env::var("ARTIFACT_DIR").unwrap_or_else(|_| ".".to_string()))
        .interact_text()
        .unwrap_or_else(|_| ".".to_string());

    // SAFETY: nothing else reads or writes the environment while the prompts
    // run; the server reads these once while starting up.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
        std::env::set_var("ARTIFACT_DIR", &artifact_dir);
    }

    if !Confirm::new()
        .with_prompt(format!("Start pricing API on {bind_addr}:{port_str}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
