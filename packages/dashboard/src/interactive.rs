//! Interactive mode for the dashboard API.

use dialoguer::{Confirm, Input};

/// Prompts for the bind address, port, and workbook location, then starts
/// the dashboard via [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the workbook cannot be loaded or
/// the server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Getaround Delay Analysis Dashboard");
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

    let default_location = super::data_location_from_env().to_string();
    let location: String = Input::new()
        .with_prompt("Workbook URL or path")
        .default(default_location.clone())
        .interact_text()
        .unwrap_or(default_location);

    // SAFETY: nothing else reads or writes the environment while the prompts
    // run; the server reads these once while starting up.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
        std::env::set_var("DELAY_DATA_URL", &location);
    }

    if !Confirm::new()
        .with_prompt(format!("Start dashboard API on {bind_addr}:{port_str}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
