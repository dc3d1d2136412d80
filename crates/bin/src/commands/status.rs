//! Status command - prints the users and devices of a running server.

use devqueue::{UserId, protocol::StateView};

use crate::cli::StatusArgs;
use crate::output::{OutputFormat, print_table};

/// Run the status command
pub async fn run(
    args: &StatusArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = args.server.url("/api/state");
    let client = reqwest::Client::builder()
        .timeout(args.server.timeout())
        .build()?;

    let response = client.get(&url).send().await?.error_for_status()?;
    let body = response.text().await?;

    match format {
        OutputFormat::Json => println!("{body}"),
        OutputFormat::Human => print_state(&StateView::decode(&body)?),
    }
    Ok(())
}

fn print_state(state: &StateView) {
    let name_of = |id: &UserId| {
        state
            .users
            .get(id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    if state.devices.is_empty() {
        println!("No devices.");
    } else {
        let rows: Vec<Vec<String>> = state
            .devices
            .values()
            .map(|device| {
                let holder = device.holder.as_ref().map(name_of).unwrap_or_default();
                let queue: Vec<String> = device.queue.iter().map(name_of).collect();
                vec![
                    device.name.clone(),
                    holder,
                    queue.join(", "),
                    device.details.clone(),
                ]
            })
            .collect();
        print_table(&["DEVICE", "IN USE BY", "QUEUE", "DETAILS"], &rows);
    }

    println!();

    if state.users.is_empty() {
        println!("No users.");
    } else {
        let rows: Vec<Vec<String>> = state
            .users
            .values()
            .map(|user| vec![user.name.clone(), user.id.to_string()])
            .collect();
        print_table(&["USER", "ID"], &rows);
    }
}
