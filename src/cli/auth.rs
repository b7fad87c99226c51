use std::sync::Arc;

use tabled::Table;

use crate::{
    cli::DekClient,
    error::Result,
    info, spotify, success,
    types::{SessionState, StatusTableRow},
    warning,
};

pub async fn login(client: Arc<DekClient>) -> Result<()> {
    if client.is_authenticated().await {
        info!("Already signed in. Starting a new authorization anyway.");
    }

    let token = spotify::auth::login(Arc::clone(&client)).await?;
    success!(
        "Authentication successful! Access token valid for {} minutes.",
        token.expires_in / 60
    );
    Ok(())
}

pub async fn logout(client: &DekClient) -> Result<()> {
    client.logout().await?;
    success!("Signed out. Local tokens removed.");
    Ok(())
}

pub async fn status(client: &DekClient) -> Result<()> {
    let status = client.status().await;

    let expires = match status.expires_at {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "-".to_string(),
    };
    let rows = vec![
        StatusTableRow {
            key: "session".to_string(),
            value: status.state.to_string(),
        },
        StatusTableRow {
            key: "access token valid".to_string(),
            value: status.authenticated.to_string(),
        },
        StatusTableRow {
            key: "expires at".to_string(),
            value: expires,
        },
        StatusTableRow {
            key: "refresh token".to_string(),
            value: status.has_refresh_token.to_string(),
        },
        StatusTableRow {
            key: "token store".to_string(),
            value: client.store().path().display().to_string(),
        },
    ];
    println!("{}", Table::new(rows));

    match status.state {
        SessionState::Unauthenticated => warning!("Not signed in. Run `dekcli login`."),
        SessionState::Authorizing => warning!(
            "An authorization is pending. Finish it in the browser or run `dekcli login` again."
        ),
        SessionState::Authenticated if !status.authenticated => {
            info!("Access token expired; it will be refreshed on the next request.")
        }
        SessionState::Authenticated => {}
    }
    Ok(())
}
