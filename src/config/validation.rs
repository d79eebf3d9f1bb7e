//! Configuration validation.

/// STT needs either a pre-issued token or a client id/secret pair to exchange.
pub(super) fn validate_stt_credentials(
    token: &Option<String>,
    client_id: &Option<String>,
    client_secret: &Option<String>,
) -> Result<(), String> {
    if token.is_some() {
        return Ok(());
    }
    match (client_id, client_secret) {
        (Some(_), Some(_)) => Ok(()),
        (Some(_), None) => Err("RTZR_CLIENT_SECRET is required when RTZR_CLIENT_ID is set".into()),
        (None, Some(_)) => Err("RTZR_CLIENT_ID is required when RTZR_CLIENT_SECRET is set".into()),
        (None, None) => Err(
            "STT credentials missing: set RTZR_TOKEN or RTZR_CLIENT_ID and RTZR_CLIENT_SECRET"
                .into(),
        ),
    }
}

/// Queue capacities must allow at least one item.
pub(super) fn validate_capacity(name: &str, value: usize) -> Result<(), String> {
    if value == 0 {
        return Err(format!("{name} must be greater than 0"));
    }
    Ok(())
}

/// The public URL is used verbatim in TwiML callbacks.
pub(super) fn validate_public_url(public_url: &Option<String>) -> Result<(), String> {
    let Some(url) = public_url else {
        return Ok(());
    };
    let parsed = url::Url::parse(url).map_err(|e| format!("Invalid PUBLIC_URL '{url}': {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!(
            "PUBLIC_URL must use http or https, got '{scheme}'"
        )),
    }
}
