use crate::app::errors::ValidationError;
use crate::app::models::Inputs;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::io;
use std::path::Path;

/// Drops all whitespace so line-wrapped pastes decode.
pub fn normalize_base64(value: &str) -> String {
    value.split_whitespace().collect()
}

pub fn encode_file_base64(path: &Path) -> io::Result<String> {
    let content = fs::read(path)?;
    Ok(STANDARD.encode(content))
}

/// Checks the collected inputs, stopping at the first problem.
pub fn validate_inputs(inputs: &Inputs) -> Result<(), ValidationError> {
    let required = [
        (&inputs.workspace, "Xcode workspace path"),
        (&inputs.scheme, "Xcode scheme"),
        (&inputs.bundle_id, "Bundle ID"),
        (&inputs.team_id, "Apple Team ID"),
        (&inputs.app_id, "App Store Connect app ID"),
        (&inputs.asc_key_id, "ASC Key ID"),
        (&inputs.asc_issuer_id, "ASC Issuer ID"),
        (&inputs.asc_private_key_b64, "ASC private key base64"),
    ];
    for (value, label) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::Required(label));
        }
    }

    if fs::metadata(&inputs.workspace).is_err() {
        return Err(ValidationError::WorkspaceMissing(inputs.workspace.clone()));
    }

    STANDARD
        .decode(normalize_base64(&inputs.asc_private_key_b64))
        .map_err(|_| ValidationError::InvalidBase64)?;

    Ok(())
}
