use super::models::Config;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid site origin '{origin}': {message}")]
    InvalidOrigin { origin: String, message: String },

    #[error("listing_path must start with '/': '{0}'")]
    InvalidListingPath(String),

    #[error("artist_path_prefix must start with '/': '{0}'")]
    InvalidArtistPrefix(String),

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} '{value}' must be a bare locale tag (no path separators or dots)")]
    InvalidLocale { field: &'static str, value: String },

    #[error("allowed_extensions must not be empty")]
    NoAllowedExtensions,

    #[error("Invalid extension '{0}': expected lowercase alphanumeric, no leading dot")]
    InvalidExtension(String),

    #[error("workers.concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_site(config)?;
    validate_import(config)?;
    validate_workers(config)?;
    Ok(())
}

/// The origin must be an absolute http(s) URL with a host; paths must
/// be root-relative so they resolve under that origin.
fn validate_site(config: &Config) -> Result<(), ValidationError> {
    let origin = &config.site.origin;
    let parsed = Url::parse(origin).map_err(|e| ValidationError::InvalidOrigin {
        origin: origin.clone(),
        message: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidOrigin {
            origin: origin.clone(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.host_str().is_none() {
        return Err(ValidationError::InvalidOrigin {
            origin: origin.clone(),
            message: "missing host".to_string(),
        });
    }

    if !config.site.listing_path.starts_with('/') {
        return Err(ValidationError::InvalidListingPath(
            config.site.listing_path.clone(),
        ));
    }
    if !config.site.artist_path_prefix.starts_with('/') {
        return Err(ValidationError::InvalidArtistPrefix(
            config.site.artist_path_prefix.clone(),
        ));
    }

    Ok(())
}

fn validate_import(config: &Config) -> Result<(), ValidationError> {
    let import = &config.import;

    for (field, value) in [
        ("import.images_dir", &import.images_dir),
        ("import.manifest_path", &import.manifest_path),
        ("import.template_path", &import.template_path),
    ] {
        if value.is_empty() {
            return Err(ValidationError::EmptyField { field });
        }
    }

    for (field, value) in [
        ("import.locale", &import.locale),
        ("import.record_locale", &import.record_locale),
    ] {
        if value.is_empty() {
            return Err(ValidationError::EmptyField { field });
        }
        // Locales end up embedded in filenames
        if value.contains(['/', '\\', '.']) {
            return Err(ValidationError::InvalidLocale {
                field,
                value: value.clone(),
            });
        }
    }

    if import.allowed_extensions.is_empty() {
        return Err(ValidationError::NoAllowedExtensions);
    }
    for extension in &import.allowed_extensions {
        let well_formed = !extension.is_empty()
            && extension
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !well_formed {
            return Err(ValidationError::InvalidExtension(extension.clone()));
        }
    }

    Ok(())
}

fn validate_workers(config: &Config) -> Result<(), ValidationError> {
    if config.workers.concurrency == 0 {
        return Err(ValidationError::ZeroConcurrency);
    }
    Ok(())
}
