use std::env;

use alphago_core::util::{is_http_url, normalize_text_option};

use crate::cli::ConfigCommands;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// Values given to `config init`; unset fields fall back to the environment,
/// then to what the profile already holds.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdates {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub health_url: Option<String>,
    pub session: Option<String>,
}

impl ProfileUpdates {
    fn with_env_fallbacks(self) -> Self {
        Self {
            api_base_url: normalize_text_option(self.api_base_url)
                .or_else(|| normalize_text_option(env::var("ALPHAGO_API_BASE_URL").ok())),
            api_token: normalize_text_option(self.api_token)
                .or_else(|| normalize_text_option(env::var("ALPHAGO_API_TOKEN").ok())),
            health_url: normalize_text_option(self.health_url)
                .or_else(|| normalize_text_option(env::var("ALPHAGO_HEALTH_URL").ok())),
            session: normalize_text_option(self.session),
        }
    }
}

pub fn run_config(
    command: ConfigCommands,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            api_token,
            health_url,
            session,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            ProfileUpdates {
                api_base_url,
                api_token,
                health_url,
                session,
            },
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    updates: ProfileUpdates,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let profile = config.profile_mut_or_default(&profile_name);
    apply_profile_updates(profile, updates.with_env_fallbacks());
    validate_profile_urls(profile)?;
    let ready = profile.api_base_url().is_some();

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    if ready {
        println!("Profile '{profile_name}' is ready. Run `alphago sync` once online.");
    } else {
        println!("Profile '{profile_name}' is missing: api_base_url (orders will only be queued)");
    }
    Ok(())
}

pub fn run_config_show(profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();

    println!("Profile:      {profile_name}");
    println!(
        "API base URL: {}",
        profile.api_base_url().unwrap_or_else(|| "-".to_string())
    );
    println!(
        "API token:    {}",
        if profile.api_token().is_some() { "set" } else { "-" }
    );
    println!(
        "Health URL:   {}",
        profile.probe_url().unwrap_or_else(|| "-".to_string())
    );
    println!(
        "Session:      {}",
        profile.session().unwrap_or_else(|| "-".to_string())
    );
    Ok(())
}

pub fn apply_profile_updates(profile: &mut CliProfile, updates: ProfileUpdates) {
    if let Some(value) = normalize_text_option(updates.api_base_url) {
        profile.api_base_url = Some(value.trim_end_matches('/').to_string());
    }
    if let Some(value) = normalize_text_option(updates.api_token) {
        profile.api_token = Some(value);
    }
    if let Some(value) = normalize_text_option(updates.health_url) {
        profile.health_url = Some(value);
    }
    if let Some(value) = normalize_text_option(updates.session) {
        profile.session = Some(value);
    }
}

pub fn validate_profile_urls(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.api_base_url() {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "api_base_url must include http:// or https://".to_string(),
            ));
        }
    }
    if let Some(url) = normalize_text_option(profile.health_url.clone()) {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "health_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}
