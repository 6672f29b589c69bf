//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use cache_key_variations::VariationConfig;
use dialoguer::Confirm;

use super::{ConfigArgs, ConfigCommand};
use crate::config::CONFIG_NAMES;
use crate::context::Context;

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = ctx.variation_config()?;

    if ctx.output.is_json() {
        ctx.output.json(&config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(built-in defaults)"),
    }

    ctx.output.info("");
    ctx.output.info("[guess]");
    ctx.output.kv("answer", &config.guess.answer.to_string());
    ctx.output.kv("submission_path", &config.guess.submission_path);
    ctx.output.kv("canonical_path", &config.guess.canonical_path);
    ctx.output.kv("param", &config.guess.param);

    ctx.output.info("");
    ctx.output.info("[cookie]");
    ctx.output.kv("name", &config.cookie.name);
    ctx.output.kv("value", &config.cookie.value);

    ctx.output.info("");
    ctx.output.info("[geo]");
    ctx.output.kv("header", &config.geo.header);
    ctx.output.kv("fallback", &config.geo.fallback);

    ctx.output.info("");
    ctx.output.info("[cache]");
    ctx.output.kv(
        "shared_max_age_secs",
        &config.cache.shared_max_age_secs.to_string(),
    );
    ctx.output.kv(
        "client_max_age_secs",
        &config.cache.client_max_age_secs.to_string(),
    );

    let policy = config.cache.policy();
    ctx.output.info("");
    ctx.output.info("Headers on the rendered page:");
    if let Some(cdn) = policy.cdn_cache_control_header() {
        ctx.output.list_item(&format!("Cdn-Cache-Control: {}", cdn));
    }
    ctx.output.list_item(&format!("Cache-Control: {}", policy.cache_control_header()));

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        if ctx.output.is_json() {
            bail!(
                "Config file already exists: {}. Use --force to overwrite.",
                config_path.display()
            );
        }

        let confirmed = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", config_path.display()))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Left existing config untouched");
            return Ok(());
        }
    }

    fs::write(&config_path, VariationConfig::embedded_source())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let config = ctx.variation_config()?;
    let warnings = warnings(&config);

    if warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Settings that load but probably are not what was meant.
fn warnings(config: &VariationConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.cache.shared_max_age_secs == 0 {
        warnings.push("cache.shared_max_age_secs is 0; the edge will not keep pages".to_string());
    }

    if config.cache.client_max_age_secs > 0 {
        warnings.push(format!(
            "cache.client_max_age_secs is {}; browsers may show a stale page without asking the edge",
            config.cache.client_max_age_secs
        ));
    }

    if config.geo.fallback.trim().is_empty() {
        warnings.push("geo.fallback is empty; unresolved visitors see a blank country".to_string());
    }

    if config.cookie.value.is_empty() {
        warnings.push("cookie.value is empty; repeat visits cannot be told apart".to_string());
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_no_warnings() {
        assert!(warnings(&VariationConfig::default()).is_empty());
    }

    #[test]
    fn test_cache_warnings() {
        let mut config = VariationConfig::default();
        config.cache.shared_max_age_secs = 0;
        config.cache.client_max_age_secs = 60;

        let warnings = warnings(&config);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("cache.shared_max_age_secs"));
        assert!(warnings[1].starts_with("cache.client_max_age_secs is 60"));
    }
}
