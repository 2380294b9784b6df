use anyhow::Result;
use po_core::domain::settings::{ProviderKind, ProviderSettings};
use po_core::infra::rewriter::ProviderConfig;
use po_core::infra::storage::SettingsStore;

use super::open_store;
use crate::Cli;

#[derive(clap::Args)]
pub struct ProvidersArgs {
    #[arg(long)]
    pub json: bool,
}

pub fn run(cli: &Cli, args: &ProvidersArgs) -> Result<()> {
    let settings = open_store(cli)?.load()?;
    let config = ProviderConfig::default();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows_json(&settings, &config))?);
    } else {
        print!("{}", render(&settings, &config));
    }
    Ok(())
}

fn rows_json(settings: &ProviderSettings, config: &ProviderConfig) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = ProviderKind::ALL
        .iter()
        .map(|kind| {
            let endpoint = config.endpoint(*kind);
            serde_json::json!({
                "id": kind.as_str(),
                "name": kind.display_name(),
                "model": endpoint.model,
                "baseUrl": endpoint.base_url,
                "selected": settings.selection() == kind.as_str(),
                "hasKey": settings.usable_credential(*kind).is_some(),
            })
        })
        .collect();
    serde_json::Value::Array(rows)
}

pub fn render(settings: &ProviderSettings, config: &ProviderConfig) -> String {
    let mut out = String::new();
    for kind in ProviderKind::ALL {
        let marker = if settings.selection() == kind.as_str() { "*" } else { " " };
        let key = if settings.usable_credential(kind).is_some() {
            "key set"
        } else {
            "no key"
        };
        out.push_str(&format!(
            "{marker} {:<7} {:<22} {key}\n",
            kind.as_str(),
            config.endpoint(kind).model
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_selection() {
        let settings = ProviderSettings {
            selected_provider: Some("gemini".to_string()),
            gemini_api_key: Some("AIza-key".to_string()),
            ..Default::default()
        };
        let text = render(&settings, &ProviderConfig::default());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("* gemini"));
        assert!(lines[0].ends_with("key set"));
        assert!(lines[2].starts_with("  groq"));
        assert!(lines[2].contains("llama-3.1-8b-instant"));
    }

    #[test]
    fn test_json_rows() {
        let json = rows_json(&ProviderSettings::default(), &ProviderConfig::default());
        assert_eq!(json[2]["id"], "groq");
        assert_eq!(json[2]["selected"], true);
        assert_eq!(json[1]["model"], "gpt-4o-mini");
        assert_eq!(json[0]["hasKey"], false);
    }
}
