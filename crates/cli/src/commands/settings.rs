use anyhow::Result;
use clap::Subcommand;
use po_core::domain::settings::{ProviderKind, ProviderSettings};
use po_core::infra::storage::SettingsStore;

use super::{mask_key, open_store};
use crate::Cli;

#[derive(clap::Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// 現在の設定を表示する（キーは伏せ字）
    Show {
        #[arg(long)]
        json: bool,
    },
    /// 使うプロバイダーを選ぶ
    SetProvider { provider: ProviderKind },
    /// API キーを保存する。空文字なら削除する
    SetKey { provider: ProviderKind, key: String },
}

pub fn run(cli: &Cli, args: &SettingsArgs) -> Result<()> {
    let store = open_store(cli)?;
    match &args.command {
        SettingsCommand::Show { json } => {
            let settings = store.load()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&masked(&settings))?);
            } else {
                print!("{}", render(&settings));
            }
        }
        SettingsCommand::SetProvider { provider } => {
            set_provider(&store, *provider)?;
            println!("provider: {}", provider.display_name());
        }
        SettingsCommand::SetKey { provider, key } => {
            if set_key(&store, *provider, key)? {
                println!("{} API key saved", provider.display_name());
            } else {
                println!("{} API key removed", provider.display_name());
            }
        }
    }
    Ok(())
}

pub fn set_provider(store: &dyn SettingsStore, provider: ProviderKind) -> Result<()> {
    let mut settings = store.load()?;
    settings.selected_provider = Some(provider.as_str().to_string());
    store.save(&settings)?;
    log::info!("プロバイダーを {provider} に変更");
    Ok(())
}

/// 保存したら true、空白のみで削除したら false
pub fn set_key(store: &dyn SettingsStore, provider: ProviderKind, key: &str) -> Result<bool> {
    let mut settings = store.load()?;
    settings.set_credential(provider, Some(key.to_string()));
    store.save(&settings)?;
    Ok(!key.trim().is_empty())
}

fn masked(settings: &ProviderSettings) -> ProviderSettings {
    let mut out = settings.clone();
    for kind in ProviderKind::ALL {
        out.set_credential(kind, settings.credential(kind).map(mask_key));
    }
    out
}

pub fn render(settings: &ProviderSettings) -> String {
    let selection = settings.selection();
    let mut out = match selection.parse::<ProviderKind>() {
        Ok(kind) => format!("provider: {} ({})\n", kind.as_str(), kind.display_name()),
        Err(_) => format!("provider: {selection} (unknown, requests will fail)\n"),
    };
    for kind in ProviderKind::ALL {
        let state = match settings.usable_credential(kind) {
            Some(key) => mask_key(key),
            None => "not set".to_string(),
        };
        out.push_str(&format!("  {:<8} {state}\n", kind.display_name()));
    }
    out
}
