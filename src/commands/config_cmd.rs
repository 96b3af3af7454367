use clap::{Args, Subcommand};

use dietdiary::config::Config;
use dietdiary::identity::Identity;

use super::OutputFormat;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        println!("note_debounce_ms: {}", config.note_debounce_ms.value);
                        println!("  source: {}", config.note_debounce_ms.source);
                        println!();

                        match Identity::from_config(&config.remote) {
                            Identity::Guest => println!("identity: guest (local storage)"),
                            Identity::Authenticated { server_url, .. } => {
                                println!("identity: authenticated");
                                println!("  server_url: {}", server_url);
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
