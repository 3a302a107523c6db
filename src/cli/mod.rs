use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "restaurant-api")]
#[command(about = "Restaurant ordering API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Run migrations, seed the administrator and serve HTTP (default)")]
    Serve {
        #[arg(long, help = "Address to bind, overrides SERVER_ADDRESS")]
        bind: Option<String>,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

impl Cli {
    /// The subcommand to run; no subcommand means `serve`.
    pub fn command(self) -> Commands {
        self.command.unwrap_or(Commands::Serve { bind: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::parse_from(["restaurant-api"]);
        assert_eq!(cli.command(), Commands::Serve { bind: None });
    }

    #[test]
    fn parses_bind_and_migrate() {
        let cli = Cli::parse_from(["restaurant-api", "serve", "--bind", "127.0.0.1:9000"]);
        assert_eq!(
            cli.command(),
            Commands::Serve { bind: Some("127.0.0.1:9000".to_string()) }
        );
        let cli = Cli::parse_from(["restaurant-api", "migrate"]);
        assert_eq!(cli.command(), Commands::Migrate);
    }
}
