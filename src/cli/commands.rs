use clap::Parser;

/// Registers running containers in Consul and keeps the registry in sync
#[derive(Parser, Debug)]
#[command(
    name = "registrator",
    about = "Registers running containers in Consul and keeps the registry in sync",
    version,
    long_about = "registrator watches the local Docker daemon and registers every running \
                  container that publishes ports as a Consul service with a TCP health check. \
                  It runs until interrupted.\n\n\
                  Node settings come from the environment:\n  \
                  NODE_IP        advertised address (default 127.0.0.1)\n  \
                  CONSUL_URL     Consul agent URL (default http://discovery-service:8500)\n  \
                  NODE_HOSTNAME  hostname used in service IDs (default: OS hostname)"
)]
pub struct CliArgs {
    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_no_arguments() {
        let args = CliArgs::parse_from(["registrator"]);
        assert!(args.log_level.is_none());
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(!args.json_logs);
    }

    #[test]
    fn test_logging_flags() {
        let args = CliArgs::parse_from(["registrator", "--log-level", "trace", "--json-logs"]);
        assert_eq!(args.log_level.as_deref(), Some("trace"));
        assert!(args.json_logs);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(CliArgs::try_parse_from(["registrator", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_rejects_subcommands() {
        assert!(CliArgs::try_parse_from(["registrator", "detect"]).is_err());
    }
}
