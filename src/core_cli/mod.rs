use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "ferrousftpd", about = "A small FTP daemon written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_empty_config_and_quiet() {
        let cli = Cli::parse_from(["ferrousftpd"]);
        assert!(cli.config.is_empty());
        assert!(!cli.verbose);
    }

    #[test]
    fn accepts_config_path_and_verbose_flag() {
        let cli = Cli::parse_from(["ferrousftpd", "-c", "/tmp/test.conf", "--verbose"]);
        assert_eq!(cli.config, "/tmp/test.conf");
        assert!(cli.verbose);
    }
}
