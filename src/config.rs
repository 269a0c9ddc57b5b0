//! Runtime configuration
//!
//! Parsed from the command line, with environment fallbacks.

use std::net::SocketAddr;

use clap::Parser;

/// Default listen address
pub const DEFAULT_ADDR: &str = "0.0.0.0:9001";

#[derive(Parser, Debug, Clone)]
#[command(name = "line_relay")]
#[command(about = "Newline-delimited TCP chat relay", long_about = None)]
pub struct Config {
    /// Socket address to listen on. Use port 0 for an ephemeral port.
    #[arg(short, long, env = "LINE_RELAY_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_default_addr() {
        // Read the declared default rather than parsing, so LINE_RELAY_ADDR in the environment cannot interfere
        let command = Config::command();
        let addr = command
            .get_arguments()
            .find(|arg| arg.get_id() == "addr")
            .unwrap();
        let defaults: Vec<_> = addr
            .get_default_values()
            .iter()
            .map(|value| value.to_str())
            .collect();

        assert_eq!(defaults, vec![Some(DEFAULT_ADDR)]);
        assert_eq!(DEFAULT_ADDR.parse::<SocketAddr>().unwrap().port(), 9001);
    }

    #[test]
    fn test_addr_flag() {
        let config = Config::try_parse_from(["line_relay", "--addr", "127.0.0.1:0"]).unwrap();
        assert_eq!(config.addr, "127.0.0.1:0".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_invalid_addr_rejected() {
        assert!(Config::try_parse_from(["line_relay", "--addr", "not-an-addr"]).is_err());
    }
}
