use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Relay chat lines between connected clients")]
pub struct ServerArgs {
    /// TCP port to listen on. Use 0 for an ephemeral port.
    pub port: u16,

    /// Local address to bind.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
}

impl ServerArgs {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Join a relay chat server from the terminal")]
pub struct ClientArgs {
    /// IP address of the chat server.
    pub server_ip: IpAddr,

    /// Port the chat server listens on.
    pub port: u16,
}

impl ClientArgs {
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn server_takes_a_port() {
        let args = ServerArgs::try_parse_from(["server", "8080"]).expect("parse");
        assert_eq!(args.listen_addr(), "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn server_rejects_bad_or_missing_port() {
        let missing = ServerArgs::try_parse_from(["server"]).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::MissingRequiredArgument);

        let malformed = ServerArgs::try_parse_from(["server", "eighty"]).unwrap_err();
        assert_eq!(malformed.kind(), ErrorKind::ValueValidation);

        let out_of_range = ServerArgs::try_parse_from(["server", "70000"]).unwrap_err();
        assert_eq!(out_of_range.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn client_takes_address_and_port() {
        let args = ClientArgs::try_parse_from(["client", "127.0.0.1", "9000"]).expect("parse");
        assert_eq!(args.server_addr(), "127.0.0.1:9000".parse::<SocketAddr>().unwrap());

        let missing_port = ClientArgs::try_parse_from(["client", "127.0.0.1"]).unwrap_err();
        assert_eq!(missing_port.kind(), ErrorKind::MissingRequiredArgument);

        let bad_ip = ClientArgs::try_parse_from(["client", "not-an-ip", "9000"]).unwrap_err();
        assert_eq!(bad_ip.kind(), ErrorKind::ValueValidation);
    }
}
